//! Ties the sessions together into the browse / detail interaction loop.
//!
//! Input changes drive explicit transitions:
//! - a new query always returns to [`View::Browsing`] and cancels the detail fetch;
//! - selecting an id other than the open one moves to [`View::ViewingDetail`];
//! - selecting the open id again, closing, or committing a rating goes back to browsing.
//!
//! Fetch results arrive later as [`Completion`] messages and are fed in with
//! [`AppController::apply`].

use crate::error::{CommitError, RatingError};
use crate::models::{MovieDetail, MovieSummary, SessionStatus, WatchedEntry};
use crate::omdb::MovieApi;
use crate::session::{
    completion_channel, Completion, Completions, DetailSession, SearchSession, SelectionController,
};
use crate::watchlist::{WatchSummary, WatchlistStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Browsing,
    ViewingDetail,
}

pub struct AppController {
    search: SearchSession,
    selection: SelectionController,
    detail: DetailSession,
    watchlist: WatchlistStore,
}

impl AppController {
    /// Builds a controller; completions for its fetches arrive on the returned receiver.
    pub fn new(api: Arc<dyn MovieApi>) -> (Self, Completions) {
        let (tx, rx) = completion_channel();
        let controller = Self {
            search: SearchSession::new(Arc::clone(&api), tx.clone()),
            selection: SelectionController::new(),
            detail: DetailSession::new(api, tx),
            watchlist: WatchlistStore::new(),
        };
        (controller, rx)
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.selection.clear();
        self.sync_detail();
        self.search.set_query(text);
    }

    /// Toggles the selection. Ids that are not in the current results are ignored.
    pub fn select(&mut self, id: &str) -> View {
        if self.selection.current() != Some(id) && !self.search.contains(id) {
            warn!("Ignoring selection of '{}': not in current results", id);
            return self.view();
        }
        self.selection.select(id);
        self.sync_detail();
        self.view()
    }

    pub fn close(&mut self) {
        self.selection.clear();
        self.sync_detail();
    }

    pub fn rate(&mut self, value: u8) -> Result<(), RatingError> {
        self.detail.rate(value, &self.watchlist)
    }

    pub fn commit(&mut self) -> Result<WatchedEntry, CommitError> {
        let entry = self.detail.commit(&mut self.watchlist)?;
        info!(
            "Added '{}' to watchlist with rating {}",
            entry.title, entry.user_rating
        );
        self.close();
        Ok(entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<WatchedEntry> {
        let removed = self.watchlist.remove(id);
        if let Some(entry) = &removed {
            info!("Removed '{}' from watchlist", entry.title);
        }
        removed
    }

    /// Feeds a finished fetch back in. Returns whether any state changed.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Search {
                generation,
                outcome,
            } => self.search.apply(generation, outcome),
            Completion::Detail {
                generation,
                id,
                outcome,
            } => self.detail.apply(generation, &id, outcome),
        }
    }

    pub fn view(&self) -> View {
        if self.selection.current().is_some() {
            View::ViewingDetail
        } else {
            View::Browsing
        }
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn detail(&self) -> &DetailSession {
        &self.detail
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn snapshot(&self) -> Snapshot {
        let watched_rating = self
            .detail
            .target()
            .and_then(|id| self.watchlist.get(id))
            .map(|e| e.user_rating);
        Snapshot {
            query: self.search.query().to_string(),
            view: self.view(),
            search: SearchSnapshot {
                status: self.search.status(),
                results: self.search.current_results().to_vec(),
                result_count: self.search.result_count(),
                error: self.search.error_message().map(str::to_string),
            },
            selected_id: self.selection.current().map(str::to_string),
            detail: DetailSnapshot {
                status: self.detail.status(),
                detail: self.detail.detail().cloned(),
                error: self.detail.error_message().map(str::to_string),
                pending_rating: self.detail.pending_rating(),
                watched_rating,
            },
            watched: self.watchlist.all().to_vec(),
            summary: self.watchlist.summary(),
        }
    }

    // Keeps the detail session bound to the selection.
    fn sync_detail(&mut self) {
        match self.selection.current() {
            Some(id) if self.detail.target() != Some(id) => {
                debug!(id = %id, "Selection changed");
                self.detail.load(id);
            }
            None if self.detail.target().is_some() => {
                debug!("Selection cleared");
                self.detail.clear();
            }
            _ => {}
        }
    }
}

/// Everything the presentation layer reads, in one serializable value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub query: String,
    pub view: View,
    pub search: SearchSnapshot,
    pub selected_id: Option<String>,
    pub detail: DetailSnapshot,
    pub watched: Vec<WatchedEntry>,
    pub summary: WatchSummary,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchSnapshot {
    pub status: SessionStatus,
    pub results: Vec<MovieSummary>,
    pub result_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetailSnapshot {
    pub status: SessionStatus,
    pub detail: Option<MovieDetail>,
    pub error: Option<String>,
    pub pending_rating: Option<u8>,
    /// Rating already stored in the watchlist for the open movie, if any.
    pub watched_rating: Option<u8>,
}
