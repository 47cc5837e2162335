use super::{Completion, CompletionSender, FetchSlot};
use crate::error::FetchError;
use crate::models::{MovieSummary, SessionStatus};
use crate::omdb::MovieApi;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SEARCH_CONNECTIVITY_MESSAGE: &str =
    "Could not fetch movies. Check your internet connection and try again.";

/// Free-text query plus the one search request it may have in flight.
pub struct SearchSession {
    api: Arc<dyn MovieApi>,
    tx: CompletionSender,
    slot: FetchSlot,
    query: String,
    results: Vec<MovieSummary>,
    status: SessionStatus,
    error: Option<String>,
}

impl SearchSession {
    pub fn new(api: Arc<dyn MovieApi>, tx: CompletionSender) -> Self {
        Self {
            api,
            tx,
            slot: FetchSlot::default(),
            query: String::new(),
            results: Vec::new(),
            status: SessionStatus::Idle,
            error: None,
        }
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.results.clear();
        self.error = None;

        if self.query.is_empty() {
            self.slot.cancel();
            self.status = SessionStatus::Idle;
            debug!("Query cleared, search idle");
            return;
        }

        self.status = SessionStatus::Loading;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let query = self.query.clone();
        debug!(query = %query, "Starting search");
        self.slot.start(move |generation| async move {
            let outcome = api.search(&query).await;
            let _ = tx.send(Completion::Search {
                generation,
                outcome,
            });
        });
    }

    /// Applies a finished search. Returns false when the completion was stale or cancelled.
    pub(crate) fn apply(
        &mut self,
        generation: u64,
        outcome: Result<Vec<MovieSummary>, FetchError>,
    ) -> bool {
        if !self.slot.finish(generation) {
            debug!(generation, "Dropping stale search completion");
            return false;
        }
        match outcome {
            Ok(items) => {
                debug!(query = %self.query, count = items.len(), "Search finished");
                self.results = items;
                self.status = SessionStatus::Ready;
                self.error = None;
            }
            Err(FetchError::NotFound(message)) => {
                debug!(query = %self.query, "No match: {}", message);
                self.results.clear();
                self.status = SessionStatus::Failed;
                self.error = Some(message);
            }
            Err(FetchError::Transport(e)) => {
                warn!("Search for '{}' failed: {}", self.query, e);
                self.results.clear();
                self.status = SessionStatus::Failed;
                self.error = Some(SEARCH_CONNECTIVITY_MESSAGE.to_string());
            }
            Err(FetchError::Cancelled) => {
                debug!(query = %self.query, "Search cancelled");
                return false;
            }
        }
        true
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_results(&self) -> &[MovieSummary] {
        &self.results
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_live_request(&self) -> bool {
        self.slot.is_live()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.results.iter().any(|m| m.id == id)
    }
}
