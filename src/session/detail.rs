use super::{Completion, CompletionSender, FetchSlot};
use crate::error::{CommitError, FetchError, RatingError};
use crate::models::{MovieDetail, SessionStatus, WatchedEntry};
use crate::omdb::MovieApi;
use crate::watchlist::WatchlistStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const DETAIL_CONNECTIVITY_MESSAGE: &str =
    "Could not fetch movie details. Check your internet connection and try again.";
pub const DETAIL_MISMATCH_MESSAGE: &str = "The service returned details for a different movie.";

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 10;

/// Full record of the selected movie, plus the rating the user is about to give it.
pub struct DetailSession {
    api: Arc<dyn MovieApi>,
    tx: CompletionSender,
    slot: FetchSlot,
    target: Option<String>,
    detail: Option<MovieDetail>,
    status: SessionStatus,
    error: Option<String>,
    pending_rating: Option<u8>,
}

impl DetailSession {
    pub fn new(api: Arc<dyn MovieApi>, tx: CompletionSender) -> Self {
        Self {
            api,
            tx,
            slot: FetchSlot::default(),
            target: None,
            detail: None,
            status: SessionStatus::Idle,
            error: None,
            pending_rating: None,
        }
    }

    /// Starts fetching `id`, superseding whatever was loading or loaded before.
    pub fn load(&mut self, id: &str) {
        self.target = Some(id.to_string());
        self.detail = None;
        self.error = None;
        self.pending_rating = None;
        self.status = SessionStatus::Loading;

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let id = id.to_string();
        debug!(id = %id, "Fetching movie detail");
        self.slot.start(move |generation| async move {
            let outcome = api.get_detail(&id).await;
            let _ = tx.send(Completion::Detail {
                generation,
                id,
                outcome,
            });
        });
    }

    pub fn clear(&mut self) {
        self.slot.cancel();
        self.target = None;
        self.detail = None;
        self.error = None;
        self.pending_rating = None;
        self.status = SessionStatus::Idle;
    }

    pub(crate) fn apply(
        &mut self,
        generation: u64,
        id: &str,
        outcome: Result<MovieDetail, FetchError>,
    ) -> bool {
        if self.target.as_deref() != Some(id) || !self.slot.finish(generation) {
            debug!(id = %id, generation, "Dropping stale detail completion");
            return false;
        }
        match outcome {
            Ok(detail) if detail.id != id => {
                warn!("Detail for '{}' came back as '{}'", id, detail.id);
                self.status = SessionStatus::Failed;
                self.error = Some(DETAIL_MISMATCH_MESSAGE.to_string());
            }
            Ok(detail) => {
                debug!(id = %id, title = %detail.title, "Detail loaded");
                self.detail = Some(detail);
                self.status = SessionStatus::Ready;
                self.error = None;
            }
            Err(FetchError::NotFound(message)) => {
                debug!(id = %id, "Detail not found: {}", message);
                self.status = SessionStatus::Failed;
                self.error = Some(message);
            }
            Err(FetchError::Transport(e)) => {
                warn!("Detail fetch for '{}' failed: {}", id, e);
                self.status = SessionStatus::Failed;
                self.error = Some(DETAIL_CONNECTIVITY_MESSAGE.to_string());
            }
            Err(FetchError::Cancelled) => {
                debug!(id = %id, "Detail fetch cancelled");
                return false;
            }
        }
        true
    }

    /// Records a pending rating. Movies already in `watchlist` cannot be rated again.
    pub fn rate(&mut self, value: u8, watchlist: &WatchlistStore) -> Result<(), RatingError> {
        let detail = self.detail.as_ref().ok_or(RatingError::NotLoaded)?;
        if watchlist.contains(&detail.id) {
            return Err(RatingError::AlreadyWatched(detail.id.clone()));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange(value));
        }
        self.pending_rating = Some(value);
        Ok(())
    }

    /// Moves the loaded movie into `watchlist` with the pending rating.
    ///
    /// Nothing changes on error; in particular a movie is never added twice.
    pub fn commit(&mut self, watchlist: &mut WatchlistStore) -> Result<WatchedEntry, CommitError> {
        let detail = self.detail.as_ref().ok_or(CommitError::NotLoaded)?;
        let rating = self
            .pending_rating
            .filter(|r| *r > 0)
            .ok_or(CommitError::NoRating)?;
        if watchlist.contains(&detail.id) {
            return Err(CommitError::AlreadyWatched(detail.id.clone()));
        }

        let entry = WatchedEntry::from_detail(detail, rating);
        if let Err(e) = watchlist.add(entry.clone()) {
            error!("Watchlist invariant violated on commit: {}", e);
            return Err(CommitError::AlreadyWatched(entry.id));
        }
        self.pending_rating = None;
        Ok(entry)
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn detail(&self) -> Option<&MovieDetail> {
        self.detail.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_rating(&self) -> Option<u8> {
        self.pending_rating
    }
}
