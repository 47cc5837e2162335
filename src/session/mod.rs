//! Fetch sessions and the selection they react to.
//!
//! Every network call runs on its own task and reports back through a single
//! completion channel. A [`FetchSlot`] keeps one live task per session: starting
//! a new request aborts the previous task and bumps the generation, so a
//! completion that was already queued is recognised as stale and dropped.

use crate::error::FetchError;
use crate::models::{MovieDetail, MovieSummary};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod detail;
mod search;
mod selection;

pub use detail::{DetailSession, DETAIL_CONNECTIVITY_MESSAGE, DETAIL_MISMATCH_MESSAGE};
pub use search::{SearchSession, SEARCH_CONNECTIVITY_MESSAGE};
pub use selection::SelectionController;

/// Result of a finished fetch, tagged with the generation that issued it.
#[derive(Debug)]
pub enum Completion {
    Search {
        generation: u64,
        outcome: Result<Vec<MovieSummary>, FetchError>,
    },
    Detail {
        generation: u64,
        id: String,
        outcome: Result<MovieDetail, FetchError>,
    },
}

pub type CompletionSender = mpsc::UnboundedSender<Completion>;
pub type Completions = mpsc::UnboundedReceiver<Completion>;

pub fn completion_channel() -> (CompletionSender, Completions) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Default)]
pub(crate) struct FetchSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl FetchSlot {
    /// Aborts the live task (if any) and invalidates everything issued so far.
    pub(crate) fn cancel(&mut self) {
        if let Some(h) = self.task.take() {
            h.abort();
        }
        self.generation += 1;
    }

    pub(crate) fn start<F>(&mut self, make: impl FnOnce(u64) -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.task = Some(tokio::spawn(make(generation)));
    }

    /// Accepts a completion only if it belongs to the most recent request.
    pub(crate) fn finish(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.task = None;
        true
    }

    pub(crate) fn is_live(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for FetchSlot {
    fn drop(&mut self) {
        if let Some(h) = self.task.take() {
            h.abort();
        }
    }
}
