use crate::error::WatchlistError;
use crate::models::WatchedEntry;
use serde::{Deserialize, Serialize};

/// Movies the user has watched, in the order they were added.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WatchlistStore {
    entries: Vec<WatchedEntry>,
}

/// Aggregates over the watchlist. Averages are 0.0 when it is empty.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct WatchSummary {
    pub count: usize,
    pub avg_critic_rating: f64,
    pub avg_user_rating: f64,
    pub avg_runtime: f64,
}

impl WatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: WatchedEntry) -> Result<(), WatchlistError> {
        if self.contains(&entry.id) {
            return Err(WatchlistError::Duplicate(entry.id));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<WatchedEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn all(&self) -> &[WatchedEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&WatchedEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn summary(&self) -> WatchSummary {
        WatchSummary {
            count: self.entries.len(),
            avg_critic_rating: self.average(|e| e.critic_rating),
            avg_user_rating: self.average(|e| e.user_rating as f64),
            avg_runtime: self.average(|e| e.runtime_minutes as f64),
        }
    }

    fn average(&self, field: impl Fn(&WatchedEntry) -> f64) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.entries.iter().map(field).sum();
        sum / self.entries.len() as f64
    }
}
