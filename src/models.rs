use serde::{Deserialize, Serialize};

/// One row of a search result list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetail {
    pub id: String,
    pub title: String,
    pub poster_url: String,
    pub year: String,
    pub runtime_minutes: u32,
    pub critic_rating: f64,
    pub plot: String,
    pub release_date: String,
    pub actors: String,
    pub genre: String,
    pub director: String,
}

/// A movie the user has watched and rated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchedEntry {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
    pub critic_rating: f64,
    pub runtime_minutes: u32,
    pub user_rating: u8,
}

impl WatchedEntry {
    pub fn from_detail(detail: &MovieDetail, user_rating: u8) -> Self {
        Self {
            id: detail.id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster_url: detail.poster_url.clone(),
            critic_rating: detail.critic_rating,
            runtime_minutes: detail.runtime_minutes,
            user_rating,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}
