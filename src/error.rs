//! Domain errors for the fetch sessions and the watchlist.

use thiserror::Error;

/// Outcome of a failed call to the movie service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Network unreachable, non-success status or an unreadable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered but reported no match; carries its own text.
    #[error("{0}")]
    NotFound(String),

    /// The request was abandoned before completing. Never surfaced to users.
    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchlistError {
    #[error("movie {0} is already in the watchlist")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("no movie detail is loaded")]
    NotLoaded,

    #[error("no rating has been given")]
    NoRating,

    #[error("movie {0} is already in the watchlist")]
    AlreadyWatched(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("no movie detail is loaded")]
    NotLoaded,

    #[error("rating {0} is outside 1..=10")]
    OutOfRange(u8),

    #[error("movie {0} is already in the watchlist")]
    AlreadyWatched(String),
}
