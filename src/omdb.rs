use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{MovieDetail, MovieSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const OMDB_BASE: &str = "https://www.omdbapi.com";

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError>;
    async fn get_detail(&self, id: &str) -> Result<MovieDetail, FetchError>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let user_agent = format!("popcorn/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build OMDb HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.omdb_base_url, &config.omdb_api_key)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, FetchError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("request failed: {e}")))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("reading body failed: {e}")))?;
        if !status.is_success() {
            return Err(FetchError::Transport(format!("status {status}: {text}")));
        }
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Transport(format!("JSON parse failed: {e}")))
    }
}

#[async_trait]
impl MovieApi for OmdbClient {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        let url = format!(
            "{}/?s={}&apikey={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        );
        let data: SearchResponse = self.get_json(&url).await?;
        data.into_summaries()
    }

    async fn get_detail(&self, id: &str) -> Result<MovieDetail, FetchError> {
        let url = format!(
            "{}/?i={}&apikey={}",
            self.base_url,
            urlencoding::encode(id),
            urlencoding::encode(&self.api_key)
        );
        let data: DetailResponse = self.get_json(&url).await?;
        data.into_detail()
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
}

impl SearchResponse {
    fn into_summaries(self) -> Result<Vec<MovieSummary>, FetchError> {
        if !is_true(&self.response) {
            return Err(not_found(self.error));
        }
        Ok(self
            .search
            .into_iter()
            .map(|h| MovieSummary {
                id: h.imdb_id,
                title: h.title,
                year: h.year,
                poster_url: h.poster,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Poster", default)]
    poster: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Runtime", default)]
    runtime: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Released", default)]
    released: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Genre", default)]
    genre: String,
    #[serde(rename = "Director", default)]
    director: String,
}

impl DetailResponse {
    fn into_detail(self) -> Result<MovieDetail, FetchError> {
        if !is_true(&self.response) {
            return Err(not_found(self.error));
        }
        Ok(MovieDetail {
            runtime_minutes: parse_runtime(&self.runtime),
            critic_rating: parse_rating(&self.imdb_rating),
            id: self.imdb_id,
            title: self.title,
            poster_url: self.poster,
            year: self.year,
            plot: self.plot,
            release_date: self.released,
            actors: self.actors,
            genre: self.genre,
            director: self.director,
        })
    }
}

fn is_true(flag: &str) -> bool {
    flag.eq_ignore_ascii_case("true")
}

fn not_found(error: Option<String>) -> FetchError {
    // OMDb always sends an Error text alongside Response=False; an empty one is still passed through.
    FetchError::NotFound(error.unwrap_or_default())
}

/// "148 min" -> 148. Anything without a leading number ("N/A") is 0.
pub fn parse_runtime(input: &str) -> u32 {
    input
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

pub fn parse_rating(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
}
