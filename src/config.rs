use crate::omdb::OMDB_BASE;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let omdb_api_key = get("OMDB_API_KEY")
            .context("Missing required environment variable: OMDB_API_KEY")?;
        let omdb_base_url = get("OMDB_BASE_URL").unwrap_or_else(|| OMDB_BASE.to_string());
        let bind = get("POPCORN_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("POPCORN_BIND is not a socket address: {bind}"))?;
        Ok(Self {
            omdb_api_key,
            omdb_base_url,
            bind_addr,
        })
    }
}
