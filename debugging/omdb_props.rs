//! Query OMDb through the library client and print what the sessions would see.
//! Usage:
//!   cargo run --bin omdb_props -- search <query>
//!   cargo run --bin omdb_props -- detail <imdb_id>
//! Requires OMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use popcorn::config::AppConfig;
use popcorn::omdb::{MovieApi, OmdbClient};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let mut args = env::args().skip(1);
    let mode = args
        .next()
        .context("usage: omdb_props <search|detail> <query-or-id>")?;
    let arg = args.collect::<Vec<_>>().join(" ");
    if arg.is_empty() {
        anyhow::bail!("missing query or id");
    }

    let config = AppConfig::from_env()?;
    let client = OmdbClient::from_config(&config)?;

    match mode.as_str() {
        "search" => match client.search(&arg).await {
            Ok(items) => {
                for item in items {
                    println!("{}", serde_json::to_string(&item)?);
                }
            }
            Err(e) => println!("error: {}", e),
        },
        "detail" => match client.get_detail(&arg).await {
            Ok(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
            Err(e) => println!("error: {}", e),
        },
        other => anyhow::bail!("unknown mode '{}', expected 'search' or 'detail'", other),
    }
    Ok(())
}
