//! Inspect what the acquisition layer produces.
//! Usage:
//!   cargo run --bin catalog_props -- home
//!   cargo run --bin catalog_props -- fetch <trending|popular|top-rated|upcoming|tv-popular>
//!   cargo run --bin catalog_props -- trailer <movie|tv> <id>
//!   cargo run --bin catalog_props -- search      (one keystroke state per stdin line)
//! Requires CATALOG_API_KEYS in the environment (.env supported).

use anyhow::{Context, Result};
use cinefront::browse::BrowseService;
use cinefront::catalog::{CatalogClient, Endpoint};
use cinefront::config::CatalogConfig;
use cinefront::debounce::SearchSession;
use cinefront::models::{MediaKind, Provenance, RecordId};
use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn parse_category(name: &str) -> Result<Endpoint> {
    match name.to_lowercase().as_str() {
        "trending" => Ok(Endpoint::Trending),
        "popular" => Ok(Endpoint::Popular),
        "top-rated" | "top_rated" => Ok(Endpoint::TopRated),
        "upcoming" => Ok(Endpoint::Upcoming),
        "tv-popular" | "tv_popular" | "tv" => Ok(Endpoint::TvPopular),
        other => Err(anyhow::anyhow!("unknown category '{}'", other)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn run_search(browse: BrowseService, config: &CatalogConfig) -> Result<()> {
    let mut session = SearchSession::new(browse, config.debounce);
    let mut rx = session.subscribe();
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let latest = rx.borrow_and_update().clone();
            let titles: Vec<&str> = latest.results.iter().map(|r| r.title.as_str()).collect();
            println!("{:?} -> {:?}", latest.query, titles);
        }
    });

    let mut last = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        session.input(&line);
        last = Some(line);
    }
    if let Some(last) = last {
        session
            .subscribe()
            .wait_for(|results| results.query == last)
            .await
            .context("Search session closed before the last query settled")?;
    }
    drop(session);
    printer.await.context("Search printer task failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = CatalogConfig::from_env()?;
    let catalog = Arc::new(CatalogClient::from_config(&config)?);
    let browse = BrowseService::new(catalog.clone());

    match args.first().map(String::as_str) {
        Some("home") => print_json(&browse.load_home().await),
        Some("fetch") => {
            let name = args.get(1).context("fetch needs a category")?;
            let endpoint = parse_category(name)?;
            match catalog.fetch(&endpoint, &[]).await {
                Some(records) => print_json(&records),
                None => {
                    eprintln!("No data for {}", endpoint.path());
                    Ok(())
                }
            }
        }
        Some("trailer") => {
            let kind: MediaKind = args.get(1).context("trailer needs a kind")?.parse()?;
            let id: RecordId = match args.get(2).context("trailer needs an id")?.parse() {
                Ok(id) => id,
                Err(never) => match never {},
            };
            print_json(&browse
                .lookup_trailer_for(kind, &id, "", Provenance::Catalog)
                .await)
        }
        Some("search") => run_search(browse, &config).await,
        _ => Err(anyhow::anyhow!(
            "usage: catalog_props <home|fetch <category>|trailer <kind> <id>|search>"
        )),
    }
}
