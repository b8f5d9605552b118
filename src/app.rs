use crate::browse::BrowseService;
use crate::catalog::CatalogClient;
use crate::config::CatalogConfig;
use crate::models::{
    CatalogRecord, HomeScreen, MediaKind, Provenance, RecordId, SearchResults, Trailer,
};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub browse: BrowseService,
}

pub async fn run_server(config: CatalogConfig) -> Result<()> {
    let catalog = Arc::new(CatalogClient::from_config(&config)?);
    info!(
        "Catalog client ready ({} API key(s), base {})",
        catalog.credentials().key_count(),
        config.base_url
    );
    let state = AppState {
        browse: BrowseService::new(catalog),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/search", get(search))
        .route("/api/trailer/:kind/:id", get(trailer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn home(State(state): State<AppState>) -> Json<HomeScreen> {
    let home = state.browse.load_home().await;
    info!(
        "Home screen served (featured: {})",
        home.featured
            .as_ref()
            .map(|r| r.title.as_str())
            .unwrap_or("none")
    );
    Json(home)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResults> {
    let results: Vec<CatalogRecord> = state.browse.search(&params.q).await;
    Json(SearchResults {
        query: params.q,
        results,
    })
}

#[derive(Debug, Deserialize)]
struct TrailerQuery {
    #[serde(default)]
    title: String,
    /// Records served from the placeholder rows come back with `provenance=placeholder`.
    #[serde(default)]
    provenance: Option<Provenance>,
}

async fn trailer(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(params): Query<TrailerQuery>,
) -> Result<Json<Trailer>, StatusCode> {
    let kind: MediaKind = kind.parse().map_err(|e| {
        warn!("Rejecting trailer request: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let id: RecordId = match id.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    };
    Ok(Json(
        state
            .browse
            .lookup_trailer_for(
                kind,
                &id,
                &params.title,
                params.provenance.unwrap_or(Provenance::Catalog),
            )
            .await,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
