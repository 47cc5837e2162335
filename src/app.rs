use crate::config::AppConfig;
use crate::controller::AppController;
use crate::error::{CommitError, RatingError};
use crate::omdb::{MovieApi, OmdbClient};
use crate::session::Completions;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<AppController>>,
}

impl AppState {
    pub fn new(api: Arc<dyn MovieApi>) -> (Self, Completions) {
        let (controller, completions) = AppController::new(api);
        let state = Self {
            controller: Arc::new(Mutex::new(controller)),
        };
        (state, completions)
    }
}

#[derive(Deserialize)]
struct QueryBody {
    query: String,
}

#[derive(Deserialize)]
struct RatingBody {
    rating: u8,
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    let api: Arc<dyn MovieApi> = Arc::new(OmdbClient::from_config(&config)?);
    info!("Using movie service at {}", config.omdb_base_url);

    let (state, completions) = AppState::new(api);
    tokio::spawn(pump_completions(state.clone(), completions));

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Applies fetch completions to the shared controller as they arrive.
pub async fn pump_completions(state: AppState, mut completions: Completions) {
    while let Some(completion) = completions.recv().await {
        let changed = state.controller.lock().await.apply(completion);
        debug!(changed, "Completion applied");
    }
    debug!("Completion channel closed");
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(snapshot))
        .route("/query", put(set_query))
        .route("/select/:id", post(select))
        .route("/close", post(close))
        .route("/rating", post(rate))
        .route("/watched", post(commit))
        .route("/watched/:id", delete(remove_watched))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn snapshot(State(state): State<AppState>) -> Response {
    let app = state.controller.lock().await;
    Json(app.snapshot()).into_response()
}

async fn set_query(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    let mut app = state.controller.lock().await;
    app.set_query(body.query);
    Json(app.snapshot()).into_response()
}

async fn select(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut app = state.controller.lock().await;
    app.select(&id);
    Json(app.snapshot()).into_response()
}

async fn close(State(state): State<AppState>) -> Response {
    let mut app = state.controller.lock().await;
    app.close();
    Json(app.snapshot()).into_response()
}

async fn rate(State(state): State<AppState>, Json(body): Json<RatingBody>) -> Response {
    let mut app = state.controller.lock().await;
    match app.rate(body.rating) {
        Ok(()) => Json(app.snapshot()).into_response(),
        Err(e @ RatingError::AlreadyWatched(_)) => {
            error_response(StatusCode::CONFLICT, &e.to_string())
        }
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    }
}

async fn commit(State(state): State<AppState>) -> Response {
    let mut app = state.controller.lock().await;
    match app.commit() {
        Ok(_) => (StatusCode::CREATED, Json(app.snapshot())).into_response(),
        Err(e @ CommitError::AlreadyWatched(_)) => {
            error_response(StatusCode::CONFLICT, &e.to_string())
        }
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    }
}

async fn remove_watched(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut app = state.controller.lock().await;
    app.remove(&id);
    Json(app.snapshot()).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"status": "error", "message": message})),
    )
        .into_response()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let reason = tokio::select! {
        _ = interrupt => "interrupt",
        _ = terminate => "terminate",
    };
    info!(reason, "Stopping server");
}
