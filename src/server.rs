//! HTTP server for frame submission.
//!
//! This module provides an HTTP server that:
//! - Accepts base64 frames via POST /predict and runs them through the recognizer
//! - Clears a session's window via POST /reset
//! - Lists the label vocabulary via GET /actions
//! - Reports readiness via GET /health
//!
//! # Architecture
//!
//! ```text
//! Mobile client ──→ POST /predict ──→ decode + extract ──→ session window ──→ classifier
//!                                        [blocking pool]                    [blocking pool]
//! ```

use crate::config::Config;
use crate::core::{
    PredictionResult, RecognizeError, Recognizer, RecognizerStatus, DEFAULT_SESSION_ID,
};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Sessions idle for longer than this are dropped
    pub session_ttl: Duration,
    /// How often the idle sweep runs
    pub sweep_interval: Duration,
}

impl ServerConfig {
    /// Create a server configuration bound to localhost with default limits
    pub fn new(port: u16) -> Self {
        Self::from_config(&Config {
            host: "127.0.0.1".to_string(),
            port,
            ..Config::default()
        })
    }

    /// Take server settings from the main configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            max_body_bytes: config.max_body_bytes,
            session_ttl: config.session_ttl,
            sweep_interval: config.sweep_interval,
        }
    }
}

/// Shared server state
pub struct ServerState {
    recognizer: Arc<Recognizer>,
}

/// Frame submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    /// Base64 image, optionally data-URL prefixed
    pub image: Option<String>,
    /// Session to append to
    pub session_id: Option<String>,
}

/// Session reset request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    pub session_id: Option<String>,
}

/// Response from reset endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub status: String,
    pub session_id: String,
}

/// Label vocabulary response
#[derive(Debug, Clone, Serialize)]
pub struct ActionsResponse {
    pub actions: Vec<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(flatten)]
    pub recognizer: RecognizerStatus,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

impl From<RecognizeError> for ApiError {
    fn from(e: RecognizeError) -> Self {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        api_error(status, e.code(), e.to_string())
    }
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        recognizer: state.recognizer.status(),
    })
}

/// GET /actions
async fn actions(State(state): State<Arc<ServerState>>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: state.recognizer.actions().labels().to_vec(),
    })
}

/// POST /predict
///
/// Appends one frame to the session and classifies once the window is full.
async fn predict(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) =
        payload.map_err(|e| api_error(e.status(), "INVALID_REQUEST", e.body_text()))?;

    let image = request
        .image
        .filter(|image| !image.is_empty())
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "MISSING_IMAGE",
                "No image data provided",
            )
        })?;
    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id, session_id = %session_id);

    async move {
        match state.recognizer.submit_image(&session_id, image).await {
            Ok(result) => {
                tracing::debug!(status = result.status(), "Prediction complete");
                Ok(Json(result))
            }
            Err(e) => {
                if e.status_code() >= 500 {
                    tracing::error!(code = e.code(), "Prediction failed: {:?}", e);
                } else {
                    tracing::warn!(code = e.code(), "Rejected frame: {}", e);
                }
                Err(ApiError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}

/// POST /reset
///
/// A missing or unreadable body resets the default session.
async fn reset(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ResetResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    state.recognizer.reset(&session_id).await.map_err(|e| {
        tracing::error!(session_id = %session_id, "Reset failed: {:?}", e);
        ApiError::from(e)
    })?;

    Ok(Json(ResetResponse {
        status: "reset".to_string(),
        session_id,
    }))
}

/// Build the router over a recognizer
pub fn router(recognizer: Arc<Recognizer>, max_body_bytes: usize) -> Router {
    let state = Arc::new(ServerState { recognizer });

    Router::new()
        .route("/health", get(health))
        .route("/actions", get(actions))
        .route("/predict", post(predict))
        .route("/reset", post(reset))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Periodically drop idle sessions
async fn sweep_sessions(recognizer: Arc<Recognizer>, ttl: Duration, every: Duration) {
    let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let removed = recognizer.sweep_idle(ttl);
        if removed > 0 {
            tracing::debug!(removed, "Idle session sweep");
        }
    }
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    recognizer: Arc<Recognizer>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(Arc::clone(&recognizer), config.max_body_bytes);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Recognizer server listening on http://{}", actual_addr);

    let sweeper = tokio::spawn(sweep_sessions(
        recognizer,
        config.session_ttl,
        config.sweep_interval,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
        sweeper.abort();
    });

    Ok((actual_addr, shutdown_tx))
}
