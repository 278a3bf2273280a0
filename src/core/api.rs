//! HTTP + WebSocket API for a running game
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /state - Latest snapshot
//! - POST /pause, POST /resume - Session control
//! - POST /reset - New session with {mode, score_to_level, event_window}
//! - POST /lane/spawn, POST /lane/despawn - Event lane control
//! - POST /prediction - Capture layer delivers {label}
//! - WS /ws - Live events

use axum::{
    extract::{ws::{Message, WebSocket}, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::core::GameLoopHandle;
use crate::types::{GameError, GameMode, GameSnapshot, PredictionSample, TickReport};
use crate::{DEFAULT_EVENT_WINDOW, DEFAULT_SCORE_TO_LEVEL};

/// Reset request; omitted fields fall back to the defaults
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default = "default_score_to_level")]
    pub score_to_level: u32,
    #[serde(default = "default_event_window")]
    pub event_window: [u32; 2],
}

fn default_score_to_level() -> u32 {
    DEFAULT_SCORE_TO_LEVEL
}

fn default_event_window() -> [u32; 2] {
    DEFAULT_EVENT_WINDOW
}

/// Classifier result pushed by the capture layer
#[derive(Debug, Deserialize)]
pub struct PredictionRequest {
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub accepted: bool,
    /// An unconsumed earlier prediction was replaced
    pub superseded: bool,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub phase: String,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// `GameError` as an HTTP response
#[derive(Debug)]
pub struct ApiError(GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::InvalidState { .. } => StatusCode::CONFLICT,
            GameError::MalformedPrediction { .. }
            | GameError::InvalidConfig(_)
            | GameError::ConfigIo(_) => StatusCode::BAD_REQUEST,
            GameError::LoopClosed => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorResponse {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<GameSnapshot>, ApiError>;

/// Create the API router around a running game loop
pub fn create_router(game: GameLoopHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/reset", post(reset))
        .route("/lane/spawn", post(spawn_lane))
        .route("/lane/despawn", post(despawn_lane))
        .route("/prediction", post(push_prediction))
        .route("/ws", get(websocket_handler))
        .with_state(game)
}

/// Health check endpoint
async fn health(State(game): State<GameLoopHandle>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        phase: game.latest().phase.to_string(),
    })
}

async fn get_state(State(game): State<GameLoopHandle>) -> ApiResult {
    Ok(Json(game.snapshot().await?))
}

async fn pause(State(game): State<GameLoopHandle>) -> ApiResult {
    Ok(Json(game.pause().await?))
}

async fn resume(State(game): State<GameLoopHandle>) -> ApiResult {
    Ok(Json(game.resume().await?))
}

async fn reset(State(game): State<GameLoopHandle>, Json(req): Json<ResetRequest>) -> ApiResult {
    Ok(Json(game.reset(req.mode, req.score_to_level, req.event_window).await?))
}

async fn spawn_lane(State(game): State<GameLoopHandle>) -> ApiResult {
    Ok(Json(game.spawn_lane().await?))
}

async fn despawn_lane(State(game): State<GameLoopHandle>) -> ApiResult {
    Ok(Json(game.despawn_lane().await?))
}

/// Accepted as-is; labels outside the alphabet are dropped at reconciliation
async fn push_prediction(
    State(game): State<GameLoopHandle>,
    Json(req): Json<PredictionRequest>,
) -> (StatusCode, Json<PredictionResponse>) {
    let superseded = game.queue().push(PredictionSample::new(req.label));
    (
        StatusCode::ACCEPTED,
        Json(PredictionResponse {
            accepted: true,
            superseded,
        }),
    )
}

/// WebSocket handler for live events
async fn websocket_handler(State(game): State<GameLoopHandle>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let rx = game.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward tick reports until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<TickReport>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            let report = match rx.recv().await {
                Ok(report) => report,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagging");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let json = serde_json::to_string(&report).unwrap_or_default();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }
}

/// Run the API server
pub async fn run_server(addr: &str, game: GameLoopHandle) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(game);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "letterfall API listening");
    println!("Letterfall API running on {}", addr);
    println!("  GET  /health        - Health check");
    println!("  GET  /state         - Current snapshot");
    println!("  POST /pause         - Pause session");
    println!("  POST /resume        - Resume session");
    println!("  POST /reset         - Start a new session");
    println!("  POST /lane/spawn    - Add the event lane");
    println!("  POST /lane/despawn  - Remove the event lane");
    println!("  POST /prediction    - Deliver a classifier label");
    println!("  WS   /ws            - Live events");
    axum::serve(listener, router).await?;
    Ok(())
}
