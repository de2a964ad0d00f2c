//! REST server hosting online games.
//!
//! Routes live under `/api/v1`, plus an unversioned `/health`. Every error
//! is answered with a JSON `{"detail": ...}` body.

use crate::api::{ErrorBody, HealthResponse, MoveRequest, PlayerRequest};
use crate::session::{SessionError, SessionManager};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use derive_more::{Display, From};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

/// How often the server drops expired games.
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

impl SessionError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::GameNotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotAPlayer => StatusCode::FORBIDDEN,
            Self::MissingPlayerId | Self::OwnGame | Self::InvalidPosition { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::GameFull
            | Self::NotStarted
            | Self::GameOver
            | Self::NotYourTurn { .. }
            | Self::SquareOccupied { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), error = %self, "Request rejected");
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Why a handler refused a request.
#[derive(Debug, Display, From)]
enum Rejected {
    /// The body was missing, not JSON, or did not match the expected shape.
    #[display("Invalid request body: {}", _0.body_text())]
    Body(JsonRejection),
    /// The game rules refused the request.
    Session(SessionError),
}

impl IntoResponse for Rejected {
    fn into_response(self) -> Response {
        match self {
            Self::Session(e) => e.into_response(),
            Self::Body(rejection) => {
                let status = rejection.status();
                let detail = Self::Body(rejection).to_string();
                warn!(status = status.as_u16(), error = %detail, "Request rejected");
                (status, Json(ErrorBody { detail })).into_response()
            }
        }
    }
}

/// Builds the router over `manager`.
pub fn router(manager: SessionManager) -> Router {
    let api = Router::new()
        .route("/games", post(create_game))
        .route("/games/available", get(available_games))
        .route("/games/{game_id}", get(game_state))
        .route("/games/{game_id}/join", put(join_game))
        .route("/games/{game_id}/move", post(make_move));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(manager)
}

/// Serves on an already-bound listener until ctrl-c.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
#[instrument(skip(listener, manager))]
pub async fn serve(listener: TcpListener, manager: SessionManager) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Game server listening");
    let sweeper = tokio::spawn(evict_periodically(manager.clone(), EVICTION_INTERVAL));
    let served = axum::serve(listener, router(manager))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;
    info!("Game server stopped");
    Ok(())
}

/// Drops expired games from `manager` every `every`.
pub async fn evict_periodically(manager: SessionManager, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        manager.evict_expired(Instant::now());
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[instrument(skip(manager, body))]
async fn create_game(
    State(manager): State<SessionManager>,
    body: Result<Json<PlayerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Rejected> {
    let Json(req) = body?;
    let created = manager.create_game(&req.player_id)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn available_games(State(manager): State<SessionManager>) -> impl IntoResponse {
    Json(crate::api::AvailableGamesResponse {
        available_games: manager.available_games(),
    })
}

#[instrument(skip(manager, body))]
async fn join_game(
    State(manager): State<SessionManager>,
    Path(game_id): Path<String>,
    body: Result<Json<PlayerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Rejected> {
    let Json(req) = body?;
    Ok(Json(manager.join_game(&game_id, &req.player_id)?))
}

#[instrument(skip(manager, body))]
async fn make_move(
    State(manager): State<SessionManager>,
    Path(game_id): Path<String>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Rejected> {
    let Json(req) = body?;
    Ok(Json(manager.make_move(
        &game_id,
        &req.player_id,
        req.position,
    )?))
}

async fn game_state(
    State(manager): State<SessionManager>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, SessionError> {
    Ok(Json(manager.game_state(&game_id)?))
}
