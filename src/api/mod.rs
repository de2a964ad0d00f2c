//! Online play: wire types, REST client, remote-game mirror and poller.

mod client;
mod models;
mod poller;
mod remote;

pub use client::{ApiError, GameApiClient, REQUEST_TIMEOUT};
pub use models::{
    AvailableGame, AvailableGamesResponse, CreateGameResponse, ErrorBody, GameStateResponse,
    HealthResponse, JoinGameResponse, MoveRequest, MoveResponse, PlayerRequest, RemoteResult,
    RemoteStatus,
};
pub use poller::{RemoteEvent, StatePoller};
pub use remote::{RemoteGame, RemoteOutcome};
