//! REST client for the online game server.

use super::models::{
    AvailableGame, AvailableGamesResponse, CreateGameResponse, ErrorBody, GameStateResponse,
    JoinGameResponse, MoveRequest, MoveResponse, PlayerRequest,
};
use crate::games::tictactoe::Position;
use derive_more::{Display, Error, From};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Connect and request timeout for every call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to the game server.
#[derive(Debug, Display, Error, From)]
pub enum ApiError {
    /// Connection, timeout or body read failure.
    #[display("Connection error: {}", _0)]
    #[from]
    Transport(reqwest::Error),

    /// The server answered with a non-success status.
    #[display("Server error ({}): {}", status, detail)]
    Server {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body, or the raw body.
        detail: String,
    },

    /// The configured server address is not a usable base URL.
    #[display("Invalid server URL '{}'", url)]
    InvalidUrl {
        /// Rejected address.
        url: String,
    },

    /// The server answered with something we could not interpret.
    #[display("Protocol error: {}", message)]
    Protocol {
        /// What went wrong.
        message: String,
    },
}

impl ApiError {
    /// Short text suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Connection error".to_string(),
            Self::Server { detail, .. } => detail.clone(),
            Self::Protocol { message } => message.clone(),
            Self::InvalidUrl { .. } => self.to_string(),
        }
    }
}

/// HTTP client for the `/api/v1` game endpoints.
#[derive(Debug, Clone)]
pub struct GameApiClient {
    root_url: reqwest::Url,
    client: reqwest::Client,
}

impl GameApiClient {
    /// Creates a client for the server at `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    #[instrument]
    pub fn new(host: &str, port: u16) -> Result<Self, ApiError> {
        Self::with_root_url(format!("http://{}:{}", host, port))
    }

    /// Creates a client for a server root such as `http://127.0.0.1:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `root_url` is not an absolute
    /// URL that can carry a path, and [`ApiError::Transport`] if the HTTP
    /// client cannot be built.
    #[instrument(skip(root_url), fields(root_url = %root_url))]
    pub fn with_root_url(root_url: String) -> Result<Self, ApiError> {
        let root_url = reqwest::Url::parse(&root_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or(ApiError::InvalidUrl { url: root_url })?;
        let client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        debug!(root_url = %root_url, "Created API client");
        Ok(Self { root_url, client })
    }

    /// Base URL of the versioned API.
    pub fn base_url(&self) -> String {
        format!("{}/api/v1", self.root_url.as_str().trim_end_matches('/'))
    }

    /// Joins `segments` onto the server root, percent-encoding each one so
    /// ids cannot change the route.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut url = self.root_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                url: self.root_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn api_url(&self, segments: &[&str]) -> Result<reqwest::Url, ApiError> {
        let mut full = vec!["api", "v1"];
        full.extend_from_slice(segments);
        self.url(&full)
    }

    /// Checks that the server answers `GET /health` with a success status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(self.url(&["health"])?)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!("Server healthy");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Server {
                status: status.as_u16(),
                detail: body,
            })
        }
    }

    /// Creates a game; the caller becomes X.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a rejected request.
    #[instrument(skip(self))]
    pub async fn create_game(&self, player_id: &str) -> Result<CreateGameResponse, ApiError> {
        let response = self
            .client
            .post(self.api_url(&["games"])?)
            .json(&PlayerRequest {
                player_id: player_id.to_string(),
            })
            .send()
            .await?;
        let created: CreateGameResponse = decode(response).await?;
        info!(game_id = %created.game_id, symbol = %created.player_symbol, "Game created");
        Ok(created)
    }

    /// Lists games waiting for a second player.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a rejected request.
    #[instrument(skip(self))]
    pub async fn available_games(&self) -> Result<Vec<AvailableGame>, ApiError> {
        let response = self
            .client
            .get(self.api_url(&["games", "available"])?)
            .send()
            .await?;
        let list: AvailableGamesResponse = decode(response).await?;
        debug!(count = list.available_games.len(), "Fetched available games");
        Ok(list.available_games)
    }

    /// Joins a waiting game; the caller becomes O.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a rejected request.
    #[instrument(skip(self))]
    pub async fn join_game(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<JoinGameResponse, ApiError> {
        let response = self
            .client
            .put(self.api_url(&["games", game_id, "join"])?)
            .json(&PlayerRequest {
                player_id: player_id.to_string(),
            })
            .send()
            .await?;
        let joined: JoinGameResponse = decode(response).await?;
        info!(game_id = %joined.game_id, symbol = %joined.player_symbol, "Joined game");
        Ok(joined)
    }

    /// Submits a move.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a rejected move.
    #[instrument(skip(self), fields(position = %position))]
    pub async fn make_move(
        &self,
        game_id: &str,
        player_id: &str,
        position: Position,
    ) -> Result<MoveResponse, ApiError> {
        let response = self
            .client
            .post(self.api_url(&["games", game_id, "move"])?)
            .json(&MoveRequest {
                player_id: player_id.to_string(),
                position: position.to_index(),
            })
            .send()
            .await?;
        let moved: MoveResponse = decode(response).await?;
        debug!(next = %moved.next_turn, result = %moved.final_result, "Move accepted");
        Ok(moved)
    }

    /// Fetches the full state of a game.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or an unknown game.
    #[instrument(skip(self))]
    pub async fn game_state(&self, game_id: &str) -> Result<GameStateResponse, ApiError> {
        let response = self
            .client
            .get(self.api_url(&["games", game_id])?)
            .send()
            .await?;
        decode(response).await
    }
}

/// Decodes a success body as `T`, or turns an error body into
/// [`ApiError::Server`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.detail)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        return Err(ApiError::Server {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Protocol {
        message: format!("Unexpected response body: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(root: &str) -> GameApiClient {
        GameApiClient::with_root_url(root.to_string()).unwrap()
    }

    #[test]
    fn test_game_id_cannot_escape_its_segment() {
        let c = client("http://127.0.0.1:8080");
        let url = c.api_url(&["games", "../available?x=1#y", "join"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/v1/games/..%2Favailable%3Fx=1%23y/join"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_root_with_trailing_slash_or_prefix() {
        assert_eq!(
            client("http://127.0.0.1:8080/").api_url(&["games"]).unwrap().as_str(),
            "http://127.0.0.1:8080/api/v1/games"
        );
        let prefixed = client("http://example.test/triqui/");
        assert_eq!(prefixed.url(&["health"]).unwrap().as_str(), "http://example.test/triqui/health");
        assert_eq!(prefixed.base_url(), "http://example.test/triqui/api/v1");
        assert_eq!(client("http://127.0.0.1:8080").base_url(), "http://127.0.0.1:8080/api/v1");
    }

    #[test]
    fn test_unusable_root_rejected() {
        for root in ["not a url", "mailto:someone@example.test"] {
            assert!(matches!(
                GameApiClient::with_root_url(root.to_string()),
                Err(ApiError::InvalidUrl { .. })
            ));
        }
    }
}
