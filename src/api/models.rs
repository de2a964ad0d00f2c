//! JSON bodies exchanged with the online game server.
//!
//! Field names on the wire are Spanish and kept as-is through serde renames.

use crate::games::tictactoe::{GameStatus, Mark};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of a remote game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum RemoteStatus {
    /// Created, waiting for a second player.
    #[serde(rename = "Esperando")]
    #[strum(serialize = "Esperando")]
    Waiting,
    /// Both players joined.
    #[serde(rename = "En Progreso")]
    #[strum(serialize = "En Progreso")]
    InProgress,
    /// Won or drawn.
    #[serde(rename = "Terminado")]
    #[strum(serialize = "Terminado")]
    Finished,
}

/// Outcome field of a remote game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
pub enum RemoteResult {
    /// X completed a line.
    #[serde(rename = "X Gana")]
    #[strum(serialize = "X Gana")]
    XWins,
    /// O completed a line.
    #[serde(rename = "O Gana")]
    #[strum(serialize = "O Gana")]
    OWins,
    /// Full board, no line.
    #[serde(rename = "Empate")]
    #[strum(serialize = "Empate")]
    Draw,
    /// Not decided yet.
    #[default]
    #[serde(rename = "N/A")]
    #[strum(serialize = "N/A")]
    Pending,
}

impl RemoteResult {
    /// Maps an engine status onto the wire result.
    pub fn from_status(status: GameStatus) -> Self {
        match status {
            GameStatus::InProgress => Self::Pending,
            GameStatus::Won(Mark::X) => Self::XWins,
            GameStatus::Won(Mark::O) => Self::OWins,
            GameStatus::Draw => Self::Draw,
        }
    }

    /// Returns true once the game is decided.
    pub fn is_final(self) -> bool {
        self != Self::Pending
    }

    /// The winning mark, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::XWins => Some(Mark::X),
            Self::OWins => Some(Mark::O),
            Self::Draw | Self::Pending => None,
        }
    }
}

/// Body carrying only the caller's player id (create and join).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRequest {
    /// Caller's player id.
    #[serde(rename = "jugador_id")]
    pub player_id: String,
}

/// Response to creating a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameResponse {
    /// New game id.
    pub game_id: String,
    /// Mark assigned to the creator.
    #[serde(rename = "jugador_simbolo")]
    pub player_symbol: Mark,
    /// Human-readable message.
    #[serde(rename = "mensaje")]
    pub message: String,
}

/// A game waiting for a second player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableGame {
    /// Game id.
    pub game_id: String,
    /// Id of the player holding X.
    #[serde(rename = "jugador_x_id")]
    pub player_x_id: String,
}

/// List of joinable games.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailableGamesResponse {
    /// Games in the waiting state.
    pub available_games: Vec<AvailableGame>,
}

/// Response to joining a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameResponse {
    /// Game id.
    pub game_id: String,
    /// Mark assigned to the joiner.
    #[serde(rename = "jugador_simbolo")]
    pub player_symbol: Mark,
    /// Game status after joining.
    #[serde(rename = "estado_nuevo")]
    pub new_status: RemoteStatus,
    /// Human-readable message.
    #[serde(rename = "mensaje")]
    pub message: String,
}

/// A move request. Squares are numbered 0-8 row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Mover's player id.
    #[serde(rename = "jugador_id")]
    pub player_id: String,
    /// Target square.
    #[serde(rename = "posicion")]
    pub position: usize,
}

/// Response to an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Human-readable message.
    #[serde(rename = "mensaje")]
    pub message: String,
    /// Board after the move, nine cells of `""`, `"X"` or `"O"`.
    #[serde(rename = "tablero_nuevo")]
    pub board: Vec<String>,
    /// Mark on turn next.
    #[serde(rename = "turno_siguiente")]
    pub next_turn: Mark,
    /// Result after the move.
    #[serde(rename = "resultado_final")]
    pub final_result: RemoteResult,
}

/// Full state of a remote game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    /// Game id.
    pub game_id: String,
    /// Lifecycle status.
    #[serde(rename = "estado")]
    pub status: RemoteStatus,
    /// Nine cells of `""`, `"X"` or `"O"`.
    #[serde(rename = "tablero")]
    pub board: Vec<String>,
    /// Mark on turn.
    #[serde(rename = "turno_actual")]
    pub current_turn: Mark,
    /// Player ids keyed by mark symbol.
    #[serde(rename = "jugadores", default)]
    pub players: BTreeMap<String, String>,
    /// Outcome so far.
    #[serde(rename = "resultado", default)]
    pub result: RemoteResult,
    /// Creation timestamp, RFC 3339.
    #[serde(rename = "fecha_creacion")]
    pub created_at: String,
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Free-text reason.
    pub detail: String,
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_uses_wire_names() {
        let json = r#"{
            "game_id": "g1",
            "estado": "En Progreso",
            "tablero": ["X", "", "", "", "O", "", "", "", ""],
            "turno_actual": "X",
            "jugadores": {"X": "a", "O": "b"},
            "resultado": "N/A",
            "fecha_creacion": "2026-10-01T12:00:00Z"
        }"#;
        let state: GameStateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(state.status, RemoteStatus::InProgress);
        assert_eq!(state.current_turn, Mark::X);
        assert_eq!(state.result, RemoteResult::Pending);
        assert_eq!(state.players.get("O").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_move_request_body() {
        let body = serde_json::to_value(MoveRequest {
            player_id: "p".to_string(),
            position: 4,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"jugador_id": "p", "posicion": 4}));
    }

    #[test]
    fn test_result_strings() {
        let r: RemoteResult = serde_json::from_str("\"O Gana\"").unwrap();
        assert_eq!(r.winner(), Some(Mark::O));
        assert!(r.is_final());
        assert_eq!(RemoteResult::from_status(GameStatus::Draw).to_string(), "Empate");
        assert_eq!(RemoteStatus::Waiting.to_string(), "Esperando");
    }
}
