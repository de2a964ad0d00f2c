//! Online game sessions hosted by the server.

use crate::api::{
    AvailableGame, CreateGameResponse, GameStateResponse, JoinGameResponse, MoveResponse,
    RemoteResult, RemoteStatus,
};
use crate::games::tictactoe::{Game, GameStatus, Mark, MoveError, Position};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Unique identifier for a game session.
pub type GameId = String;

/// Unique identifier for a player.
pub type PlayerId = String;

/// Why a session operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// No game with that id.
    #[display("Game {} not found", game_id)]
    GameNotFound {
        /// Requested id.
        game_id: GameId,
    },

    /// Player id missing or blank.
    #[display("Player id must not be empty")]
    MissingPlayerId,

    /// The creator tried to join their own game.
    #[display("You cannot join your own game")]
    OwnGame,

    /// The game already has two players.
    #[display("Game is not available to join")]
    GameFull,

    /// The caller is not seated in this game.
    #[display("You are not a player in this game")]
    NotAPlayer,

    /// No second player yet.
    #[display("Waiting for an opponent to join")]
    NotStarted,

    /// The game is decided.
    #[display("Game is already over")]
    GameOver,

    /// The other player holds the turn.
    #[display("Not your turn. Waiting for {}", expected)]
    NotYourTurn {
        /// Mark on turn.
        expected: Mark,
    },

    /// Position outside 0-8.
    #[display("Invalid position {}, expected 0-8", position)]
    InvalidPosition {
        /// Rejected position.
        position: usize,
    },

    /// The square is taken.
    #[display("Square {} is already occupied", position)]
    SquareOccupied {
        /// Rejected position.
        position: usize,
    },
}

/// How long hosted games are kept once activity stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    /// Finished games are dropped this long after the deciding move.
    pub finished: Duration,
    /// Waiting or running games are dropped after this long without a join
    /// or a move.
    pub idle: Duration,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            finished: Duration::from_secs(10 * 60),
            idle: Duration::from_secs(60 * 60),
        }
    }
}

/// A hosted game: creator is X, joiner is O, X moves first.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Game id.
    pub id: GameId,
    /// Rules engine.
    pub game: Game,
    /// Player holding X (the creator).
    pub player_x: PlayerId,
    /// Player holding O, once joined.
    pub player_o: Option<PlayerId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last creation, join or accepted move.
    pub last_activity: Instant,
}

impl GameSession {
    /// Creates a session waiting for an opponent.
    #[instrument]
    pub fn new(id: GameId, player_x: PlayerId) -> Self {
        info!(game_id = %id, "Creating new game session");
        Self {
            id,
            game: Game::new(Mark::X),
            player_x,
            player_o: None,
            created_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    /// Lifecycle status as reported on the wire.
    pub fn status(&self) -> RemoteStatus {
        if self.game.is_over() {
            RemoteStatus::Finished
        } else if self.player_o.is_none() {
            RemoteStatus::Waiting
        } else {
            RemoteStatus::InProgress
        }
    }

    /// Mark held by `player_id`, if seated.
    pub fn mark_of(&self, player_id: &str) -> Option<Mark> {
        if self.player_x == player_id {
            Some(Mark::X)
        } else if self.player_o.as_deref() == Some(player_id) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Seats `player_id` as O.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::OwnGame`] for the creator and
    /// [`SessionError::GameFull`] when O is taken.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn join(&mut self, player_id: PlayerId) -> Result<Mark, SessionError> {
        if self.player_x == player_id {
            warn!("Creator tried to join own game");
            return Err(SessionError::OwnGame);
        }
        if self.player_o.is_some() {
            warn!("Game already has 2 players");
            return Err(SessionError::GameFull);
        }
        info!(player_id = %player_id, "Registering player as O");
        self.player_o = Some(player_id);
        self.last_activity = Instant::now();
        Ok(Mark::O)
    }

    /// Plays `position` for `player_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for an unknown player, a game not yet
    /// started or already over, a move out of turn, or an illegal square.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn make_move(&mut self, player_id: &str, position: usize) -> Result<GameStatus, SessionError> {
        let mark = self.mark_of(player_id).ok_or_else(|| {
            warn!(player_id, "Unknown player attempted move");
            SessionError::NotAPlayer
        })?;

        match self.status() {
            RemoteStatus::Waiting => return Err(SessionError::NotStarted),
            RemoteStatus::Finished => return Err(SessionError::GameOver),
            RemoteStatus::InProgress => {}
        }

        let expected = self.game.to_move();
        if mark != expected {
            warn!(player_id, %expected, %mark, "Player tried to move out of turn");
            return Err(SessionError::NotYourTurn { expected });
        }

        let pos = Position::from_index(position)
            .ok_or(SessionError::InvalidPosition { position })?;

        let status = self.game.place(pos).map_err(|e| match e {
            MoveError::SquareOccupied(_) => SessionError::SquareOccupied { position },
            MoveError::GameOver => SessionError::GameOver,
            other => {
                warn!(error = %other, "Unexpected move rejection");
                SessionError::NotYourTurn { expected }
            }
        })?;

        self.last_activity = Instant::now();
        info!(player_id, position, ?status, "Move completed successfully");
        Ok(status)
    }

    /// Returns true once the session has outlived `retention` at `now`.
    pub fn is_expired(&self, now: Instant, retention: Retention) -> bool {
        let quiet_for = now.saturating_duration_since(self.last_activity);
        match self.status() {
            RemoteStatus::Finished => quiet_for >= retention.finished,
            RemoteStatus::Waiting | RemoteStatus::InProgress => quiet_for >= retention.idle,
        }
    }

    /// Full state for `GET /games/{id}`.
    pub fn to_state(&self) -> GameStateResponse {
        let mut players = BTreeMap::new();
        players.insert("X".to_string(), self.player_x.clone());
        if let Some(o) = &self.player_o {
            players.insert("O".to_string(), o.clone());
        }
        GameStateResponse {
            game_id: self.id.clone(),
            status: self.status(),
            board: self.game.board().to_cells(),
            current_turn: self.game.to_move(),
            players,
            result: RemoteResult::from_status(self.game.status()),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Manages all hosted games.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<GameId, GameSession>>>,
    retention: Retention,
}

impl SessionManager {
    /// Creates an empty session manager.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session manager");
        Self::default()
    }

    /// Creates an empty session manager that keeps games for `retention`.
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Drops every session expired at `now`. Returns how many were removed.
    #[instrument(skip(self, now))]
    pub fn evict_expired(&self, now: Instant) -> usize {
        let retention = self.retention;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session.is_expired(now, retention);
            if expired {
                debug!(game_id = %id, status = %session.status(), "Evicting game");
            }
            !expired
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Evicted expired games");
        }
        removed
    }

    // A panic while holding the lock leaves the map itself intact.
    fn lock(&self) -> MutexGuard<'_, HashMap<GameId, GameSession>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Creates a game with `player_id` as X.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingPlayerId`] for a blank id.
    #[instrument(skip(self))]
    pub fn create_game(&self, player_id: &str) -> Result<CreateGameResponse, SessionError> {
        let player_id = require_player(player_id)?;
        let id = Uuid::new_v4().to_string();
        let session = GameSession::new(id.clone(), player_id);
        self.lock().insert(id.clone(), session);

        info!(game_id = %id, "Created new game");
        Ok(CreateGameResponse {
            game_id: id,
            player_symbol: Mark::X,
            message: "Game created. Waiting for an opponent".to_string(),
        })
    }

    /// Games waiting for a second player, oldest first.
    #[instrument(skip(self))]
    pub fn available_games(&self) -> Vec<AvailableGame> {
        let sessions = self.lock();
        let mut waiting: Vec<&GameSession> = sessions
            .values()
            .filter(|s| s.status() == RemoteStatus::Waiting)
            .collect();
        waiting.sort_by_key(|s| s.created_at);
        let games: Vec<_> = waiting
            .into_iter()
            .map(|s| AvailableGame {
                game_id: s.id.clone(),
                player_x_id: s.player_x.clone(),
            })
            .collect();
        debug!(count = games.len(), "Listed available games");
        games
    }

    /// Seats `player_id` as O in `game_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for an unknown game, a blank id, the
    /// creator joining, or a full game.
    #[instrument(skip(self))]
    pub fn join_game(&self, game_id: &str, player_id: &str) -> Result<JoinGameResponse, SessionError> {
        let player_id = require_player(player_id)?;
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(game_id)
            .ok_or_else(|| not_found(game_id))?;

        let mark = session.join(player_id)?;
        Ok(JoinGameResponse {
            game_id: session.id.clone(),
            player_symbol: mark,
            new_status: session.status(),
            message: format!("Joined game as {}", mark),
        })
    }

    /// Plays a move.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for an unknown game or a rejected move.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        game_id: &str,
        player_id: &str,
        position: usize,
    ) -> Result<MoveResponse, SessionError> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(game_id)
            .ok_or_else(|| not_found(game_id))?;

        let status = session.make_move(player_id, position)?;
        let message = match status {
            GameStatus::InProgress => "Move accepted".to_string(),
            GameStatus::Won(mark) => format!("{} wins", mark),
            GameStatus::Draw => "Draw".to_string(),
        };
        Ok(MoveResponse {
            message,
            board: session.game.board().to_cells(),
            next_turn: session.game.to_move(),
            final_result: RemoteResult::from_status(status),
        })
    }

    /// Current state of a game.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GameNotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn game_state(&self, game_id: &str) -> Result<GameStateResponse, SessionError> {
        self.lock()
            .get(game_id)
            .map(GameSession::to_state)
            .ok_or_else(|| not_found(game_id))
    }

    /// Number of hosted games.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no games are hosted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn require_player(player_id: &str) -> Result<PlayerId, SessionError> {
    let trimmed = player_id.trim();
    if trimmed.is_empty() {
        Err(SessionError::MissingPlayerId)
    } else {
        Ok(trimmed.to_string())
    }
}

fn not_found(game_id: &str) -> SessionError {
    debug!(game_id, "Game not found");
    SessionError::GameNotFound {
        game_id: game_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (SessionManager, String) {
        let manager = SessionManager::new();
        let id = manager.create_game("alice").unwrap().game_id;
        manager.join_game(&id, "bob").unwrap();
        (manager, id)
    }

    #[test]
    fn test_creator_is_x_and_listed() {
        let manager = SessionManager::new();
        let created = manager.create_game("alice").unwrap();
        assert_eq!(created.player_symbol, Mark::X);
        let listed = manager.available_games();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].player_x_id, "alice");
    }

    #[test]
    fn test_join_rules() {
        let manager = SessionManager::new();
        let id = manager.create_game("alice").unwrap().game_id;
        assert_eq!(manager.join_game(&id, "alice"), Err(SessionError::OwnGame));
        let joined = manager.join_game(&id, "bob").unwrap();
        assert_eq!(joined.player_symbol, Mark::O);
        assert_eq!(joined.new_status, RemoteStatus::InProgress);
        assert_eq!(manager.join_game(&id, "carol"), Err(SessionError::GameFull));
        assert!(manager.available_games().is_empty());
    }

    #[test]
    fn test_move_validation() {
        let (manager, id) = started();
        assert_eq!(
            manager.make_move(&id, "bob", 0),
            Err(SessionError::NotYourTurn { expected: Mark::X })
        );
        assert_eq!(
            manager.make_move(&id, "mallory", 0),
            Err(SessionError::NotAPlayer)
        );
        assert_eq!(
            manager.make_move(&id, "alice", 9),
            Err(SessionError::InvalidPosition { position: 9 })
        );
        let moved = manager.make_move(&id, "alice", 4).unwrap();
        assert_eq!(moved.next_turn, Mark::O);
        assert_eq!(moved.board[4], "X");
        assert_eq!(
            manager.make_move(&id, "bob", 4),
            Err(SessionError::SquareOccupied { position: 4 })
        );
    }

    #[test]
    fn test_waiting_game_rejects_moves() {
        let manager = SessionManager::new();
        let id = manager.create_game("alice").unwrap().game_id;
        assert_eq!(manager.make_move(&id, "alice", 0), Err(SessionError::NotStarted));
    }

    #[test]
    fn test_win_finishes_game() {
        let (manager, id) = started();
        for (player, pos) in [("alice", 0), ("bob", 3), ("alice", 1), ("bob", 4)] {
            manager.make_move(&id, player, pos).unwrap();
        }
        let last = manager.make_move(&id, "alice", 2).unwrap();
        assert_eq!(last.final_result, RemoteResult::XWins);
        let state = manager.game_state(&id).unwrap();
        assert_eq!(state.status, RemoteStatus::Finished);
        assert_eq!(manager.make_move(&id, "bob", 8), Err(SessionError::GameOver));
    }

    #[test]
    fn test_eviction_by_status() {
        let retention = Retention {
            finished: Duration::from_secs(60),
            idle: Duration::from_secs(600),
        };
        let manager = SessionManager::with_retention(retention);
        let waiting = manager.create_game("alice").unwrap().game_id;
        let finished = manager.create_game("carol").unwrap().game_id;
        manager.join_game(&finished, "dave").unwrap();
        for (player, pos) in [("carol", 0), ("dave", 3), ("carol", 1), ("dave", 4), ("carol", 2)] {
            manager.make_move(&finished, player, pos).unwrap();
        }

        let now = Instant::now();
        assert_eq!(manager.evict_expired(now), 0);

        assert_eq!(manager.evict_expired(now + Duration::from_secs(120)), 1);
        assert!(matches!(
            manager.game_state(&finished),
            Err(SessionError::GameNotFound { .. })
        ));
        assert!(manager.game_state(&waiting).is_ok());

        assert_eq!(manager.evict_expired(now + Duration::from_secs(601)), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_activity_postpones_eviction() {
        let retention = Retention {
            finished: Duration::from_secs(60),
            idle: Duration::from_secs(600),
        };
        let manager = SessionManager::with_retention(retention);
        let id = manager.create_game("alice").unwrap().game_id;
        let created = manager.lock()[&id].last_activity;
        manager.join_game(&id, "bob").unwrap();
        manager.make_move(&id, "alice", 4).unwrap();
        let moved = manager.lock()[&id].last_activity;
        assert!(moved >= created);
        assert_eq!(manager.evict_expired(moved + Duration::from_secs(599)), 0);
        assert_eq!(manager.evict_expired(moved + Duration::from_secs(600)), 1);
    }

    #[test]
    fn test_unknown_game() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.game_state("nope"),
            Err(SessionError::GameNotFound { .. })
        ));
        assert_eq!(manager.create_game("  "), Err(SessionError::MissingPlayerId));
    }
}
