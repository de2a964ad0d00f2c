//! Database repository for finished games and the saved unfinished game.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::models::{NewSavedGame, SavedGameRow};
use crate::db::{DbError, DbErrorKind, GameRecord, NewGameRecord, Scoreboard, schema};
use crate::local::{GameMode, SavedMatch};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository. Opens a fresh connection per call.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be opened or a migration fails.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, DbError> {
        let repo = Self {
            db_path: db_path.as_ref().to_string(),
        };
        let mut conn = repo.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        info!(path = %repo.db_path, migrations = applied.len(), "GameRepository ready");
        Ok(repo)
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &str {
        &self.db_path
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| {
                DbError::new(
                    DbErrorKind::Connection,
                    format!("Failed to connect to '{}': {}", self.db_path, e),
                )
            })
    }

    /// Records a finished game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, record), fields(mode = %record.mode(), winner = %record.winner()))]
    pub fn record_result(&self, record: NewGameRecord) -> Result<GameRecord, DbError> {
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::game_results::table)
            .values(&record)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)?;

        info!(id = stored.id(), moves = stored.moves_count(), "Game result recorded");
        Ok(stored)
    }

    /// Computes the scoreboard for one mode.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn scoreboard(&self, mode: GameMode) -> Result<Scoreboard, DbError> {
        let mut conn = self.connection()?;

        let winners: Vec<String> = schema::game_results::table
            .filter(schema::game_results::mode.eq(mode.to_string()))
            .select(schema::game_results::winner)
            .load(&mut conn)?;

        let board = Scoreboard::tally(mode, winners.iter().map(String::as_str));
        debug!(
            x_wins = board.x_wins(),
            o_wins = board.o_wins(),
            ties = board.ties(),
            "Scoreboard computed"
        );
        Ok(board)
    }

    /// Most recent finished games, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn recent_results(&self, limit: i64) -> Result<Vec<GameRecord>, DbError> {
        let mut conn = self.connection()?;

        let records = schema::game_results::table
            .order((
                schema::game_results::played_at.desc(),
                schema::game_results::id.desc(),
            ))
            .limit(limit)
            .select(GameRecord::as_select())
            .load(&mut conn)?;

        debug!(count = records.len(), "Loaded recent results");
        Ok(records)
    }

    /// Deletes recorded results for `mode`, or for every mode when `None`.
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn reset_scores(&self, mode: Option<GameMode>) -> Result<usize, DbError> {
        let mut conn = self.connection()?;

        let removed = match mode {
            Some(mode) => diesel::delete(
                schema::game_results::table
                    .filter(schema::game_results::mode.eq(mode.to_string())),
            )
            .execute(&mut conn)?,
            None => diesel::delete(schema::game_results::table).execute(&mut conn)?,
        };

        info!(removed, "Scores reset");
        Ok(removed)
    }

    /// Stores `saved` as the single unfinished game, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, saved), fields(board = %saved.board.to_compact(), mode = %saved.mode))]
    pub fn save_game(&self, saved: &SavedMatch) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let row = NewSavedGame::from(saved);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(schema::saved_games::table).execute(conn)?;
            diesel::insert_into(schema::saved_games::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })?;

        info!("Unfinished game saved");
        Ok(())
    }

    /// Loads the saved unfinished game, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or the row is corrupt.
    #[instrument(skip(self))]
    pub fn load_saved_game(&self) -> Result<Option<SavedMatch>, DbError> {
        let mut conn = self.connection()?;

        let row = schema::saved_games::table
            .select(SavedGameRow::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => {
                debug!(saved_at = %row.saved_at(), "Saved game found");
                row.to_saved_match().map(Some)
            }
            None => {
                debug!("No saved game");
                Ok(None)
            }
        }
    }

    /// Removes the saved game. Returns true if one existed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn clear_saved_game(&self) -> Result<bool, DbError> {
        let mut conn = self.connection()?;
        let removed = diesel::delete(schema::saved_games::table).execute(&mut conn)?;
        debug!(removed, "Saved game cleared");
        Ok(removed > 0)
    }
}
