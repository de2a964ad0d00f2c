//! Database persistence for game results and the saved unfinished game.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{DbError, DbErrorKind};
pub use models::{GameRecord, NewGameRecord, Scoreboard};
pub use repository::{GameRepository, MIGRATIONS};
