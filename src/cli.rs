//! Command-line interface for triqui.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triqui::{Difficulty, GameMode};

/// Triqui - tic-tac-toe in the terminal, against the computer, a friend or
/// an online opponent
#[derive(Parser, Debug)]
#[command(name = "triqui")]
#[command(about = "Tic-tac-toe with a computer opponent and online play", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Preferences file (defaults to $TRIQUI_CONFIG, then triqui.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a local game in the terminal
    Play {
        /// Opponent (defaults to the saved game's mode, then vs-computer)
        #[arg(long, value_enum)]
        mode: Option<GameMode>,

        /// Computer difficulty; also saved as the new default
        #[arg(long, value_enum)]
        difficulty: Option<Difficulty>,

        /// Ignore any saved unfinished game
        #[arg(long)]
        new: bool,
    },

    /// Show the scoreboards
    Stats {
        /// Delete every recorded result
        #[arg(long)]
        reset: bool,
    },

    /// Run the online game server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Play against someone on the configured server
    Online {
        /// Online action
        #[command(subcommand)]
        action: OnlineCommand,
    },

    /// View or change preferences
    Config {
        /// Preference action
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Online actions
#[derive(Subcommand, Debug)]
pub enum OnlineCommand {
    /// List games waiting for an opponent
    List,
    /// Create a game and wait for an opponent
    Create,
    /// Join a waiting game
    Join {
        /// Game id, as shown by `online list`
        game_id: String,
    },
    /// Check that the server is reachable
    Health,
}

/// Preference actions
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the current preferences
    Show,
    /// Set the online server address
    Server {
        /// Server host
        host: String,
        /// Server port
        port: u16,
    },
    /// Set the display name
    Name {
        /// New name
        name: String,
    },
    /// Generate a new player id
    NewId,
    /// Restore defaults (the player id is kept)
    Reset,
}
