//! Triqui - unified CLI
//!
//! Local play, scoreboards, the online server and the online client.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, ConfigCommand, OnlineCommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;
use triqui::{
    Difficulty, GameApiClient, GameMode, GameRepository, LocalApp, LocalMatch, OnlineApp, Preferences,
    RemoteGame, SessionManager, config, server, tui,
};

const LOG_FILE: &str = "triqui.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let prefs_path = config::resolve_path(cli.config);

    match cli.command {
        Command::Play {
            mode,
            difficulty,
            new,
        } => {
            tui::init_file_logging(LOG_FILE)?;
            let prefs = Preferences::load_or_default(&prefs_path)?;
            run_play(prefs, &prefs_path, mode, difficulty, new)
        }
        Command::Stats { reset } => {
            init_stderr_logging("warn");
            let prefs = Preferences::load_or_default(&prefs_path)?;
            run_stats(&prefs, reset)
        }
        Command::Serve { host, port } => {
            init_stderr_logging("info");
            run_server(host, port).await
        }
        Command::Online { action } => {
            let prefs = Preferences::load_or_default(&prefs_path)?;
            run_online(&prefs, action).await
        }
        Command::Config { action } => {
            init_stderr_logging("warn");
            let prefs = Preferences::load_or_default(&prefs_path)?;
            run_config(prefs, &prefs_path, action)
        }
    }
}

fn init_stderr_logging(default: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run a local game, resuming the saved one unless `new` is set
#[instrument(skip(prefs, prefs_path))]
fn run_play(
    mut prefs: Preferences,
    prefs_path: &Path,
    mode: Option<GameMode>,
    difficulty: Option<Difficulty>,
    new: bool,
) -> Result<()> {
    if let Some(d) = difficulty {
        prefs.set_difficulty(d);
        prefs.save(prefs_path)?;
    }
    let difficulty = *prefs.difficulty();

    let repo = GameRepository::open(prefs.db_path())
        .with_context(|| format!("Failed to open database {}", prefs.db_path()))?;

    let saved = if new {
        repo.clear_saved_game()?;
        None
    } else {
        match repo.load_saved_game() {
            Ok(saved) => saved,
            Err(e) if e.is_corrupt_row() => {
                warn!(error = %e, "Discarding unreadable saved game");
                repo.clear_saved_game()?;
                None
            }
            Err(e) => return Err(e).context("Failed to load saved game"),
        }
    };

    let local = match saved.filter(|s| mode.is_none_or(|m| m == s.mode)) {
        Some(mut saved) => {
            saved.difficulty = difficulty;
            match LocalMatch::resume(saved, StdRng::from_entropy()) {
                Ok(local) => local,
                Err(e) => {
                    warn!(error = %e, "Saved game is invalid, starting fresh");
                    repo.clear_saved_game()?;
                    LocalMatch::new(saved.mode, difficulty)
                }
            }
        }
        None => LocalMatch::new(mode.unwrap_or_default(), difficulty),
    };

    let app = LocalApp::new(local, repo, prefs.computer_delay(), Instant::now())?;
    tui::run_local(app, |d| {
        prefs.set_difficulty(d);
        prefs.save(prefs_path)?;
        Ok(())
    })
}

/// Print scoreboards and recent games
fn run_stats(prefs: &Preferences, reset: bool) -> Result<()> {
    let repo = GameRepository::open(prefs.db_path())?;

    if reset {
        let removed = repo.reset_scores(None)?;
        println!("Removed {} recorded games.", removed);
        return Ok(());
    }

    let vs = repo.scoreboard(GameMode::VsComputer)?;
    let two = repo.scoreboard(GameMode::TwoPlayers)?;
    println!(
        "vs Computer:  you {}  computer {}  ties {}",
        vs.human_wins(),
        vs.computer_wins(),
        vs.ties()
    );
    println!(
        "Two Players:  X {}  O {}  ties {}",
        two.x_wins(),
        two.o_wins(),
        two.ties()
    );

    let recent = repo.recent_results(10)?;
    if !recent.is_empty() {
        println!();
        println!("Recent games:");
        for record in recent {
            let outcome = record
                .parse_result()
                .map(|r| {
                    record
                        .parse_mode()
                        .map(|m| r.message(m))
                        .unwrap_or_else(|_| record.winner().clone())
                })
                .unwrap_or_else(|_| record.winner().clone());
            println!(
                "  {}  {:<12} {:<8} {:>2} moves  {}",
                record.played_at().format("%Y-%m-%d %H:%M"),
                record.mode(),
                record.difficulty().as_deref().unwrap_or("-"),
                record.moves_count(),
                outcome
            );
        }
    }
    Ok(())
}

/// Run the online game server
#[instrument]
async fn run_server(host: String, port: u16) -> Result<()> {
    info!("Starting triqui game server");
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    server::serve(listener, SessionManager::new()).await?;
    Ok(())
}

/// Talk to the configured online server
async fn run_online(prefs: &Preferences, action: OnlineCommand) -> Result<()> {
    let client = GameApiClient::new(prefs.server_host(), *prefs.server_port())?;
    let player_id = prefs.player_id().to_string();

    let game = match action {
        OnlineCommand::Health => {
            init_stderr_logging("warn");
            client.health().await?;
            println!("Server at {} is healthy.", client.base_url());
            return Ok(());
        }
        OnlineCommand::List => {
            init_stderr_logging("warn");
            let games = client.available_games().await?;
            if games.is_empty() {
                println!("No games waiting for an opponent.");
            }
            for game in games {
                println!("{}  (host {})", game.game_id, game.player_x_id);
            }
            return Ok(());
        }
        OnlineCommand::Create => {
            tui::init_file_logging(LOG_FILE)?;
            let created = client.create_game(&player_id).await?;
            RemoteGame::from_created(&created)
        }
        OnlineCommand::Join { game_id } => {
            tui::init_file_logging(LOG_FILE)?;
            let joined = client.join_game(&game_id, &player_id).await?;
            RemoteGame::from_joined(&joined)
        }
    };

    info!(game_id = %game.game_id(), player = %prefs.player_name(), "Entering online game");
    let app = OnlineApp::new(client.clone(), player_id, game);
    tui::run_online(app, client, prefs.poll_interval()).await
}

/// Show or update preferences
fn run_config(mut prefs: Preferences, prefs_path: &Path, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            println!("# {}", prefs_path.display());
            print!("{}", toml::to_string_pretty(&prefs)?);
            return Ok(());
        }
        ConfigCommand::Server { host, port } => {
            prefs = prefs.with_server_host(host).with_server_port(port);
            println!("Server set to {}", prefs.api_base_url());
        }
        ConfigCommand::Name { name } => {
            prefs = prefs.with_player_name(name);
            println!("Name set to {}", prefs.player_name());
        }
        ConfigCommand::NewId => {
            let id = prefs.regenerate_player_id();
            println!("New player id {}", id);
        }
        ConfigCommand::Reset => {
            prefs.reset();
            println!("Preferences reset");
        }
    }
    prefs.save(prefs_path)?;
    Ok(())
}
