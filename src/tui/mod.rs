//! Terminal UI for local and online play.

mod app;
mod input;
mod online;
mod ui;

pub use app::{Action, LocalApp};
pub use input::{Command, command_for, move_cursor};
pub use online::OnlineApp;
pub use ui::{Screen, draw};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::Rng;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument};

use crate::api::{GameApiClient, StatePoller};
use crate::games::tictactoe::Difficulty;

const FRAME_POLL: Duration = Duration::from_millis(50);

/// Sends tracing output to `path` so it does not corrupt the terminal.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn init_file_logging(path: impl AsRef<Path>) -> Result<()> {
    let log_file = std::fs::File::create(path.as_ref())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't panic if already initialized
    Ok(())
}

/// Raw-mode alternate screen, restored on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Next key press within `timeout`, ignoring releases and repeats.
fn next_key(timeout: Duration) -> Result<Option<crossterm::event::KeyCode>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key.code));
            }
        }
    }
    Ok(None)
}

/// Runs a local game until the player quits. `on_difficulty` is called
/// whenever the difficulty changes so the caller can persist it.
///
/// # Errors
///
/// Returns terminal, database or callback errors.
#[instrument(skip_all)]
pub fn run_local<R, F>(mut app: LocalApp<R>, mut on_difficulty: F) -> Result<()>
where
    R: Rng,
    F: FnMut(Difficulty) -> Result<()>,
{
    info!("Starting local game loop");
    let mut guard = TerminalGuard::enter()?;

    loop {
        app.tick(Instant::now())?;
        guard.terminal.draw(|f| draw(f, &app.screen()))?;

        let Some(key) = next_key(FRAME_POLL)? else {
            continue;
        };
        match app.handle_key(key, Instant::now())? {
            Action::Continue => {}
            Action::DifficultyChanged(d) => on_difficulty(d)?,
            Action::Quit => break,
        }
    }

    info!("Local game loop finished");
    Ok(())
}

/// Runs an online game until the player quits, polling the server every
/// `poll_interval` in the background.
///
/// # Errors
///
/// Returns terminal errors. Network errors are shown on screen instead.
#[instrument(skip_all, fields(game_id = %app.game().game_id()))]
pub async fn run_online(
    mut app: OnlineApp,
    client: GameApiClient,
    poll_interval: Duration,
) -> Result<()> {
    info!("Starting online game loop");
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = StatePoller::new(
        client,
        app.game().game_id().to_string(),
        poll_interval,
        event_tx,
        shutdown_rx,
    )
    .spawn();

    let result = async {
        let mut guard = TerminalGuard::enter()?;
        loop {
            while let Ok(event) = event_rx.try_recv() {
                app.handle_event(event);
            }
            guard.terminal.draw(|f| draw(f, &app.screen()))?;

            if let Some(key) = next_key(FRAME_POLL)? {
                if app.handle_key(key).await == Action::Quit {
                    break;
                }
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller.await {
        error!(error = %e, "Poller task failed");
    }

    info!("Online game loop finished");
    result
}
