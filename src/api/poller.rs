//! Background polling of remote game state.

use super::client::{ApiError, GameApiClient};
use super::models::{GameStateResponse, RemoteStatus};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Update delivered to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// Server state changed since the last poll.
    State(GameStateResponse),
    /// A poll failed; polling continues on the next tick.
    PollFailed(String),
    /// The game is over. This is the last event sent.
    Finished(GameStateResponse),
}

/// Polls `GET /games/{id}` at a fixed interval until the game ends, the
/// receiver goes away or shutdown is signalled.
pub struct StatePoller {
    client: GameApiClient,
    game_id: String,
    interval: Duration,
    event_tx: mpsc::UnboundedSender<RemoteEvent>,
    shutdown: watch::Receiver<bool>,
}

impl StatePoller {
    /// Creates a poller.
    pub fn new(
        client: GameApiClient,
        game_id: String,
        interval: Duration,
        event_tx: mpsc::UnboundedSender<RemoteEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            game_id,
            interval,
            event_tx,
            shutdown,
        }
    }

    /// Runs the poller on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the polling loop to completion.
    #[instrument(skip(self), fields(game_id = %self.game_id, interval_ms = self.interval.as_millis() as u64))]
    pub async fn run(mut self) {
        info!("Starting state polling");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last: Option<GameStateResponse> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("Polling stopped by shutdown");
                        return;
                    }
                    continue;
                }
            }

            let polled = self.client.game_state(&self.game_id).await;
            let event = match next_event(&mut last, polled) {
                Some(event) => event,
                None => continue,
            };
            let finished = matches!(event, RemoteEvent::Finished(_));

            if self.event_tx.send(event).is_err() {
                debug!("Receiver dropped, polling stops");
                return;
            }
            if finished {
                return;
            }
        }
    }
}

/// Turns one poll outcome into the event to deliver, if any.
///
/// Unchanged states are suppressed. A failure forgets the last state so the
/// first successful poll afterwards is always delivered and replaces the
/// error shown for the failure.
fn next_event(
    last: &mut Option<GameStateResponse>,
    polled: Result<GameStateResponse, ApiError>,
) -> Option<RemoteEvent> {
    match polled {
        Ok(state) if state.status == RemoteStatus::Finished || state.result.is_final() => {
            info!(result = %state.result, "Game over, polling stops");
            Some(RemoteEvent::Finished(state))
        }
        Ok(state) => {
            if last.as_ref() == Some(&state) {
                debug!("State unchanged");
                return None;
            }
            *last = Some(state.clone());
            Some(RemoteEvent::State(state))
        }
        Err(e) => {
            warn!(error = %e, "Failed to poll server");
            *last = None;
            Some(RemoteEvent::PollFailed(e.user_message()))
        }
    }
}
