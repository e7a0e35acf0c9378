//! The external player boundary: sampling its state and sending transport
//! commands. Nothing here surfaces errors to the sync engine; failed or
//! malformed samples are logged and skipped.

pub mod snapshot;
pub mod spotify;

use crate::app::events::Event;
use async_trait::async_trait;
use snapshot::{PlaybackSnapshot, RawSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Next,
    Previous,
    PlayPause,
}

#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Raw `|||`-delimited state line, or a sentinel.
    async fn sample(&self) -> anyhow::Result<String>;

    async fn send(&self, cmd: TransportCommand) -> anyhow::Result<()>;
}

/// Samples the player and decides which snapshots are worth publishing.
pub struct Poller {
    backend: Arc<dyn PlayerBackend>,
    last_playing: bool,
}

impl Poller {
    pub fn new(backend: Arc<dyn PlayerBackend>) -> Self {
        Self {
            backend,
            last_playing: false,
        }
    }

    /// Take one sample. `None` means "leave the current snapshot in effect".
    pub async fn poll_once(&mut self) -> Option<PlaybackSnapshot> {
        let raw = match self.backend.sample().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("player sample failed: {e:#}");
                return None;
            }
        };

        match snapshot::normalize(&raw, Instant::now()) {
            RawSample::Snapshot(s) => {
                tracing::debug!("{s}");
                self.last_playing = s.is_playing;
                Some(s)
            }
            // Only worth a state change if we still think something is playing.
            RawSample::NotRunning if self.last_playing => {
                tracing::info!("player stopped running");
                self.last_playing = false;
                Some(PlaybackSnapshot::not_running())
            }
            RawSample::NotRunning | RawSample::TransientError | RawSample::Malformed => None,
        }
    }

    /// Poll forever at `interval`, forwarding snapshots until the receiver is gone.
    pub async fn run(mut self, interval: Duration, tx: mpsc::Sender<Event>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(s) = self.poll_once().await
                && tx.send(Event::Player(s)).await.is_err()
            {
                break;
            }
        }
    }
}

pub fn spawn_poller(
    backend: Arc<dyn PlayerBackend>,
    interval: Duration,
    tx: mpsc::Sender<Event>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(Poller::new(backend).run(interval, tx))
}
