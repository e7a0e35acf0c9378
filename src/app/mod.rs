pub mod engine;
pub mod events;
pub mod state;

use crate::lyrics::LrclibClient;
use engine::{FetchRequest, SyncEngine};
use events::{Event, LyricsEvent};
use state::SyncState;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the sync engine and is the only writer of [`SyncState`].
///
/// Snapshots and fetch results arrive on one event channel; the
/// interpolation tick runs inside [`App::run`]. Readers observe the state
/// through [`App::subscribe`]; they are woken only for meaningful changes,
/// while the interpolated position is refreshed silently every tick.
pub struct App {
    engine: SyncEngine,
    lrclib: LrclibClient,
    state_tx: watch::Sender<SyncState>,
    fetch_task: Option<JoinHandle<()>>,
    tick_interval: Duration,
}

impl App {
    pub fn new(lrclib: LrclibClient, tick_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(SyncState::new());
        Self {
            engine: SyncEngine::new(),
            lrclib,
            state_tx,
            fetch_task: None,
            tick_interval,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// Process events and ticks until the event channel closes.
    ///
    /// `tx` is handed to fetch tasks so their results come back through `rx`.
    pub async fn run(
        &mut self,
        mut rx: mpsc::Receiver<Event>,
        tx: mpsc::Sender<Event>,
    ) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                ev = rx.recv() => match ev {
                    Some(ev) => self.handle_event(ev, &tx),
                    None => break,
                },
                _ = ticker.tick() => self.handle_tick(Instant::now()),
            }
        }

        self.cancel_fetch();
        Ok(())
    }

    fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Player(snapshot) => {
                if let Some(req) = self.engine.on_snapshot(snapshot) {
                    self.spawn_lyrics_fetch(req, tx);
                } else if self.engine.pending().is_none() {
                    self.cancel_fetch();
                }
                self.publish();
            }
            Event::Lyrics(LyricsEvent::Loaded { ticket, lyrics }) => {
                if self.engine.on_fetch_complete(&ticket, Ok(lyrics)) {
                    self.fetch_task = None;
                    self.publish();
                }
            }
            Event::Lyrics(LyricsEvent::Failed { ticket, error }) => {
                if self.engine.on_fetch_complete(&ticket, Err(error)) {
                    self.fetch_task = None;
                    self.publish();
                }
            }
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        if self.engine.on_tick(now) {
            self.publish();
        } else {
            let position = self.engine.state().interpolated_position;
            self.state_tx.send_if_modified(|s| {
                s.interpolated_position = position;
                false
            });
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.engine.state().clone());
    }

    fn cancel_fetch(&mut self) {
        if let Some(handle) = self.fetch_task.take() {
            handle.abort();
        }
    }

    /// Start a lookup, superseding whatever fetch was still in flight.
    fn spawn_lyrics_fetch(&mut self, req: FetchRequest, tx: &mpsc::Sender<Event>) {
        self.cancel_fetch();

        let lrclib = self.lrclib.clone();
        let tx = tx.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let FetchRequest {
                ticket,
                title,
                artist,
                album,
                duration_secs,
            } = req;
            let event =
                match crate::lyrics::fetch_lyrics(&lrclib, &title, &artist, &album, duration_secs)
                    .await
                {
                    Ok(lyrics) => LyricsEvent::Loaded { ticket, lyrics },
                    Err(error) => LyricsEvent::Failed { ticket, error },
                };
            let _ = tx.send(Event::Lyrics(event)).await;
        }));
    }
}
