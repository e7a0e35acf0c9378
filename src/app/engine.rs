//! The playback/lyrics sync state machine.
//!
//! Pure and synchronous: it consumes snapshots, fetch completions and ticks,
//! and tells the caller when to start a fetch. Spawning, timers and
//! publication live in [`crate::app::App`].

use super::state::{SyncState, resolve_active};
use crate::lyrics::{Lyrics, LyricsError};
use crate::player::snapshot::PlaybackSnapshot;
use std::time::Instant;

/// Separator between title and artist, chosen to never occur in either.
const KEY_SEPARATOR: char = '\u{1f}';

/// Identity used to detect a song change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey(String);

impl TrackKey {
    /// `None` when nothing is playing.
    pub fn of(snapshot: &PlaybackSnapshot) -> Option<Self> {
        if snapshot.title.is_empty() {
            return None;
        }
        Some(Self(format!(
            "{}{KEY_SEPARATOR}{}",
            snapshot.title, snapshot.artist
        )))
    }
}

/// Tags one fetch so a late completion can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub key: TrackKey,
}

/// A lookup the caller should run, then report back with the same ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_secs: f64,
}

#[derive(Debug, Default)]
pub struct SyncEngine {
    state: SyncState,
    current_key: Option<TrackKey>,
    pending: Option<FetchTicket>,
    next_ticket: u64,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// The ticket of the fetch whose result would still be applied.
    pub fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    /// Adopt a new snapshot. Returns a fetch to start when the track changed.
    ///
    /// Every snapshot is an authoritative correction: the playhead jumps to
    /// its position even when the track is unchanged.
    pub fn on_snapshot(&mut self, snapshot: PlaybackSnapshot) -> Option<FetchRequest> {
        let mut fetch = None;

        match TrackKey::of(&snapshot) {
            None => {
                if self.current_key.take().is_some() {
                    tracing::info!("playback idle");
                }
                self.pending = None;
                self.clear_lyrics();
                self.state.is_loading = false;
                self.state.last_error = None;
            }
            Some(key) if self.current_key.as_ref() != Some(&key) => {
                tracing::info!(title = %snapshot.title, artist = %snapshot.artist, "track changed");
                self.next_ticket += 1;
                let ticket = FetchTicket {
                    id: self.next_ticket,
                    key: key.clone(),
                };
                self.current_key = Some(key);
                self.pending = Some(ticket.clone());
                self.clear_lyrics();
                self.state.is_loading = true;
                self.state.last_error = None;
                fetch = Some(FetchRequest {
                    ticket,
                    title: snapshot.title.clone(),
                    artist: snapshot.artist.clone(),
                    album: snapshot.album.clone(),
                    duration_secs: snapshot.duration_secs,
                });
            }
            Some(_) => {}
        }

        self.state.interpolated_position = snapshot.position_secs;
        self.state.last_snapshot = snapshot;
        self.refresh_active_line();
        fetch
    }

    /// Apply a fetch result. Returns false (and changes nothing) if the
    /// ticket was superseded by a later track change.
    pub fn on_fetch_complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Lyrics, LyricsError>,
    ) -> bool {
        if self.pending.as_ref() != Some(ticket) {
            tracing::debug!(id = ticket.id, "dropping stale lyrics result");
            return false;
        }
        self.pending = None;
        self.state.is_loading = false;

        match result {
            Ok(lyrics) => {
                tracing::info!(lines = lyrics.lines.len(), synced = lyrics.synced, "lyrics loaded");
                self.state.lyrics = lyrics.lines;
                self.state.synced = lyrics.synced;
                self.state.last_error = None;
            }
            Err(e) => {
                tracing::warn!("lyrics fetch failed: {e}");
                self.clear_lyrics();
                self.state.last_error = Some(e);
            }
        }

        self.refresh_active_line();
        true
    }

    /// Advance the playhead to `now`. Returns true if the active line changed.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let snap = &self.state.last_snapshot;
        if !snap.is_playing {
            return false;
        }
        let elapsed = now.saturating_duration_since(snap.captured_at).as_secs_f64();
        self.state.interpolated_position = snap.position_secs + elapsed;
        self.refresh_active_line()
    }

    fn clear_lyrics(&mut self) {
        self.state.lyrics.clear();
        self.state.synced = false;
    }

    /// Only writes when the resolved line differs from the current one.
    fn refresh_active_line(&mut self) -> bool {
        let id = resolve_active(&self.state.lyrics, self.state.interpolated_position)
            .map(|i| self.state.lyrics[i].id);
        if id == self.state.active_line {
            return false;
        }
        self.state.active_line = id;
        true
    }
}
