use crate::lyrics::{LineId, LyricsError, LyricsLine};
use crate::player::snapshot::PlaybackSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No track loaded.
    Idle,
    /// Lyrics fetch in flight.
    Loading,
    /// Lyrics present, synced or not (possibly an empty set).
    Ready,
    /// The last fetch failed.
    Errored,
}

/// Everything the presentation layer may read. Written only by the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub last_snapshot: PlaybackSnapshot,
    /// Sorted ascending by timestamp.
    pub lyrics: Vec<LyricsLine>,
    pub synced: bool,
    pub is_loading: bool,
    pub last_error: Option<LyricsError>,
    pub interpolated_position: f64,
    pub active_line: Option<LineId>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            last_snapshot: PlaybackSnapshot::empty(),
            lyrics: Vec::new(),
            synced: false,
            is_loading: false,
            last_error: None,
            interpolated_position: 0.0,
            active_line: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.last_snapshot.is_idle() {
            Phase::Idle
        } else if self.is_loading {
            Phase::Loading
        } else if self.last_error.is_some() {
            Phase::Errored
        } else {
            Phase::Ready
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.active_line?;
        self.lyrics.iter().position(|l| l.id == id)
    }

    pub fn active(&self) -> Option<&LyricsLine> {
        self.active_index().map(|i| &self.lyrics[i])
    }

    /// User-facing text for the last fetch failure.
    pub fn error_message(&self) -> Option<&'static str> {
        self.last_error.as_ref().map(LyricsError::user_message)
    }
}

/// Index of the last line starting at or before `position`.
///
/// `lines` must be sorted ascending by timestamp.
pub fn resolve_active(lines: &[LyricsLine], position: f64) -> Option<usize> {
    lines
        .partition_point(|l| l.timestamp_secs <= position)
        .checked_sub(1)
}
