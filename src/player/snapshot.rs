//! Normalization of raw poll-script output into [`PlaybackSnapshot`]s.
//!
//! The script answers with
//! `name|||artist|||album|||duration|||position|||state|||artworkUrl`,
//! or one of the `NOT_RUNNING` / `ERROR...` sentinels. Units are
//! inconsistent between player versions: duration and position may come back
//! in seconds or milliseconds, with a comma or dot decimal separator.

use std::fmt;
use std::time::Instant;

pub const FIELD_DELIMITER: &str = "|||";
pub const NOT_RUNNING: &str = "NOT_RUNNING";
pub const ERROR_PREFIX: &str = "ERROR";

/// name, artist, album, duration, position, state; artwork is optional.
const MIN_FIELDS: usize = 6;

/// Anything above this is taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 10_000.0;

/// One observation of the player. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub is_playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub artwork_url: String,
    /// False when the player process is not running.
    pub player_available: bool,
    /// When the sample was normalized; the interpolation baseline.
    pub captured_at: Instant,
}

impl PlaybackSnapshot {
    pub fn empty() -> Self {
        Self::cleared(true, Instant::now())
    }

    pub fn not_running() -> Self {
        Self::cleared(false, Instant::now())
    }

    fn cleared(player_available: bool, captured_at: Instant) -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            is_playing: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            artwork_url: String::new(),
            player_available,
            captured_at,
        }
    }

    /// Nothing is loaded in the player.
    pub fn is_idle(&self) -> bool {
        self.title.is_empty()
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for PlaybackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.player_available {
            return write!(f, "[player] not running");
        }
        if self.is_idle() {
            return write!(f, "[player] idle");
        }
        write!(
            f,
            "[player] {} {} - {} ({:.1}s / {:.1}s)",
            if self.is_playing { "▶" } else { "⏸" },
            self.title,
            self.artist,
            self.position_secs,
            self.duration_secs
        )
    }
}

/// Outcome of normalizing one line of script output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    Snapshot(PlaybackSnapshot),
    /// The player application is not running.
    NotRunning,
    /// The script reported an error; skip this sample silently.
    TransientError,
    /// Fewer fields than expected; logged and skipped.
    Malformed,
}

/// Turn raw script output into a snapshot stamped with `now`.
pub fn normalize(raw: &str, now: Instant) -> RawSample {
    let raw = raw.trim_end_matches(['\r', '\n']);

    if raw == NOT_RUNNING {
        return RawSample::NotRunning;
    }
    if raw.starts_with(ERROR_PREFIX) {
        return RawSample::TransientError;
    }

    let parts: Vec<&str> = raw.split(FIELD_DELIMITER).collect();
    if parts.len() < MIN_FIELDS {
        tracing::warn!(fields = parts.len(), raw, "unexpected player output format");
        return RawSample::Malformed;
    }

    let (duration_secs, position_secs) =
        normalize_units(parse_number(parts[3]), parse_number(parts[4]));

    RawSample::Snapshot(PlaybackSnapshot {
        title: parts[0].to_string(),
        artist: parts[1].to_string(),
        album: parts[2].to_string(),
        is_playing: parts[5] == "playing",
        position_secs,
        duration_secs,
        artwork_url: parts.get(6).copied().unwrap_or_default().to_string(),
        player_available: true,
        captured_at: now,
    })
}

/// Locale-tolerant number parse; anything unusable reads as zero.
fn parse_number(field: &str) -> f64 {
    match field.trim().replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Millisecond/second disambiguation, returning `(duration, position)` in seconds.
///
/// Approximate on purpose: a track longer than ~166 minutes, or a position
/// legitimately past the reported duration, is misread.
pub fn normalize_units(mut duration: f64, mut position: f64) -> (f64, f64) {
    if duration > MILLIS_THRESHOLD {
        duration /= 1000.0;
    }

    if position > MILLIS_THRESHOLD && position > duration {
        position /= 1000.0;
    } else if position > duration * 1000.0 {
        // duration was just rescaled while position is still raw milliseconds
        position /= 1000.0;
    }

    (duration, position)
}
