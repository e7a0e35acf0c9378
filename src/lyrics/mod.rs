//! Lyrics module for fetching and timing synchronized lyrics
//!
//! This module provides:
//! - LRCLIB API client for fetching lyrics
//! - LRC format parser for synchronized lyrics
//! - Data structures shared by the sync engine

pub mod lrclib;
pub mod parser;

use std::sync::atomic::{AtomicU64, Ordering};

pub use lrclib::LrclibClient;

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a lyrics line, unique across every fetched set in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(u64);

impl LineId {
    pub fn next() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single line of lyrics with its start time
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsLine {
    pub id: LineId,
    /// Seconds from track start; 0 for unsynced text
    pub timestamp_secs: f64,
    pub text: String,
}

impl LyricsLine {
    pub fn new(timestamp_secs: f64, text: impl Into<String>) -> Self {
        Self {
            id: LineId::next(),
            timestamp_secs,
            text: text.into(),
        }
    }
}

/// A fetched lyrics set, sorted ascending by timestamp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lyrics {
    pub lines: Vec<LyricsLine>,
    /// True only when timestamps came from real LRC markup
    pub synced: bool,
}

impl Lyrics {
    pub fn synced(content: &str) -> Self {
        Self {
            lines: parser::parse(content),
            synced: true,
        }
    }

    /// Split untimed text into pseudo-lines, dropping blank ones.
    pub fn plain(content: &str) -> Self {
        let lines = content
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| LyricsLine::new(0.0, l))
            .collect();
        Self {
            lines,
            synced: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LyricsError {
    #[error("invalid lyrics request: {0}")]
    InvalidRequest(String),

    #[error("lyrics not found")]
    NotFound,

    #[error("lyrics service unreachable: {0}")]
    Network(String),

    #[error("malformed lyrics response: {0}")]
    Decode(String),
}

impl LyricsError {
    /// The only text ever shown to the user for a failed fetch.
    pub fn user_message(&self) -> &'static str {
        match self {
            LyricsError::NotFound => "Lyrics not found",
            _ => "Failed to fetch lyrics",
        }
    }
}

/// Fetch lyrics for a track from LRCLIB
pub async fn fetch_lyrics(
    client: &LrclibClient,
    title: &str,
    artist: &str,
    album: &str,
    duration_secs: f64,
) -> Result<Lyrics, LyricsError> {
    let response = client.get_lyrics(title, artist, album, duration_secs).await?;
    tracing::debug!(
        track = ?response.track_name,
        artist = ?response.artist_name,
        "lrclib match"
    );
    Ok(response.into_lyrics())
}
