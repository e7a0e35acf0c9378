use crate::app::engine::FetchTicket;
use crate::lyrics::{Lyrics, LyricsError};
use crate::player::snapshot::PlaybackSnapshot;

#[derive(Debug, Clone)]
pub enum Event {
    Player(PlaybackSnapshot),
    Lyrics(LyricsEvent),
}

#[derive(Debug, Clone)]
pub enum LyricsEvent {
    Loaded { ticket: FetchTicket, lyrics: Lyrics },
    Failed { ticket: FetchTicket, error: LyricsError },
}
