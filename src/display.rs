//! Plain stdout rendering of the published sync state.

use crate::app::state::{Phase, SyncState};
use crate::lyrics::LineId;
use tokio::sync::watch;

/// `[mm:ss.xx]`, the LRC tag for `secs`.
pub fn format_timestamp(secs: f64) -> String {
    let centis = (secs.max(0.0) * 100.0).round() as u64;
    let min = centis / 6000;
    let sec = (centis % 6000) / 100;
    let cs = centis % 100;
    format!("[{:02}:{:02}.{:02}]", min, sec, cs)
}

/// Turns successive states into the lines worth printing.
#[derive(Debug)]
pub struct LinePrinter {
    show_timestamps: bool,
    track: Option<(String, String)>,
    phase: Phase,
    active: Option<LineId>,
}

impl LinePrinter {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            show_timestamps,
            track: None,
            phase: Phase::Idle,
            active: None,
        }
    }

    pub fn render(&mut self, state: &SyncState) -> Vec<String> {
        let mut out = Vec::new();
        let snap = &state.last_snapshot;

        let track = (!snap.is_idle()).then(|| (snap.title.clone(), snap.artist.clone()));
        let track_changed = track != self.track;
        if track_changed {
            match &track {
                Some((title, artist)) => out.push(format!("♪ {title} - {artist}")),
                None if !snap.player_available => out.push("(player not running)".into()),
                None => out.push("(nothing playing)".into()),
            }
            self.track = track;
            self.active = None;
        }

        let phase = state.phase();
        if phase != self.phase || track_changed {
            match phase {
                Phase::Idle => {}
                Phase::Loading => out.push("… loading lyrics".into()),
                Phase::Errored => {
                    if let Some(msg) = state.error_message() {
                        out.push(format!("({msg})"));
                    }
                }
                Phase::Ready if state.lyrics.is_empty() => out.push("(no lyrics)".into()),
                // untimed text has nothing to follow along with, so show all of it
                Phase::Ready if !state.synced => {
                    out.extend(state.lyrics.iter().map(|l| l.text.clone()));
                }
                Phase::Ready => {}
            }
            self.phase = phase;
        }

        if state.synced && state.active_line != self.active {
            self.active = state.active_line;
            if let Some(line) = state.active() {
                if self.show_timestamps {
                    out.push(format!("{}{}", format_timestamp(line.timestamp_secs), line.text));
                } else {
                    out.push(line.text.clone());
                }
            }
        }

        out
    }
}

/// Print state changes until the publisher goes away.
pub async fn print_lyrics(mut rx: watch::Receiver<SyncState>, show_timestamps: bool) {
    let mut printer = LinePrinter::new(show_timestamps);
    while rx.changed().await.is_ok() {
        let lines = printer.render(&rx.borrow_and_update());
        for line in lines {
            println!("{line}");
        }
    }
}
