use super::{PlayerBackend, TransportCommand};
use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

/// Drives a scriptable player (Spotify by default) through `osascript`.
#[derive(Debug, Clone)]
pub struct OsascriptPlayer {
    app_name: String,
}

impl OsascriptPlayer {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Fetches name, artist, album, duration, position, state and artwork url
    /// in one round trip.
    fn poll_script(&self) -> String {
        format!(
            r#"tell application "{app}"
    if it is running then
        try
            set t to current track
            set tName to name of t
            set tArtist to artist of t
            set tAlbum to album of t
            set tDuration to duration of t
            set tArtwork to artwork url of t
            set pState to player state
            set pPosition to player position
            return tName & "|||" & tArtist & "|||" & tAlbum & "|||" & tDuration & "|||" & pPosition & "|||" & pState & "|||" & tArtwork
        on error
            return "ERROR"
        end try
    else
        return "NOT_RUNNING"
    end if
end tell"#,
            app = self.app_name
        )
    }

    fn command_script(&self, cmd: TransportCommand) -> String {
        let verb = match cmd {
            TransportCommand::Next => "next track",
            TransportCommand::Previous => "previous track",
            TransportCommand::PlayPause => "playpause",
        };
        format!(r#"tell application "{}" to {verb}"#, self.app_name)
    }

    async fn run_script(&self, script: &str) -> anyhow::Result<String> {
        let out = Command::new("osascript")
            .args(["-e", script])
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .context("run osascript")?;
        if !out.status.success() {
            anyhow::bail!(
                "osascript exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim_end().to_string())
    }
}

#[async_trait]
impl PlayerBackend for OsascriptPlayer {
    async fn sample(&self) -> anyhow::Result<String> {
        self.run_script(&self.poll_script()).await
    }

    async fn send(&self, cmd: TransportCommand) -> anyhow::Result<()> {
        self.run_script(&self.command_script(cmd))
            .await
            .with_context(|| format!("send {cmd:?} to {}", self.app_name))?;
        Ok(())
    }
}
