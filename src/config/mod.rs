use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lyrics::LrclibClient;

/// Shortest interval the runtime will accept for any timer.
const MIN_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lyrics: LyricsConfig,
    pub player: PlayerConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// LRCLIB API root; lookups go to `{base_url}/get`.
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Scriptable application to follow.
    pub app_name: String,
    pub poll_interval_ms: u64,
    pub tick_interval_ms: u64,
    /// Delay before re-polling after a transport command.
    pub command_refresh_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Prefix printed lines with their `[mm:ss.xx]` tag.
    pub show_timestamps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            base_url: LrclibClient::DEFAULT_BASE_URL.to_string(),
            user_agent: LrclibClient::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            app_name: "Spotify".to_string(),
            poll_interval_ms: 2000,
            tick_interval_ms: 100,
            command_refresh_ms: 100,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    pub fn poll_interval(&self) -> Duration {
        clamp_interval(self.poll_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        clamp_interval(self.tick_interval_ms)
    }

    pub fn command_refresh(&self) -> Duration {
        clamp_interval(self.command_refresh_ms)
    }
}

fn clamp_interval(ms: u64) -> Duration {
    Duration::from_millis(ms.max(MIN_INTERVAL_MS))
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "auralyrics", "auralyrics").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the config, writing the defaults out first if the file is missing.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path)).context("write default config")?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("auralyrics-test-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.lyrics.base_url, "https://lrclib.net/api");
        assert_eq!(cfg.player.app_name, "Spotify");
        assert_eq!(cfg.player.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.player.tick_interval(), Duration::from_millis(100));
        assert!(!cfg.display.show_timestamps);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[player]
tick_interval_ms = 0

[display]
show_timestamps = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.player.tick_interval(), Duration::from_millis(MIN_INTERVAL_MS));
        assert_eq!(cfg.player.poll_interval_ms, 2000);
        assert!(cfg.display.show_timestamps);
        assert_eq!(cfg.lyrics, LyricsConfig::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let path = scratch_path("create");
        let _ = fs::remove_file(&path);

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut edited = cfg.clone();
        edited.player.app_name = "Music".into();
        save(&edited, Some(&path)).unwrap();
        assert_eq!(load(Some(&path)).unwrap(), edited);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let path = scratch_path("bad");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[player\npoll_interval_ms = ").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
