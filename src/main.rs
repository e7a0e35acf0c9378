mod app;
mod config;
mod display;
mod lyrics;
mod player;

use anyhow::Context;
use app::{App, events::Event};
use clap::{Parser, Subcommand};
use lyrics::{LrclibClient, Lyrics};
use player::snapshot::{PlaybackSnapshot, RawSample};
use player::spotify::OsascriptPlayer;
use player::{PlayerBackend, TransportCommand};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "auralyrics", version, about = "Time-synced lyrics for the track playing in Spotify")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the player and print each lyric line as it becomes active (default).
    Watch,
    /// Print the player's current state once.
    Status,
    /// Look up lyrics for a track and print them (headless).
    Lyrics {
        title: String,
        artist: String,
        #[arg(long, default_value = "")]
        album: String,
        /// Track length in seconds.
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },
    /// Parse a local LRC file and print its timeline.
    Parse { path: std::path::PathBuf },
    /// Skip to the next track.
    Next,
    /// Go back to the previous track.
    Previous,
    /// Toggle play/pause.
    PlayPause,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log.level))
        .context("build log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let backend: Arc<dyn PlayerBackend> = Arc::new(OsascriptPlayer::new(&cfg.player.app_name));

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&cfg, backend).await?,
        Command::Status => print_status(backend.as_ref()).await?,
        Command::Lyrics {
            title,
            artist,
            album,
            duration,
        } => {
            let client = make_client(&cfg)?;
            let lyrics = lyrics::fetch_lyrics(&client, &title, &artist, &album, duration)
                .await
                .with_context(|| format!("fetch lyrics for {title} - {artist}"))?;
            print_lyrics(&lyrics);
        }
        Command::Parse { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            print_lyrics(&Lyrics::synced(&raw));
        }
        Command::Next => transport(&cfg, backend.as_ref(), TransportCommand::Next).await?,
        Command::Previous => transport(&cfg, backend.as_ref(), TransportCommand::Previous).await?,
        Command::PlayPause => transport(&cfg, backend.as_ref(), TransportCommand::PlayPause).await?,
    }

    Ok(())
}

fn make_client(cfg: &config::Config) -> anyhow::Result<LrclibClient> {
    LrclibClient::new(&cfg.lyrics.base_url, &cfg.lyrics.user_agent).context("create lyrics client")
}

async fn watch(cfg: &config::Config, backend: Arc<dyn PlayerBackend>) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<Event>(256);
    let mut app = App::new(make_client(cfg)?, cfg.player.tick_interval());

    let printer = tokio::spawn(display::print_lyrics(
        app.subscribe(),
        cfg.display.show_timestamps,
    ));
    let poller = player::spawn_poller(backend, cfg.player.poll_interval(), tx.clone());

    tokio::select! {
        res = app.run(rx, tx) => res?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    poller.abort();
    printer.abort();
    Ok(())
}

async fn print_status(backend: &dyn PlayerBackend) -> anyhow::Result<()> {
    let raw = backend.sample().await.context("sample player")?;
    match player::snapshot::normalize(&raw, Instant::now()) {
        RawSample::Snapshot(s) => println!("{s}"),
        RawSample::NotRunning => println!("{}", PlaybackSnapshot::not_running()),
        RawSample::TransientError | RawSample::Malformed => println!("[player] no usable state"),
    }
    Ok(())
}

/// Send a command, then re-poll once the player has had a moment to react.
async fn transport(
    cfg: &config::Config,
    backend: &dyn PlayerBackend,
    cmd: TransportCommand,
) -> anyhow::Result<()> {
    backend.send(cmd).await?;
    tokio::time::sleep(cfg.player.command_refresh()).await;
    print_status(backend).await
}

fn print_lyrics(lyrics: &Lyrics) {
    if lyrics.is_empty() {
        println!("(no lyrics)");
        return;
    }
    for line in &lyrics.lines {
        if lyrics.synced {
            println!("{}{}", display::format_timestamp(line.timestamp_secs), line.text);
        } else {
            println!("{}", line.text);
        }
    }
}
