#![forbid(unsafe_code)]

//! `dormicast-ctl`: manual companion for the `dormicast` agent.
//!
//! Interactive search-and-play, one-shot playback, one-shot sync, and a
//! look at the cached schedule. Shares the process supervisor with the
//! agent but never its session state.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dormicast::agent::{Clock, SystemClock};
use dormicast::config::GlobalConfig;
use dormicast::deps::check_dependencies;
use dormicast::models::session::PlaybackOutcome;
use dormicast::models::track::Track;
use dormicast::playback::player::MpvCommand;
use dormicast::playback::supervisor::ProcessSupervisor;
use dormicast::playback::window::is_inside_window;
use dormicast::prompt::next_line_or_interrupt;
use dormicast::search::search_tracks;
use dormicast::sync::cache::JsonCache;
use dormicast::sync::client::HttpCatalogClient;
use dormicast::sync::sync_once;
use dormicast::{AppError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "dormicast-ctl",
    about = "Manual search, playback, and cache tools for dormicast",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search interactively and play a chosen result (default).
    Search,

    /// Play a single track by source id.
    Play {
        /// Source id, e.g. a video identifier.
        id: String,
    },

    /// Refresh the cached catalog and schedule once.
    Sync,

    /// Show the cached schedule and whether the window is open now.
    Status,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = GlobalConfig::load_or_default(&args.config);

    match args.command.unwrap_or(Command::Search) {
        Command::Search => {
            check_dependencies(&config).await?;
            interactive(&config).await
        }
        Command::Play { id } => {
            check_dependencies(&config).await?;
            let supervisor = supervisor(&config);
            play_until_interrupted(&supervisor, &Track::new(id.clone(), id)).await;
            Ok(())
        }
        Command::Sync => {
            let client = HttpCatalogClient::new(&config.api)?;
            let cache = JsonCache::new(config.data_dir.clone());
            let summary = sync_once(&client, &cache).await?;
            println!(
                "Cached {} song(s) and {} schedule(s) in {}",
                summary.songs,
                summary.schedules,
                cache.dir().display()
            );
            Ok(())
        }
        Command::Status => status(&config),
    }
}

fn supervisor(config: &GlobalConfig) -> ProcessSupervisor {
    let player = Arc::new(MpvCommand::new(&config.player, &config.resolver));
    ProcessSupervisor::new(player, config.player.stop_grace())
}

async fn interactive(config: &GlobalConfig) -> Result<()> {
    let supervisor = supervisor(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(query) = prompt(&mut lines, "Enter a song to search (or \"quit\" to exit): ").await?
        else {
            break;
        };
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        let results = match search_tracks(
            &config.resolver.ytdlp_path,
            &query,
            config.resolver.search_results,
        )
        .await
        {
            Ok(results) => results,
            Err(err) => {
                eprintln!("Search failed: {err}");
                continue;
            }
        };
        if results.is_empty() {
            println!("No results found.");
            continue;
        }

        println!("Search results:");
        for (index, track) in results.iter().enumerate() {
            println!("{}. {}", index + 1, track.title);
        }

        let Some(choice) = prompt(&mut lines, "Enter the number of the song to play: ").await?
        else {
            break;
        };
        let selected = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| results.get(index));

        match selected {
            Some(track) => play_until_interrupted(&supervisor, track).await,
            None => println!("Invalid choice."),
        }
    }

    Ok(())
}

/// `None` on end of input or Ctrl-C.
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    let line = next_line_or_interrupt(lines, tokio::signal::ctrl_c()).await?;
    if line.is_none() {
        println!();
    }
    Ok(line)
}

/// Play one track; Ctrl-C stops the player, not the program.
async fn play_until_interrupted(supervisor: &ProcessSupervisor, track: &Track) {
    println!("Playing: {}", track.title);
    let stop = CancellationToken::new();
    let play = supervisor.play(track, &stop);
    tokio::pin!(play);

    let finished = tokio::select! {
        outcome = &mut play => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            stop.cancel();
            play.await
        }
    };

    match outcome {
        Ok(PlaybackOutcome::Completed) => println!("Finished: {}", track.title),
        Ok(PlaybackOutcome::Failed(code)) => {
            eprintln!("Playback failed (exit code {code:?})");
        }
        Ok(PlaybackOutcome::Cancelled) => println!("Playback stopped."),
        Err(err) => eprintln!("Could not start player: {err}"),
    }
}

fn status(config: &GlobalConfig) -> Result<()> {
    let cache = JsonCache::new(config.data_dir.clone());
    let schedule = cache.load_schedule()?;
    let tracks = cache.load_tracks()?;
    let now = SystemClock.now();

    match &schedule {
        Some(window) => {
            let days: Vec<String> = window.days_of_week.iter().map(ToString::to_string).collect();
            println!(
                "Window: {:02}:{:02}:{:02} for {}s on {}",
                window.start_seconds / 3600,
                window.start_seconds / 60 % 60,
                window.start_seconds % 60,
                window.duration_seconds,
                if days.is_empty() { "every day".to_owned() } else { days.join(", ") }
            );
        }
        None => println!("Window: none cached"),
    }
    println!("Playable tracks: {}", tracks.len());
    println!(
        "Inside window now ({now}): {}",
        is_inside_window(now, schedule.as_ref())
    );
    Ok(())
}
