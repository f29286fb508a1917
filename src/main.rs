#![forbid(unsafe_code)]

//! `dormicast`: scheduled audio-playback agent binary.
//!
//! Loads configuration, verifies the external tools, then runs the
//! sync-and-launch and stop-watchdog ticks until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dormicast::agent::{Agent, SystemClock, TickIntervals};
use dormicast::config::GlobalConfig;
use dormicast::deps::check_dependencies;
use dormicast::playback::controller::SessionController;
use dormicast::playback::player::MpvCommand;
use dormicast::playback::supervisor::ProcessSupervisor;
use dormicast::sync::cache::JsonCache;
use dormicast::sync::client::HttpCatalogClient;
use dormicast::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dormicast", about = "Scheduled audio-playback agent", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the cache directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("dormicast agent bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_or_default(&args.config);
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    info!(data_dir = %config.data_dir.display(), "configuration ready");

    // ── Verify external tools ───────────────────────────
    if let Err(err) = check_dependencies(&config).await {
        error!(%err, "required external tools are missing; install yt-dlp and mpv or fix the configured paths");
        return Err(err);
    }

    // ── Build the playback core ─────────────────────────
    let player = Arc::new(MpvCommand::new(&config.player, &config.resolver));
    let supervisor = Arc::new(ProcessSupervisor::new(player, config.player.stop_grace()));
    let controller = SessionController::new(supervisor);

    let source = Arc::new(HttpCatalogClient::new(&config.api)?);
    let cache = JsonCache::new(config.data_dir.clone());
    let agent = Arc::new(Agent::new(
        source,
        cache,
        controller,
        Arc::new(SystemClock),
        TickIntervals::from(&config),
    ));

    // ── Run until a shutdown signal ─────────────────────
    let ct = CancellationToken::new();
    let agent_handle = tokio::spawn(Arc::clone(&agent).run(ct.clone()));
    info!(api = config.api.base_url, "agent ready");

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = agent_handle.await {
        error!(%err, "agent loop ended abnormally");
    }
    info!("dormicast shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
