//! `mixdeck` — terminal control panel for a remote ALSA mixer.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `mixdeck-core`'s [`Controller`](mixdeck_core::Controller). Controls are
//! shown as a grid of cards (slider, toggle, selector) and every edit is
//! applied locally at once, then forwarded to the device when it is
//! reachable. An unreachable device drops the panel into simulation mode
//! with a demonstration dataset; `r` retries.
//!
//! Logs are written to a file (default under the platform data dir) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, configuration, tracing setup, panic
//! hooks, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mixdeck_config::Config;
use mixdeck_core::RangePolicy;

use crate::app::App;

/// Terminal control panel for a remote ALSA mixer.
#[derive(Parser, Debug)]
#[command(name = "mixdeck", version, about)]
struct Cli {
    /// Mixer host (the backend is reached at http://<host>:5000/api)
    #[arg(short = 'H', long, env = "MIXDECK_HOST")]
    host: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, env = "MIXDECK_TIMEOUT")]
    timeout: Option<u64>,

    /// How to treat backend levels outside their range
    #[arg(long, value_name = "pass-through|clamp|reject")]
    range_policy: Option<RangePolicy>,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective settings back to the config file and exit
    #[arg(long)]
    save: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// File config with CLI flags layered on top.
    fn effective_config(&self, path: &Path) -> Result<Config> {
        let mut cfg = mixdeck_config::load_config_from(path)?;
        if let Some(host) = &self.host {
            cfg.host.clone_from(host);
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout = timeout;
        }
        if let Some(policy) = self.range_policy {
            cfg.range_policy = policy;
        }
        if let Some(log_file) = &self.log_file {
            cfg.log_file = Some(log_file.clone());
        }
        Ok(cfg)
    }
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(verbose: u8, log_file: &Path) -> WorkerGuard {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mixdeck={log_level},mixdeck_core={log_level},mixdeck_api={log_level}"
        ))
    });

    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("mixdeck.log"));
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let config_path = cli.config.clone().unwrap_or_else(mixdeck_config::config_path);
    let cfg = cli.effective_config(&config_path)?;

    if cli.save {
        mixdeck_config::save_config_to(&cfg, &config_path)?;
        println!("Saved settings to {}", config_path.display());
        return Ok(());
    }

    let controller_config = mixdeck_config::to_controller_config(&cfg)?;

    // Tracing to file — hold the guard so logs flush on exit
    let log_file = cfg
        .log_file
        .clone()
        .unwrap_or_else(mixdeck_config::default_log_path);
    let _log_guard = setup_tracing(cli.verbose, &log_file);

    info!(
        host = %cfg.host,
        url = %controller_config.base_url,
        range_policy = %cfg.range_policy,
        "starting mixdeck"
    );

    let mut app = App::new(controller_config)?;
    app.run().await?;

    Ok(())
}
