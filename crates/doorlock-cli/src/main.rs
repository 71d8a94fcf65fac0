//! doorlock - interactive two-factor door simulator
//!
//! Runs the access controller against mock peripherals. Keys, cards and
//! motion are entered on stdin; see `help` at the prompt. Logs go to stderr.

mod console;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use doorlock_controller::{AccessController, ControllerStatus, Runner};
use doorlock_core::DoorlockConfig;
use doorlock_hardware::mock::{MockNotifier, mock_door_with_notifier};

/// Two-factor (PIN + RFID) door lock simulator
#[derive(Parser, Debug)]
#[command(name = "doorlock")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file (identities and timing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with the companion module offline; `ready` brings it up
    #[arg(long)]
    wait_companion: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => DoorlockConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DoorlockConfig::default(),
    };

    let notifier = if args.wait_companion {
        MockNotifier::offline()
    } else {
        MockNotifier::new()
    };
    let (door, handle) = mock_door_with_notifier(notifier);

    let mut controller = AccessController::builder(door)
        .with_registry(config.registry())
        .with_config(config.access.clone())
        .build()
        .context("invalid access configuration")?;

    let cancel = CancellationToken::new();
    let (status_tx, status_rx) = watch::channel(ControllerStatus::default());

    tokio::spawn(console::run(handle, status_rx, cancel.clone()));

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                on_signal.cancel();
            }
            Err(e) => warn!("Cannot listen for interrupt: {}", e),
        }
    });

    let summary = Runner::new(cancel)
        .with_status(status_tx)
        .run(&mut controller)
        .await?;

    info!(
        "Stopped after {} polls ({} transitions, {} rejections)",
        summary.polls, summary.transitions, summary.rejections
    );
    Ok(())
}
