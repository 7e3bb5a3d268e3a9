//! trend-send - Background daemon for scheduled posting
//!
//! Monitors the plan and publishes items whose time slot has passed.

use clap::Parser;
use libtrendcast::platforms::mock::MockPlatform;
use libtrendcast::platforms::telegram::TelegramPlatform;
use libtrendcast::platforms::Platform;
use libtrendcast::{Config, Database, Dedup, HhMm, Poster, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "trend-send")]
#[command(version)]
#[command(about = "Background daemon for scheduled posting")]
#[command(long_about = "\
trend-send - Background daemon for scheduled posting

DESCRIPTION:
    trend-send is a long-running daemon that watches the Trendcast plan
    and publishes every item whose HH:MM slot has passed.

    It polls the database at regular intervals, publishes due items to
    all configured platforms, skips posts that duplicate something
    published within the dedup window, and marks published items done.

USAGE:
    # Run in foreground (logs to stderr)
    trend-send

    # Run with custom poll interval
    trend-send --poll-interval 30s

    # Publish to a mock platform instead of the real ones
    trend-send --dry-run --once

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes current batch)

CONFIGURATION:
    Configuration file: ~/.config/trendcast/config.toml
    Database location: ~/.local/share/trendcast/plan.db

    [telegram]
    enabled = true
    chat = \"@your_channel\"
    token_env = \"TRENDCAST_TELEGRAM_TOKEN\"

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Authentication or configuration error

For more information, visit: https://github.com/trendcast/trendcast
")]
struct Cli {
    /// How often to check for due items (e.g. 60s, 5m)
    #[arg(long, value_name = "DURATION", default_value = "60s")]
    #[arg(value_parser = humantime::parse_duration)]
    poll_interval: Duration,

    /// Queue owner; defaults to [defaults].user_id from the config
    #[arg(short, long)]
    user: Option<i64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Process due items once and exit (for testing)
    #[arg(long, hide = true)]
    once: bool,

    /// Publish to a mock platform instead of the configured ones
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libtrendcast::logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let dedup = Dedup::with_window(db.clone(), config.defaults.dedup_window_days);
    let user_id = cli.user.unwrap_or(config.defaults.user_id);

    info!("trend-send daemon starting");

    let platforms = build_platforms(&config, cli.dry_run);
    let mut poster = Poster::new(db, dedup, platforms);
    poster.authenticate_all().await?;

    if poster.configured_platforms().is_empty() {
        return Err(libtrendcast::TrendcastError::InvalidInput(
            "No platforms are configured; nothing to publish to".to_string(),
        ));
    }
    info!("Publishing to: {}", poster.configured_platforms().join(", "));

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    info!("Poll interval: {}s", cli.poll_interval.as_secs());

    if cli.once {
        process_once(&poster, &config, user_id).await?;
        info!("trend-send: processed due items once, exiting");
    } else {
        run_daemon_loop(&poster, &config, user_id, cli.poll_interval, shutdown).await?;
    }

    info!("trend-send daemon stopped");
    Ok(())
}

/// Build the platform list from configuration
fn build_platforms(config: &Config, dry_run: bool) -> Vec<Box<dyn Platform>> {
    if dry_run {
        info!("Dry run: publishing to a mock platform");
        return vec![Box::new(MockPlatform::success("dry-run"))];
    }

    let mut platforms: Vec<Box<dyn Platform>> = Vec::new();
    if let Some(telegram) = &config.telegram {
        platforms.push(Box::new(TelegramPlatform::new(telegram)));
    }
    platforms
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libtrendcast::TrendcastError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    let shutdown_clone = shutdown.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown_clone.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) -> Result<()> {
    Ok(())
}

/// Main daemon loop
async fn run_daemon_loop(
    poster: &Poster,
    config: &Config,
    user_id: i64,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        if let Err(e) = process_once(poster, config, user_id).await {
            error!("Error publishing due items: {}", e);
        }

        // Sleep until next poll (check shutdown every second)
        for _ in 0..poll_interval.as_secs().max(1) {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    Ok(())
}

/// Publish everything due at the current time slot
async fn process_once(poster: &Poster, config: &Config, user_id: i64) -> Result<()> {
    let slot = HhMm::now_with_offset(config.defaults.utc_offset_minutes);
    let outcomes = poster.process_due(user_id, &slot).await?;

    for outcome in &outcomes {
        if outcome.skipped_duplicate {
            info!(item_id = outcome.item_id, "Skipped duplicate item");
        } else if outcome.any_success() {
            info!(item_id = outcome.item_id, "Published item");
        } else {
            error!(item_id = outcome.item_id, "Item failed on every platform");
        }
    }

    Ok(())
}
