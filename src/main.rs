use anyhow::Context;

use reader_housekeeper::config::Config;
use reader_housekeeper::db::Repository;
use reader_housekeeper::events::EventBus;
use reader_housekeeper::models::CleanupLevel;
use reader_housekeeper::services::{Housekeeper, NavigationStateController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (stderr so scripted callers can parse stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for --deep flag (full clear instead of routine maintenance)
    let level = if args.iter().any(|arg| arg == "--deep") {
        CleanupLevel::High
    } else {
        CleanupLevel::Low
    };

    let config = Config::load().context("loading configuration")?;
    let repository = Repository::new(&config.db_path)
        .await
        .with_context(|| format!("opening database at {}", config.db_path))?;

    let events = EventBus::new();
    let navigation = NavigationStateController::new();
    let housekeeper = Housekeeper::with_retention_days(events, config.feed_retention_days);

    let deleted = housekeeper
        .perform_housekeeping(&repository, &navigation, level)
        .await
        .context("housekeeping pass failed")?;

    println!("Deleted {} stale articles", deleted.len());

    Ok(())
}
