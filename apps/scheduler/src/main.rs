use std::time::Duration;

use dotenv::dotenv;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reminder_cell::{ReminderScanService, ScanOutcome};
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting barbershop reminder scheduler");

    let config = AppConfig::from_env();
    let scan_interval = config.scan_interval_seconds;
    let scanner = ReminderScanService::new(&config);

    let mut ticker = interval(Duration::from_secs(scan_interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Running reminder scan every {} seconds", scan_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scanner.run_scan().await {
                    Ok(ScanOutcome::Completed(report)) => {
                        if !report.errors.is_empty() {
                            warn!(
                                "Scan finished with {} errors: {:?}",
                                report.errors.len(),
                                report.errors
                            );
                        }
                    }
                    Ok(ScanOutcome::Skipped) => {
                        // Another instance held the scan lease; nothing to do.
                    }
                    Err(e) => error!("Reminder scan failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping scheduler");
                break;
            }
        }
    }
}
