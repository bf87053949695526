use std::env;
use tracing::warn;

const DEFAULT_SCAN_INTERVAL_SECONDS: u64 = 300;
const MIN_SCAN_INTERVAL_SECONDS: u64 = 60;
const MAX_SCAN_INTERVAL_SECONDS: u64 = 900;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_url: String,
    pub storage_api_key: String,
    pub notifier_webhook_url: String,
    pub scan_interval_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            storage_url: env::var("STORAGE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORAGE_URL not set, using empty value");
                    String::new()
                }),
            storage_api_key: env::var("STORAGE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORAGE_API_KEY not set, using empty value");
                    String::new()
                }),
            notifier_webhook_url: env::var("NOTIFIER_WEBHOOK_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFIER_WEBHOOK_URL not set, using empty value");
                    String::new()
                }),
            scan_interval_seconds: env::var("REMINDER_SCAN_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Self::clamp_scan_interval)
                .unwrap_or(DEFAULT_SCAN_INTERVAL_SECONDS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.storage_url.is_empty() && !self.storage_api_key.is_empty()
    }

    pub fn is_notifier_configured(&self) -> bool {
        !self.notifier_webhook_url.is_empty()
    }

    // Scan cadence must stay within the 1-15 minute band.
    fn clamp_scan_interval(seconds: u64) -> u64 {
        seconds.clamp(MIN_SCAN_INTERVAL_SECONDS, MAX_SCAN_INTERVAL_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_interval_is_clamped_to_allowed_band() {
        assert_eq!(AppConfig::clamp_scan_interval(5), 60);
        assert_eq!(AppConfig::clamp_scan_interval(300), 300);
        assert_eq!(AppConfig::clamp_scan_interval(3600), 900);
    }
}
