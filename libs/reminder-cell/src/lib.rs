pub mod models;
pub mod services;

pub use models::{
    Notification, NotificationKind, NotifierError, ReminderError, ScanOutcome, ScanReport,
};
pub use services::notifier::{Notifier, WebhookNotifier};
pub use services::scan_lock::ScanLockService;
pub use services::scanner::ReminderScanService;
