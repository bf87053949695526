use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{StorageClient, StorageError};
use shared_models::{Appointment, ReminderWindow};

use crate::models::{Notification, NotificationKind, ReminderError, ScanOutcome, ScanReport};
use crate::services::notifier::{Notifier, WebhookNotifier};
use crate::services::scan_lock::ScanLockService;

pub struct ReminderScanService {
    storage: Arc<StorageClient>,
    notifier: Arc<dyn Notifier>,
    lock: ScanLockService,
}

impl ReminderScanService {
    pub fn new(config: &AppConfig) -> Self {
        let storage = Arc::new(StorageClient::new(config));
        Self {
            lock: ScanLockService::new(Arc::clone(&storage)),
            notifier: Arc::new(WebhookNotifier::new(config)),
            storage,
        }
    }

    pub fn with_parts(storage: Arc<StorageClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lock: ScanLockService::new(Arc::clone(&storage)),
            storage,
            notifier,
        }
    }

    /// One scan pass over every reminder window.
    ///
    /// Timer ticks and manual triggers both land here; whoever finds the scan
    /// lease held skips instead of queueing. The lease is released on every
    /// exit path.
    #[instrument(skip(self))]
    pub async fn run_scan(&self) -> Result<ScanOutcome, ReminderError> {
        if !self.lock.acquire().await? {
            info!("Reminder scan already in flight, skipping this trigger");
            return Ok(ScanOutcome::Skipped);
        }

        let report = self.scan_windows(Utc::now()).await;

        if let Err(e) = self.lock.release().await {
            warn!("Scan lock release failed, lease will expire on its own: {}", e);
        }

        info!(
            "Reminder scan complete: {} sent, {} errors",
            report.reminders_sent,
            report.errors.len()
        );
        Ok(ScanOutcome::Completed(report))
    }

    async fn scan_windows(&self, now: DateTime<Utc>) -> ScanReport {
        let mut report = ScanReport::default();

        for window in ReminderWindow::ALL {
            match self.find_due_appointments(window, now).await {
                Ok(due) => {
                    debug!("{} appointments due in the {} window", due.len(), window);
                    self.dispatch_batch(window, due, now, &mut report).await;
                }
                Err(e) => {
                    // A failed window query must not starve the other window.
                    warn!("Could not query {} window: {}", window, e);
                    report.errors.push(format!("{} window query: {}", window, e));
                }
            }
        }

        report
    }

    async fn dispatch_batch(
        &self,
        window: ReminderWindow,
        due: Vec<Appointment>,
        now: DateTime<Utc>,
        report: &mut ScanReport,
    ) {
        for appointment in due {
            let notification = Notification::for_appointment(
                NotificationKind::for_window(window),
                &appointment,
            );

            match self.notifier.notify(&notification).await {
                Ok(()) => match self.mark_sent(&appointment, window, now).await {
                    Ok(true) => report.reminders_sent += 1,
                    Ok(false) => {
                        // Marker was no longer clear; another instance beat us
                        // between query and mark.
                        warn!(
                            "Appointment {} already marked for the {} window",
                            appointment.id, window
                        );
                    }
                    Err(e) => {
                        warn!(
                            "Reminder for {} delivered but marker not persisted: {}",
                            appointment.id, e
                        );
                        report
                            .errors
                            .push(format!("appointment {}: marker update: {}", appointment.id, e));
                    }
                },
                Err(e) => {
                    // Leave the marker unset so a later scan retries until the
                    // start time passes out of the window.
                    warn!("Reminder for {} not delivered: {}", appointment.id, e);
                    report
                        .errors
                        .push(format!("appointment {}: {}", appointment.id, e));
                }
            }
        }
    }

    /// Active appointments whose start falls inside [now, now + lookahead)
    /// and whose marker for this window is still clear.
    async fn find_due_appointments(
        &self,
        window: ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StorageError> {
        let horizon = now + window.lookahead();

        // Storage filters by date and marker; the exact start-instant cut is
        // done here because the start is a (date, slot label) pair.
        let path = format!(
            "/rest/v1/appointments?status=in.(pending,confirmed)&{}=is.null&date=gte.{}&date=lte.{}&order=date.asc,time_slot.asc",
            window.marker_column(),
            now.date_naive(),
            horizon.date_naive()
        );

        let rows: Vec<Value> = self.storage.request(Method::GET, &path, None).await?;

        let appointments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| StorageError::Malformed(format!("appointment rows: {}", e)))?;

        let due = appointments
            .into_iter()
            .filter(|apt| match apt.start_at() {
                Some(start) => start >= now && start < horizon,
                None => {
                    warn!(
                        "Appointment {} carries malformed slot label {:?}, skipping",
                        apt.id, apt.time_slot
                    );
                    false
                }
            })
            .collect();

        Ok(due)
    }

    /// Set the window's sent marker, guarded on it still being clear.
    /// Returns false when someone else marked it first.
    async fn mark_sent(
        &self,
        appointment: &Appointment,
        window: ReminderWindow,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&{}=is.null",
            appointment.id,
            window.marker_column()
        );

        let mut patch = serde_json::Map::new();
        patch.insert(window.marker_column().to_string(), json!(now.to_rfc3339()));
        patch.insert("updated_at".to_string(), json!(now.to_rfc3339()));

        let rows: Vec<Value> = self
            .storage
            .update_returning(&path, Value::Object(patch))
            .await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use shared_models::AppointmentStatus;
    use uuid::Uuid;

    fn appointment_at(date: NaiveDate, slot: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            barber_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date,
            time_slot: slot.to_string(),
            status: AppointmentStatus::Confirmed,
            reschedule_count: 0,
            notes: None,
            reminder_upcoming_sent_at: None,
            reminder_day_before_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn window_membership_is_half_open() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 50, 0).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let horizon = now + ReminderWindow::Upcoming.lookahead();

        let in_window = appointment_at(date, "10:00").start_at().unwrap();
        assert!(in_window >= now && in_window < horizon);

        // Exactly at the horizon falls out of this tick and into the next.
        let at_horizon = appointment_at(date, "10:05").start_at().unwrap();
        assert!(!(at_horizon < horizon));

        // Already started: past the cutoff, never retried.
        let started = appointment_at(date, "09:45").start_at().unwrap();
        assert!(started < now);
    }
}
