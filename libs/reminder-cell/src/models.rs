use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StorageError;
use shared_models::{Appointment, ReminderWindow};

/// Payload handed to the notifier. Transport (SMS, push, email) is the
/// notifier endpoint's concern; this core only describes the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
}

impl Notification {
    pub fn for_appointment(kind: NotificationKind, appointment: &Appointment) -> Self {
        Self {
            kind,
            appointment_id: appointment.id,
            customer_id: appointment.customer_id,
            barber_id: appointment.barber_id,
            date: appointment.date,
            time_slot: appointment.time_slot.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmed,
    Rescheduled,
    ReminderUpcoming,
    ReminderDayBefore,
}

impl NotificationKind {
    pub fn for_window(window: ReminderWindow) -> Self {
        match window {
            ReminderWindow::Upcoming => NotificationKind::ReminderUpcoming,
            ReminderWindow::DayBefore => NotificationKind::ReminderDayBefore,
        }
    }
}

/// Outcome of one scan invocation. A scan that found the lock held skips
/// rather than queueing behind the running one.
#[derive(Debug)]
pub enum ScanOutcome {
    Completed(ScanReport),
    Skipped,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanReport {
    pub reminders_sent: u32,
    pub errors: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Notifier endpoint not configured")]
    NotConfigured,

    #[error("Notifier request failed: {0}")]
    Request(String),

    #[error("Notifier rejected the payload with status {status}")]
    Rejected { status: u16 },
}
