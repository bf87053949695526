use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::schedule::slot_start_at;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub reschedule_count: i32,
    pub notes: Option<String>,
    pub reminder_upcoming_sent_at: Option<DateTime<Utc>>,
    pub reminder_day_before_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Absolute start of the appointment, or None when the stored slot label
    /// is malformed.
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        slot_start_at(self.date, &self.time_slot)
    }

    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn reminder_sent_at(&self, window: ReminderWindow) -> Option<DateTime<Utc>> {
        match window {
            ReminderWindow::Upcoming => self.reminder_upcoming_sent_at,
            ReminderWindow::DayBefore => self.reminder_day_before_sent_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Pending and confirmed appointments hold their slot and may still move.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Reminder lookahead windows. Each window has its own sent marker on the
/// appointment row so a reminder goes out at most once per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    Upcoming,
    DayBefore,
}

impl ReminderWindow {
    pub const ALL: [ReminderWindow; 2] = [ReminderWindow::DayBefore, ReminderWindow::Upcoming];

    pub fn lookahead(&self) -> chrono::Duration {
        match self {
            ReminderWindow::Upcoming => chrono::Duration::minutes(15),
            ReminderWindow::DayBefore => chrono::Duration::hours(24),
        }
    }

    pub fn marker_column(&self) -> &'static str {
        match self {
            ReminderWindow::Upcoming => "reminder_upcoming_sent_at",
            ReminderWindow::DayBefore => "reminder_day_before_sent_at",
        }
    }
}

impl fmt::Display for ReminderWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderWindow::Upcoming => write!(f, "upcoming"),
            ReminderWindow::DayBefore => write!(f, "day_before"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(date: NaiveDate, slot: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            barber_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date,
            time_slot: slot.to_string(),
            status,
            reschedule_count: 0,
            notes: None,
            reminder_upcoming_sent_at: None,
            reminder_day_before_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn start_at_combines_date_and_slot() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let apt = appointment(date, "10:00", AppointmentStatus::Confirmed);
        assert_eq!(
            apt.start_at().unwrap().to_rfc3339(),
            "2025-06-02T10:00:00+00:00"
        );
    }

    #[test]
    fn start_at_is_none_for_malformed_slot() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let apt = appointment(date, "half past nine", AppointmentStatus::Pending);
        assert!(apt.start_at().is_none());
    }

    #[test]
    fn cancelled_appointments_release_their_slot() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(appointment(date, "10:00", AppointmentStatus::Pending).occupies_slot());
        assert!(appointment(date, "10:00", AppointmentStatus::Completed).occupies_slot());
        assert!(!appointment(date, "10:00", AppointmentStatus::Cancelled).occupies_slot());
    }
}
