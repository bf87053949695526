use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::StorageError;
use shared_models::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub barber_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_time_slot: String,
}

/// Why a reschedule was refused. Carried inside `BookingError::NotEligible`
/// so callers can surface the exact clause that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleDenied {
    AppointmentClosed,
    AlreadyRescheduled,
    TooCloseToStart,
    NotNextAppointment,
}

impl fmt::Display for RescheduleDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RescheduleDenied::AppointmentClosed => {
                write!(f, "cancelled or completed appointments cannot be rescheduled")
            }
            RescheduleDenied::AlreadyRescheduled => {
                write!(f, "this appointment has already been rescheduled once")
            }
            RescheduleDenied::TooCloseToStart => {
                write!(f, "reschedules close no later than 30 minutes before the start")
            }
            RescheduleDenied::NotNextAppointment => {
                write!(f, "only your next upcoming appointment can be rescheduled")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Time slot is not offered by this barber on that weekday")]
    InvalidSlot,

    #[error("Slot no longer available")]
    SlotTaken,

    #[error("Reschedule not permitted: {0}")]
    NotEligible(RescheduleDenied),

    #[error("Appointment cannot change state from {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
