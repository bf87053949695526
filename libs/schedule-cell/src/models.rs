use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StorageError;

/// Free vs booked slots for one barber on one date, both in the weekday
/// template's order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub barber_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
    pub booked_slots: Vec<String>,
}

impl DayAvailability {
    pub fn is_fully_booked(&self) -> bool {
        self.available_slots.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("No active schedule for this barber on that weekday")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
