use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StorageClient, StorageError};
use shared_models::{Appointment, DayOfWeek, WeeklySchedule};

use crate::models::{AvailabilityError, DayAvailability};

pub struct AvailabilityService {
    storage: Arc<StorageClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            storage: Arc::new(StorageClient::new(config)),
        }
    }

    pub fn with_storage(storage: Arc<StorageClient>) -> Self {
        Self { storage }
    }

    /// Compute free vs booked slots for a barber on a date.
    ///
    /// The weekday template is the source of truth for what is offered; the
    /// ledger decides what is taken. An occupied slot that has dropped out of
    /// the template (schedule edited after booking) still blocks that booking
    /// but is not reported, since it is no longer offered.
    pub async fn get_availability(
        &self,
        barber_id: Uuid,
        date: NaiveDate,
    ) -> Result<DayAvailability, AvailabilityError> {
        let day_of_week = DayOfWeek::for_date(date);
        debug!("Resolving availability for barber {} on {} ({})", barber_id, date, day_of_week);

        let schedule = self
            .get_active_schedule(barber_id, day_of_week)
            .await?
            .ok_or(AvailabilityError::NotFound)?;

        let appointments = self.list_day_appointments(barber_id, date).await?;

        let occupied: HashSet<&str> = appointments
            .iter()
            .filter(|apt| apt.occupies_slot())
            .map(|apt| apt.time_slot.as_str())
            .collect();

        let mut available_slots = Vec::new();
        let mut booked_slots = Vec::new();
        for slot in &schedule.time_slots {
            if occupied.contains(slot.as_str()) {
                booked_slots.push(slot.clone());
            } else {
                available_slots.push(slot.clone());
            }
        }

        Ok(DayAvailability {
            barber_id,
            date,
            available_slots,
            booked_slots,
        })
    }

    /// Availability for the seven days starting at `from`. Days without an
    /// active template are skipped rather than reported as errors.
    pub async fn get_week_availability(
        &self,
        barber_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<DayAvailability>, AvailabilityError> {
        let mut days = Vec::new();

        for offset in 0..7 {
            let date = from + Duration::days(offset);
            match self.get_availability(barber_id, date).await {
                Ok(day) => days.push(day),
                Err(AvailabilityError::NotFound) => {
                    debug!("Barber {} has no active schedule on {}", barber_id, date);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(days)
    }

    /// Active weekday template for a barber, if one exists.
    pub async fn get_active_schedule(
        &self,
        barber_id: Uuid,
        day_of_week: DayOfWeek,
    ) -> Result<Option<WeeklySchedule>, StorageError> {
        let path = format!(
            "/rest/v1/weekly_schedules?barber_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&limit=1",
            barber_id, day_of_week
        );

        let result: Vec<Value> = self.storage.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => {
                let schedule: WeeklySchedule = serde_json::from_value(row)
                    .map_err(|e| StorageError::Malformed(format!("weekly schedule row: {}", e)))?;
                Ok(Some(schedule))
            }
            None => Ok(None),
        }
    }

    async fn list_day_appointments(
        &self,
        barber_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError> {
        let path = format!(
            "/rest/v1/appointments?barber_id=eq.{}&date=eq.{}&status=neq.cancelled&order=time_slot.asc",
            barber_id, date
        );

        let result: Vec<Value> = self.storage.request(Method::GET, &path, None).await?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| StorageError::Malformed(format!("appointment rows: {}", e)))?;

        for apt in &appointments {
            if apt.start_at().is_none() {
                warn!("Appointment {} carries malformed slot label {:?}", apt.id, apt.time_slot);
            }
        }

        Ok(appointments)
    }
}
