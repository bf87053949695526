use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use schedule_cell::AvailabilityService;
use shared_config::AppConfig;
use shared_database::{StorageClient, StorageError};
use shared_models::{parse_slot_label, Appointment, AppointmentStatus, DayOfWeek};
use reminder_cell::{Notification, NotificationKind, Notifier, WebhookNotifier};

use crate::models::{BookAppointmentRequest, BookingError, RescheduleAppointmentRequest};
use crate::services::{lifecycle, policy};

pub struct BookingService {
    storage: Arc<StorageClient>,
    availability: AvailabilityService,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let storage = Arc::new(StorageClient::new(config));
        Self {
            availability: AvailabilityService::with_storage(Arc::clone(&storage)),
            notifier: Arc::new(WebhookNotifier::new(config)),
            storage,
        }
    }

    pub fn with_parts(storage: Arc<StorageClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            availability: AvailabilityService::with_storage(Arc::clone(&storage)),
            storage,
            notifier,
        }
    }

    /// Book a slot for a customer.
    ///
    /// The template check is advisory; the insert itself is the authority on
    /// occupancy. Storage keeps a uniqueness constraint over active-status
    /// (barber_id, date, time_slot) rows, so of N concurrent attempts on one
    /// triple exactly one insert lands and the rest surface as `SlotTaken`.
    #[instrument(skip(self, request), fields(barber_id = %request.barber_id))]
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking appointment for customer {} with barber {} on {} {}",
            request.customer_id, request.barber_id, request.date, request.time_slot
        );

        self.validate_slot_in_template(request.barber_id, request.date, &request.time_slot)
            .await?;

        let now = Utc::now();
        let appointment_data = json!({
            "customer_id": request.customer_id,
            "barber_id": request.barber_id,
            "service_id": request.service_id,
            "date": request.date.to_string(),
            "time_slot": request.time_slot,
            "status": AppointmentStatus::Pending.to_string(),
            "reschedule_count": 0,
            "notes": request.notes,
            "reminder_upcoming_sent_at": null,
            "reminder_day_before_sent_at": null,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<Value> = self
            .storage
            .insert_returning("/rest/v1/appointments", appointment_data)
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => {
                    warn!(
                        "Slot {} {} already held for barber {}",
                        request.date, request.time_slot, request.barber_id
                    );
                    BookingError::SlotTaken
                }
                other => BookingError::Storage(other),
            })?;

        let appointment = parse_single_appointment(rows)?;

        // The booking is committed; confirmation delivery is best-effort.
        let notification =
            Notification::for_appointment(NotificationKind::BookingConfirmed, &appointment);
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!("Booking confirmation for {} not delivered: {}", appointment.id, e);
        }

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Move an eligible appointment to a new slot.
    ///
    /// Eligibility is evaluated against the customer's full appointment set,
    /// then the move is applied as a guarded update: the PATCH filter pins the
    /// reschedule count and active status we read, so a concurrent mutation
    /// makes the update match nothing instead of clobbering it, and the
    /// occupancy constraint rejects a newly-taken slot without touching the
    /// row.
    #[instrument(skip(self, request))]
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(appointment_id).await?;

        let customer_appointments = self
            .list_customer_appointments(appointment.customer_id)
            .await?;
        policy::check_reschedule_eligibility(&appointment, &customer_appointments, Utc::now())
            .map_err(BookingError::NotEligible)?;

        self.validate_slot_in_template(
            appointment.barber_id,
            request.new_date,
            &request.new_time_slot,
        )
        .await?;

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&reschedule_count=eq.{}&status=in.(pending,confirmed)",
            appointment_id, appointment.reschedule_count
        );
        let patch = json!({
            "date": request.new_date.to_string(),
            "time_slot": request.new_time_slot,
            "reschedule_count": appointment.reschedule_count + 1,
            "reminder_upcoming_sent_at": null,
            "reminder_day_before_sent_at": null,
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .storage
            .update_returning(&path, patch)
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => BookingError::SlotTaken,
                other => BookingError::Storage(other),
            })?;

        if rows.is_empty() {
            // The row moved under us; re-read so the caller gets the real
            // reason rather than a generic failure.
            return Err(self.explain_lost_reschedule(appointment_id).await);
        }

        let updated = parse_single_appointment(rows)?;

        let notification = Notification::for_appointment(NotificationKind::Rescheduled, &updated);
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!("Reschedule notice for {} not delivered: {}", updated.id, e);
        }

        info!(
            "Appointment {} rescheduled to {} {}",
            updated.id, updated.date, updated.time_slot
        );
        Ok(updated)
    }

    pub async fn confirm_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Confirmed).await
    }

    pub async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Cancelled).await
    }

    pub async fn complete_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Completed).await
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        debug!("Fetching appointment {}", id);

        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self.storage.request(Method::GET, &path, None).await?;

        if rows.is_empty() {
            return Err(BookingError::NotFound);
        }

        parse_single_appointment(rows)
    }

    pub async fn list_customer_appointments(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?customer_id=eq.{}&order=date.asc,time_slot.asc",
            customer_id
        );
        let rows: Vec<Value> = self.storage.request(Method::GET, &path, None).await?;

        let appointments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| StorageError::Malformed(format!("appointment rows: {}", e)))?;

        Ok(appointments)
    }

    async fn transition(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_appointment(id).await?;
        lifecycle::validate_status_transition(appointment.status, new_status)?;

        // Filter on the status we validated so a concurrent transition cannot
        // be overwritten.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            id, appointment.status
        );
        let patch = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self.storage.update_returning(&path, patch).await?;

        if rows.is_empty() {
            let current = self.get_appointment(id).await?;
            return Err(BookingError::InvalidTransition(current.status));
        }

        let updated = parse_single_appointment(rows)?;
        info!("Appointment {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    async fn validate_slot_in_template(
        &self,
        barber_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<(), BookingError> {
        if parse_slot_label(time_slot).is_none() {
            return Err(BookingError::Validation(format!(
                "malformed time slot label: {:?}",
                time_slot
            )));
        }

        let day_of_week = DayOfWeek::for_date(date);
        let schedule = self
            .availability
            .get_active_schedule(barber_id, day_of_week)
            .await?;

        match schedule {
            Some(schedule) if schedule.contains_slot(time_slot) => Ok(()),
            _ => {
                debug!(
                    "Slot {} not in active {} template for barber {}",
                    time_slot, day_of_week, barber_id
                );
                Err(BookingError::InvalidSlot)
            }
        }
    }

    async fn explain_lost_reschedule(&self, appointment_id: Uuid) -> BookingError {
        let current = match self.get_appointment(appointment_id).await {
            Ok(current) => current,
            Err(e) => return e,
        };
        let set = match self.list_customer_appointments(current.customer_id).await {
            Ok(set) => set,
            Err(e) => return e,
        };

        match policy::check_reschedule_eligibility(&current, &set, Utc::now()) {
            Err(reason) => BookingError::NotEligible(reason),
            Ok(()) => BookingError::Storage(StorageError::Unavailable(
                "appointment changed concurrently, retry".to_string(),
            )),
        }
    }
}

fn parse_single_appointment(rows: Vec<Value>) -> Result<Appointment, BookingError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StorageError::Malformed("empty appointment result".to_string()))?;

    let appointment: Appointment = serde_json::from_value(row)
        .map_err(|e| StorageError::Malformed(format!("appointment row: {}", e)))?;

    Ok(appointment)
}
