use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use shared_models::Appointment;

use crate::models::RescheduleDenied;

/// Reschedules close this long before the appointment starts. The boundary is
/// exclusive: an appointment exactly 30 minutes out is no longer movable.
pub const MIN_RESCHEDULE_NOTICE_MINUTES: i64 = 30;

/// Evaluate the reschedule eligibility clauses in order and report the first
/// one that fails.
///
/// `customer_appointments` must hold every appointment of the same customer;
/// clause 4 (only the nearest upcoming appointment may move) is meaningless
/// over a partial set.
pub fn check_reschedule_eligibility(
    appointment: &Appointment,
    customer_appointments: &[Appointment],
    now: DateTime<Utc>,
) -> Result<(), RescheduleDenied> {
    if !appointment.status.is_active() {
        return Err(RescheduleDenied::AppointmentClosed);
    }

    if appointment.reschedule_count >= 1 {
        return Err(RescheduleDenied::AlreadyRescheduled);
    }

    let start = appointment.start_at().ok_or(RescheduleDenied::AppointmentClosed)?;
    if start - now <= Duration::minutes(MIN_RESCHEDULE_NOTICE_MINUTES) {
        return Err(RescheduleDenied::TooCloseToStart);
    }

    match next_upcoming_appointment(customer_appointments, now) {
        Some(next) if next.id == appointment.id => Ok(()),
        Some(next) => {
            debug!(
                "Appointment {} is not the customer's next upcoming ({} is)",
                appointment.id, next.id
            );
            Err(RescheduleDenied::NotNextAppointment)
        }
        None => Err(RescheduleDenied::NotNextAppointment),
    }
}

/// The customer's earliest-starting active appointment that has not started
/// yet. Ties break by date then slot label, which sorts "HH:MM" strings
/// chronologically.
pub fn next_upcoming_appointment<'a>(
    appointments: &'a [Appointment],
    now: DateTime<Utc>,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .filter(|apt| apt.status.is_active())
        .filter(|apt| apt.start_at().map(|start| start > now).unwrap_or(false))
        .min_by(|a, b| {
            (a.date, a.time_slot.as_str()).cmp(&(b.date, b.time_slot.as_str()))
        })
}
