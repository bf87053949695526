use tracing::{debug, warn};

use shared_models::AppointmentStatus;

use crate::models::BookingError;

/// Validate that a status transition is allowed by the appointment state
/// machine. Cancelled and completed are terminal.
pub fn validate_status_transition(
    current: AppointmentStatus,
    new: AppointmentStatus,
) -> Result<(), BookingError> {
    debug!("Validating status transition {} -> {}", current, new);

    if !valid_transitions(current).contains(&new) {
        warn!("Invalid status transition attempted: {} -> {}", current, new);
        return Err(BookingError::InvalidTransition(current));
    }

    Ok(())
}

pub fn valid_transitions(current: AppointmentStatus) -> Vec<AppointmentStatus> {
    match current {
        AppointmentStatus::Pending => vec![
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ],
        AppointmentStatus::Confirmed => vec![
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ],
        AppointmentStatus::Cancelled | AppointmentStatus::Completed => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn active_statuses_can_close() {
        assert!(validate_status_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed
        )
        .is_ok());
        assert!(validate_status_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled
        )
        .is_ok());
        assert!(validate_status_transition(
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed
        )
        .is_ok());
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for terminal in [AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
            for next in [
                AppointmentStatus::Pending,
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ] {
                assert_matches!(
                    validate_status_transition(terminal, next),
                    Err(BookingError::InvalidTransition(_))
                );
            }
        }
    }

    #[test]
    fn confirmed_cannot_go_back_to_pending() {
        assert_matches!(
            validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Pending),
            Err(BookingError::InvalidTransition(_))
        );
    }
}
