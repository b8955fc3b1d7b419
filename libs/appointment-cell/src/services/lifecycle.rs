use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Guards the appointment state machine: pending -> confirmed -> cancelled,
/// with cancellation allowed from either live state.
pub struct LifecycleService;

impl LifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => {
                vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Cancelled],
            // Terminal state.
            AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(&next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current,
                to: next,
            });
        }
        Ok(())
    }

    /// Reschedules only make sense while the appointment is live.
    pub fn can_reschedule(&self, current: AppointmentStatus) -> Result<(), AppointmentError> {
        match current {
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => Ok(()),
            AppointmentStatus::Cancelled => Err(AppointmentError::InvalidStatusTransition {
                from: current,
                to: current,
            }),
        }
    }
}

impl Default for LifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
