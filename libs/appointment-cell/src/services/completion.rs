// libs/appointment-cell/src/services/completion.rs
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_models::auth::{Actor, Role};

use crate::models::{Appointment, AppointmentError};
use crate::store::{CompletionOutcome, SchedulingStore};

pub struct CompletionService {
    store: Arc<dyn SchedulingStore>,
}

impl CompletionService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Marks an appointment completed. Only the treating practitioner may do
    /// this, and never on a cancelled appointment.
    #[instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if !actor.is(Role::Practitioner, appointment.doctor_id) {
            return Err(AppointmentError::Forbidden(
                "Only the treating doctor can complete this appointment".to_string(),
            ));
        }
        if appointment.cancelled {
            return Err(AppointmentError::AppointmentCancelled);
        }
        if appointment.is_completed {
            return Err(AppointmentError::AlreadyCompleted);
        }

        match self.store.mark_completed(appointment_id).await? {
            CompletionOutcome::Completed => {}
            CompletionOutcome::AlreadyCompleted => return Err(AppointmentError::AlreadyCompleted),
            CompletionOutcome::Cancelled => {
                warn!("Appointment {} was cancelled before completion committed", appointment_id);
                return Err(AppointmentError::AppointmentCancelled);
            }
        }

        info!("Appointment {} completed", appointment_id);
        appointment.is_completed = true;
        Ok(appointment)
    }
}
