// libs/appointment-cell/src/services/release.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_models::auth::{Actor, Role};

use crate::models::{Appointment, AppointmentError, SchedulingConfig};
use crate::services::backoff;
use crate::store::{ReleaseWrite, SchedulingStore, StoreError};

/// Cancellation for all three actors. The `cancelled` flip and the ledger
/// removal commit together.
pub struct ReleaseService {
    store: Arc<dyn SchedulingStore>,
    config: SchedulingConfig,
}

impl ReleaseService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.subject, role = %actor.role))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;
        authorize(&appointment, actor)?;

        for attempt in 1..=self.config.max_attempts {
            if appointment.cancelled {
                return Err(AppointmentError::AlreadyCancelled);
            }

            let practitioner = self
                .store
                .practitioner(appointment.doctor_id)
                .await?
                .ok_or(AppointmentError::PractitionerNotFound)?;

            let mut slots_booked = practitioner.slots_booked.clone();
            if !slots_booked.release(appointment.slot_date, &appointment.slot_time) {
                warn!(
                    "Slot {} {} was not in doctor {} ledger while cancelling {}",
                    appointment.slot_date, appointment.slot_time, practitioner.id, appointment_id
                );
            }

            let write = ReleaseWrite {
                appointment_id,
                practitioner_id: practitioner.id,
                expected_version: practitioner.version,
                slots_booked,
            };

            match self.store.commit_release(write).await {
                Ok(()) => {
                    info!("Cancelled appointment {} by {}", appointment_id, actor.role);
                    appointment.cancelled = true;
                    return Ok(appointment);
                }
                Err(StoreError::VersionConflict(_)) => {
                    debug!("Release of {} lost a version race on attempt {}", appointment_id, attempt);
                    if attempt < self.config.max_attempts {
                        backoff(&self.config, practitioner.id, attempt).await;
                    }
                    appointment = self.load(appointment_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if appointment.cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }
        Err(AppointmentError::ConcurrentWrite {
            attempts: self.config.max_attempts,
        })
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }
}

fn authorize(appointment: &Appointment, actor: &Actor) -> Result<(), AppointmentError> {
    let allowed = match actor.role {
        Role::Admin => true,
        Role::Patient => actor.is(Role::Patient, appointment.patient_id),
        Role::Practitioner => actor.is(Role::Practitioner, appointment.doctor_id),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppointmentError::Forbidden(
            "Not allowed to cancel this appointment".to_string(),
        ))
    }
}
