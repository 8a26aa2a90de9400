// libs/appointment-cell/src/services/reservation.rs
use std::sync::Arc;

use tracing::{debug, info, instrument};

use shared_models::auth::{Actor, Role};

use crate::ledger::TimeLabel;
use crate::models::{
    parse_slot_date, Appointment, AppointmentError, ReserveSlotRequest, SchedulingConfig,
};
use crate::services::availability::AvailabilityGate;
use crate::services::backoff;
use crate::store::{ReservationWrite, SchedulingStore, StoreError};

/// The only writer of booked state. Each attempt reads the practitioner,
/// runs the gate against that read, and commits the ledger together with the
/// new appointment at the version it read.
pub struct ReservationCoordinator {
    store: Arc<dyn SchedulingStore>,
    config: SchedulingConfig,
}

impl ReservationCoordinator {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, actor), fields(patient = %actor.subject))]
    pub async fn reserve_slot(
        &self,
        actor: &Actor,
        request: ReserveSlotRequest,
    ) -> Result<Appointment, AppointmentError> {
        let patient_id = match (actor.role, actor.subject_id()) {
            (Role::Patient, Some(id)) => id,
            _ => {
                return Err(AppointmentError::Forbidden(
                    "Only patients can book appointments".to_string(),
                ))
            }
        };

        let slot_date = parse_slot_date(&request.slot_date)?;
        let slot_time =
            TimeLabel::parse(&request.slot_time).map_err(AppointmentError::ValidationError)?;

        let patient = self
            .store
            .patient(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;

        for attempt in 1..=self.config.max_attempts {
            let practitioner = self
                .store
                .practitioner(request.doctor_id)
                .await?
                .ok_or(AppointmentError::PractitionerNotFound)?;

            AvailabilityGate::check(&practitioner, slot_date, &slot_time)?;

            let mut slots_booked = practitioner.slots_booked.clone();
            slots_booked.reserve(slot_date, slot_time.clone());

            let appointment = Appointment::book(&patient, &practitioner, slot_date, slot_time.clone());
            debug!(
                "Reservation attempt {} for doctor {} at version {}",
                attempt, practitioner.id, practitioner.version
            );

            let write = ReservationWrite {
                practitioner_id: practitioner.id,
                expected_version: practitioner.version,
                slots_booked,
                appointment: appointment.clone(),
            };

            match self.store.commit_reservation(write).await {
                Ok(()) => {
                    info!(
                        "Booked appointment {} with doctor {} on {} at {}",
                        appointment.id, appointment.doctor_id, slot_date, appointment.slot_time
                    );
                    return Ok(appointment);
                }
                Err(StoreError::VersionConflict(_)) if attempt < self.config.max_attempts => {
                    backoff(&self.config, practitioner.id, attempt).await;
                }
                Err(StoreError::VersionConflict(_)) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppointmentError::ConcurrentWrite {
            attempts: self.config.max_attempts,
        })
    }
}
