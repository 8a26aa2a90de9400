// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::auth::{Actor, Role};

use crate::ledger::TimeLabel;
use crate::models::{
    AppointmentError, Practitioner, SchedulingConfig, UpdatePractitionerRequest,
};
use crate::services::backoff;
use crate::store::{PractitionerChanges, SchedulingStore, StoreError};

/// Decides whether a practitioner can take a reservation for a slot right now.
pub struct AvailabilityGate;

impl AvailabilityGate {
    pub fn check(
        practitioner: &Practitioner,
        date: NaiveDate,
        time: &TimeLabel,
    ) -> Result<(), AppointmentError> {
        if !practitioner.available {
            return Err(AppointmentError::PractitionerUnavailable);
        }
        if practitioner.slots_booked.is_booked(date, time) {
            return Err(AppointmentError::SlotTaken);
        }
        Ok(())
    }
}

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    config: SchedulingConfig,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    /// Flips the practitioner's `available` flag. Admins may flip anyone;
    /// practitioners only themselves.
    #[instrument(skip(self))]
    pub async fn change_availability(
        &self,
        practitioner_id: Uuid,
        actor: &Actor,
    ) -> Result<Practitioner, AppointmentError> {
        if !actor.is_admin() && !actor.is(Role::Practitioner, practitioner_id) {
            return Err(AppointmentError::Forbidden(
                "Only the doctor or an admin can change availability".to_string(),
            ));
        }

        let updated = self
            .write_with_retry(practitioner_id, |current| PractitionerChanges {
                fees: None,
                available: Some(!current.available),
            })
            .await?;

        info!("Doctor {} availability set to {}", practitioner_id, updated.available);
        Ok(updated)
    }

    /// Practitioner edits their own fee and availability. Existing
    /// appointments keep the amount they were booked at.
    #[instrument(skip(self, request))]
    pub async fn update_terms(
        &self,
        actor: &Actor,
        request: UpdatePractitionerRequest,
    ) -> Result<Practitioner, AppointmentError> {
        let practitioner_id = match (actor.role, actor.subject_id()) {
            (Role::Practitioner, Some(id)) => id,
            _ => {
                return Err(AppointmentError::Forbidden(
                    "Only doctors can update their terms".to_string(),
                ))
            }
        };

        if let Some(fees) = request.fees {
            if fees < 0 {
                return Err(AppointmentError::ValidationError(
                    "Fees cannot be negative".to_string(),
                ));
            }
        }
        if request.fees.is_none() && request.available.is_none() {
            return Err(AppointmentError::ValidationError(
                "Nothing to update".to_string(),
            ));
        }

        let updated = self
            .write_with_retry(practitioner_id, |_| PractitionerChanges {
                fees: request.fees,
                available: request.available,
            })
            .await?;

        info!("Doctor {} updated terms", practitioner_id);
        Ok(updated)
    }

    pub async fn booked_slots(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeLabel>, AppointmentError> {
        let practitioner = self
            .store
            .practitioner(practitioner_id)
            .await?
            .ok_or(AppointmentError::PractitionerNotFound)?;

        Ok(practitioner.slots_booked.slots_on(date))
    }

    async fn write_with_retry<F>(
        &self,
        practitioner_id: Uuid,
        changes_for: F,
    ) -> Result<Practitioner, AppointmentError>
    where
        F: Fn(&Practitioner) -> PractitionerChanges,
    {
        for attempt in 1..=self.config.max_attempts {
            let current = self
                .store
                .practitioner(practitioner_id)
                .await?
                .ok_or(AppointmentError::PractitionerNotFound)?;

            debug!("Doctor {} write attempt {} at version {}", practitioner_id, attempt, current.version);

            match self
                .store
                .update_practitioner(practitioner_id, current.version, changes_for(&current))
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(StoreError::VersionConflict(_)) if attempt < self.config.max_attempts => {
                    backoff(&self.config, practitioner_id, attempt).await;
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
