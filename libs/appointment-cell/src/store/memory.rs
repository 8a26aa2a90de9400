// libs/appointment-cell/src/store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    AppointmentFilter, CompletionOutcome, PractitionerChanges, ReleaseWrite, ReservationWrite,
    SchedulingStore, StoreError,
};
use crate::models::{Appointment, PatientProfile, Practitioner};

#[derive(Default)]
struct Tables {
    practitioners: HashMap<Uuid, Practitioner>,
    patients: HashMap<Uuid, PatientProfile>,
    appointments: HashMap<Uuid, Appointment>,
}

/// Process-local store. All commits run under one write lock, and each one
/// checks the practitioner version before touching anything.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_practitioner(&self, practitioner: Practitioner) {
        let mut tables = self.tables.write().await;
        tables.practitioners.insert(practitioner.id, practitioner);
    }

    pub async fn insert_patient(&self, patient: PatientProfile) {
        let mut tables = self.tables.write().await;
        tables.patients.insert(patient.id, patient);
    }
}

fn check_version(
    practitioner: Option<&Practitioner>,
    id: Uuid,
    expected_version: i64,
) -> Result<(), StoreError> {
    match practitioner {
        Some(p) if p.version == expected_version => Ok(()),
        Some(_) => Err(StoreError::VersionConflict(id)),
        None => Err(StoreError::Backend(format!("practitioner {} missing", id))),
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn practitioner(&self, id: Uuid) -> Result<Option<Practitioner>, StoreError> {
        Ok(self.tables.read().await.practitioners.get(&id).cloned())
    }

    async fn practitioners(&self) -> Result<Vec<Practitioner>, StoreError> {
        Ok(self.tables.read().await.practitioners.values().cloned().collect())
    }

    async fn patient(&self, id: Uuid) -> Result<Option<PatientProfile>, StoreError> {
        Ok(self.tables.read().await.patients.get(&id).cloned())
    }

    async fn patient_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.patients.len())
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(appointments)
    }

    async fn commit_reservation(&self, write: ReservationWrite) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        check_version(
            tables.practitioners.get(&write.practitioner_id),
            write.practitioner_id,
            write.expected_version,
        )?;

        if let Some(practitioner) = tables.practitioners.get_mut(&write.practitioner_id) {
            practitioner.slots_booked = write.slots_booked;
            practitioner.version += 1;
        }
        debug!("Committed reservation {}", write.appointment.id);
        tables.appointments.insert(write.appointment.id, write.appointment);

        Ok(())
    }

    async fn commit_release(&self, write: ReleaseWrite) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        check_version(
            tables.practitioners.get(&write.practitioner_id),
            write.practitioner_id,
            write.expected_version,
        )?;

        match tables.appointments.get(&write.appointment_id) {
            Some(a) if !a.cancelled => {}
            Some(_) => return Err(StoreError::VersionConflict(write.practitioner_id)),
            None => {
                return Err(StoreError::Backend(format!(
                    "appointment {} missing",
                    write.appointment_id
                )))
            }
        }

        if let Some(appointment) = tables.appointments.get_mut(&write.appointment_id) {
            appointment.cancelled = true;
        }
        if let Some(practitioner) = tables.practitioners.get_mut(&write.practitioner_id) {
            practitioner.slots_booked = write.slots_booked;
            practitioner.version += 1;
        }
        debug!("Committed release of {}", write.appointment_id);

        Ok(())
    }

    async fn update_practitioner(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: PractitionerChanges,
    ) -> Result<Practitioner, StoreError> {
        let mut tables = self.tables.write().await;
        check_version(tables.practitioners.get(&id), id, expected_version)?;

        let practitioner = tables
            .practitioners
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("practitioner {} missing", id)))?;
        if let Some(fees) = changes.fees {
            practitioner.fees = fees;
        }
        if let Some(available) = changes.available {
            practitioner.available = available;
        }
        practitioner.version += 1;

        Ok(practitioner.clone())
    }

    async fn mark_completed(&self, appointment_id: Uuid) -> Result<CompletionOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.appointments.get_mut(&appointment_id) {
            Some(a) if a.cancelled => Ok(CompletionOutcome::Cancelled),
            Some(a) if a.is_completed => Ok(CompletionOutcome::AlreadyCompleted),
            Some(a) => {
                a.is_completed = true;
                Ok(CompletionOutcome::Completed)
            }
            None => Err(StoreError::Backend(format!("appointment {} missing", appointment_id))),
        }
    }

    async fn mark_paid(&self, appointment_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.appointments.get_mut(&appointment_id) {
            Some(a) if !a.payment => {
                a.payment = true;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::Backend(format!("appointment {} missing", appointment_id))),
        }
    }
}
