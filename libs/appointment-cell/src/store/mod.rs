// libs/appointment-cell/src/store/mod.rs
//
// Persistence seam for the scheduling core. Every write that touches a
// practitioner's ledger is version-checked against the practitioner record so
// concurrent writers for the same practitioner serialize; writers for
// different practitioners never contend.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::SlotLedger;
use crate::models::{Appointment, AppointmentError, PatientProfile, Practitioner};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("practitioner {0} was modified concurrently")]
    VersionConflict(Uuid),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppointmentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionConflict(_) => AppointmentError::ConcurrentWrite { attempts: 1 },
            StoreError::Backend(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

/// Booking unit: insert the appointment and replace the practitioner's ledger,
/// provided the practitioner is still at `expected_version`.
#[derive(Debug, Clone)]
pub struct ReservationWrite {
    pub practitioner_id: Uuid,
    pub expected_version: i64,
    pub slots_booked: SlotLedger,
    pub appointment: Appointment,
}

/// Release unit: flip `cancelled` on a not-yet-cancelled appointment and
/// replace the practitioner's ledger, provided the version still matches.
#[derive(Debug, Clone)]
pub struct ReleaseWrite {
    pub appointment_id: Uuid,
    pub practitioner_id: Uuid,
    pub expected_version: i64,
    pub slots_booked: SlotLedger,
}

#[derive(Debug, Clone, Default)]
pub struct PractitionerChanges {
    pub fees: Option<i64>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentFilter {
    All,
    Patient(Uuid),
    Practitioner(Uuid),
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        match self {
            AppointmentFilter::All => true,
            AppointmentFilter::Patient(id) => appointment.patient_id == *id,
            AppointmentFilter::Practitioner(id) => appointment.doctor_id == *id,
        }
    }
}

/// Result of the conditional completion write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
    Cancelled,
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn practitioner(&self, id: Uuid) -> Result<Option<Practitioner>, StoreError>;

    async fn practitioners(&self) -> Result<Vec<Practitioner>, StoreError>;

    async fn patient(&self, id: Uuid) -> Result<Option<PatientProfile>, StoreError>;

    async fn patient_count(&self) -> Result<usize, StoreError>;

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Newest first.
    async fn appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;

    async fn commit_reservation(&self, write: ReservationWrite) -> Result<(), StoreError>;

    async fn commit_release(&self, write: ReleaseWrite) -> Result<(), StoreError>;

    async fn update_practitioner(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: PractitionerChanges,
    ) -> Result<Practitioner, StoreError>;

    /// Sets `is_completed` only on an appointment that is neither completed
    /// nor cancelled at write time.
    async fn mark_completed(&self, appointment_id: Uuid) -> Result<CompletionOutcome, StoreError>;

    /// Sets `payment` if it was unset. Returns whether this call flipped it.
    async fn mark_paid(&self, appointment_id: Uuid) -> Result<bool, StoreError>;
}
