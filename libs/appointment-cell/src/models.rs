// libs/appointment-cell/src/models.rs
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::{AppError, FailureKind};

use crate::ledger::{SlotLedger, TimeLabel};

// ==============================================================================
// PRACTITIONER & PATIENT RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub speciality: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub about: String,
    pub image: Option<String>,
    /// Consultation fee in minor currency units.
    pub fees: i64,
    #[serde(default)]
    pub address: Value,
    pub available: bool,
    #[serde(default)]
    pub slots_booked: SlotLedger,
    /// Bumped on every write to this record.
    #[serde(default)]
    pub version: i64,
}

impl Practitioner {
    pub fn snapshot(&self) -> PractitionerSnapshot {
        PractitionerSnapshot {
            id: self.id,
            name: self.name.clone(),
            speciality: self.speciality.clone(),
            degree: self.degree.clone(),
            experience: self.experience.clone(),
            about: self.about.clone(),
            image: self.image.clone(),
            fees: self.fees,
            address: self.address.clone(),
        }
    }
}

/// Public practitioner fields copied into an appointment at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PractitionerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub image: Option<String>,
    pub fees: i64,
    pub address: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Value,
    pub gender: Option<String>,
    pub dob: Option<String>,
}

impl PatientProfile {
    pub fn snapshot(&self) -> PatientSnapshot {
        PatientSnapshot {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            gender: self.gender.clone(),
            dob: self.dob.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub phone: Option<String>,
    pub address: Value,
    pub gender: Option<String>,
    pub dob: Option<String>,
}

// ==============================================================================
// APPOINTMENT
// ==============================================================================

/// An appointment carries three independent flags rather than a status enum:
/// a cancelled appointment may still be paid, and completion is orthogonal
/// to both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: TimeLabel,
    pub patient_data: PatientSnapshot,
    pub doctor_data: PractitionerSnapshot,
    /// Fee at booking time, minor currency units.
    pub amount: i64,
    pub cancelled: bool,
    pub payment: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn book(
        patient: &PatientProfile,
        practitioner: &Practitioner,
        slot_date: NaiveDate,
        slot_time: TimeLabel,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: practitioner.id,
            slot_date,
            slot_time,
            patient_data: patient.snapshot(),
            doctor_data: practitioner.snapshot(),
            amount: practitioner.fees,
            cancelled: false,
            payment: false,
            is_completed: false,
            created_at: Utc::now(),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveSlotRequest {
    pub doctor_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePractitionerRequest {
    pub fees: Option<i64>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerDashboard {
    pub earnings: i64,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub doctors: usize,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

pub fn parse_slot_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid slot date '{}'", raw.trim())))
}

// ==============================================================================
// CONFIGURATION
// ==============================================================================

/// Retry policy for version-checked writes on a practitioner record.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl SchedulingConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.reservation_max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.reservation_retry_backoff_ms),
        }
    }
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    PractitionerNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not available")]
    PractitionerUnavailable,

    #[error("Slot not available")]
    SlotTaken,

    #[error("Concurrent update on doctor schedule, gave up after {attempts} attempts")]
    ConcurrentWrite { attempts: u32 },

    #[error("Unauthorized action: {0}")]
    Forbidden(String),

    #[error("Appointment already cancelled")]
    AlreadyCancelled,

    #[error("Appointment already completed")]
    AlreadyCompleted,

    #[error("Appointment is cancelled")]
    AppointmentCancelled,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppointmentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AppointmentError::ValidationError(_) => FailureKind::Validation,
            AppointmentError::NotFound
            | AppointmentError::PractitionerNotFound
            | AppointmentError::PatientNotFound => FailureKind::NotFound,
            AppointmentError::PractitionerUnavailable
            | AppointmentError::SlotTaken
            | AppointmentError::ConcurrentWrite { .. } => FailureKind::Conflict,
            AppointmentError::Forbidden(_) => FailureKind::Forbidden,
            AppointmentError::AlreadyCancelled
            | AppointmentError::AlreadyCompleted
            | AppointmentError::AppointmentCancelled => FailureKind::Terminal,
            AppointmentError::DatabaseError(_) => FailureKind::ExternalService,
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        AppError::from_kind(error.kind(), error.to_string())
    }
}
