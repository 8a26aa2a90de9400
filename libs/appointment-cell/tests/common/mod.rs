#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use appointment_cell::ledger::SlotLedger;
use appointment_cell::models::{PatientProfile, Practitioner, ReserveSlotRequest, SchedulingConfig};
use appointment_cell::store::InMemoryStore;

pub fn practitioner(available: bool, fees: i64) -> Practitioner {
    Practitioner {
        id: Uuid::new_v4(),
        name: "Dr. Emily Larson".to_string(),
        email: Some("emily@clinic.test".to_string()),
        speciality: "Gynecologist".to_string(),
        degree: "MBBS".to_string(),
        experience: "3 Years".to_string(),
        about: "Women's health".to_string(),
        image: None,
        fees,
        address: json!({ "line1": "27th Cross", "line2": "Richmond" }),
        available,
        slots_booked: SlotLedger::new(),
        version: 0,
    }
}

pub fn patient() -> PatientProfile {
    PatientProfile {
        id: Uuid::new_v4(),
        name: "Test Patient".to_string(),
        email: Some("patient@example.com".to_string()),
        image: None,
        phone: Some("0000000000".to_string()),
        address: json!({ "line1": "", "line2": "" }),
        gender: None,
        dob: None,
    }
}

pub fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn request(doctor_id: Uuid, date: &str, time: &str) -> ReserveSlotRequest {
    ReserveSlotRequest {
        doctor_id,
        slot_date: date.to_string(),
        slot_time: time.to_string(),
    }
}

pub fn fast_retries(max_attempts: u32) -> SchedulingConfig {
    SchedulingConfig {
        max_attempts,
        retry_backoff: Duration::from_millis(1),
    }
}

/// Store seeded with one practitioner and one patient.
pub async fn seeded_store(available: bool) -> (Arc<InMemoryStore>, Practitioner, PatientProfile) {
    let store = Arc::new(InMemoryStore::new());
    let doctor = practitioner(available, 500);
    let patient = patient();
    store.insert_practitioner(doctor.clone()).await;
    store.insert_patient(patient.clone()).await;
    (store, doctor, patient)
}
