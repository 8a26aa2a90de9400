#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map};
use uuid::Uuid;

use appointment_cell::ledger::SlotLedger;
use appointment_cell::models::{
    Appointment, PatientProfile, Practitioner, ReserveSlotRequest, SchedulingConfig,
};
use appointment_cell::services::release::ReleaseService;
use appointment_cell::services::reservation::ReservationCoordinator;
use appointment_cell::store::InMemoryStore;
use payment_cell::models::{PaymentError, PaymentOrder};
use payment_cell::services::gateway::PaymentGateway;
use shared_models::auth::Actor;

pub const SECRET: &str = "test-razorpay-secret";

pub struct Booked {
    pub store: Arc<InMemoryStore>,
    pub appointment: Appointment,
    pub patient_id: Uuid,
}

/// Seeds a practitioner charging `fees` and books one appointment for a new patient.
pub async fn booked_appointment(fees: i64) -> Booked {
    let store = Arc::new(InMemoryStore::new());
    let doctor = Practitioner {
        id: Uuid::new_v4(),
        name: "Dr. Christopher Davis".to_string(),
        email: None,
        speciality: "Pediatricians".to_string(),
        degree: "MBBS".to_string(),
        experience: "1 Year".to_string(),
        about: String::new(),
        image: None,
        fees,
        address: json!({}),
        available: true,
        slots_booked: SlotLedger::new(),
        version: 0,
    };
    let patient = PatientProfile {
        id: Uuid::new_v4(),
        name: "Paying Patient".to_string(),
        email: Some("payer@example.com".to_string()),
        image: None,
        phone: None,
        address: json!({}),
        gender: None,
        dob: None,
    };
    store.insert_practitioner(doctor.clone()).await;
    store.insert_patient(patient.clone()).await;

    let appointment = ReservationCoordinator::new(store.clone(), scheduling())
        .reserve_slot(
            &Actor::patient(patient.id),
            ReserveSlotRequest {
                doctor_id: doctor.id,
                slot_date: "2024-06-01".to_string(),
                slot_time: "10:00".to_string(),
            },
        )
        .await
        .unwrap();

    Booked {
        store,
        appointment,
        patient_id: patient.id,
    }
}

pub async fn cancel(booked: &Booked) {
    ReleaseService::new(booked.store.clone(), scheduling())
        .cancel_appointment(booked.appointment.id, &Actor::patient(booked.patient_id))
        .await
        .unwrap();
}

pub fn scheduling() -> SchedulingConfig {
    SchedulingConfig {
        max_attempts: 3,
        retry_backoff: Duration::from_millis(1),
    }
}

pub fn order(id: &str, amount: i64, receipt: &str, status: &str) -> PaymentOrder {
    PaymentOrder {
        id: id.to_string(),
        amount,
        currency: "INR".to_string(),
        receipt: Some(receipt.to_string()),
        status: status.to_string(),
        extra: Map::new(),
    }
}

/// In-process processor: remembers created orders and serves them back.
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<HashMap<String, PaymentOrder>>,
    pub fail: bool,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn put(&self, order: PaymentOrder) {
        self.orders.lock().unwrap().insert(order.id.clone(), order);
    }

    pub fn created(&self) -> Vec<PaymentOrder> {
        self.orders.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, PaymentError> {
        if self.fail {
            return Err(PaymentError::GatewayError("connection refused".to_string()));
        }
        let mut created = order(&format!("order_{}", Uuid::new_v4().simple()), amount, receipt, "created");
        created.currency = currency.to_string();
        self.put(created.clone());
        Ok(created)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, PaymentError> {
        if self.fail {
            return Err(PaymentError::GatewayError("connection refused".to_string()));
        }
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentError::GatewayError("order not found".to_string()))
    }
}
