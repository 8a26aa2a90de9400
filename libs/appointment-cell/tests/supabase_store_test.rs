mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::ledger::{SlotLedger, TimeLabel};
use appointment_cell::models::{Appointment, AppointmentError};
use appointment_cell::services::reservation::ReservationCoordinator;
use appointment_cell::store::{
    CompletionOutcome, PractitionerChanges, ReservationWrite, SchedulingStore, StoreError,
    SupabaseStore,
};
use shared_models::auth::Actor;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

use common::{fast_retries, patient, practitioner, request};

fn store_for(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(&TestConfig::with_mock_server(&server.uri()).to_app_config())
}

async fn mount_doctor(server: &MockServer, doctor_id: Uuid, row: serde_json::Value, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])));

    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

async fn mount_patient(server: &MockServer, patient_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::user_row(patient_id)])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn reads_doctor_row_with_ledger_and_version() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let mut row = MockSupabaseResponses::doctor_row(doctor_id, true, 500, 7);
    row["slots_booked"] = json!({ "2024-06-01": ["10:00"] });
    mount_doctor(&server, doctor_id, row, None).await;

    let doctor = store_for(&server).practitioner(doctor_id).await.unwrap().unwrap();

    assert_eq!(doctor.version, 7);
    assert_eq!(doctor.fees, 500);
    assert!(doctor.slots_booked.is_booked(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        &TimeLabel::parse("10:00").unwrap()
    ));
}

#[tokio::test]
async fn missing_doctor_reads_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(store_for(&server).practitioner(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn reservation_rpc_carries_version_and_maps_false_to_conflict() {
    let server = MockServer::start().await;
    let doctor = practitioner(true, 500);
    let patient = patient();
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let time = TimeLabel::parse("10:00").unwrap();

    let mut ledger = SlotLedger::new();
    ledger.reserve(date, time.clone());
    let write = ReservationWrite {
        practitioner_id: doctor.id,
        expected_version: 3,
        slots_booked: ledger,
        appointment: Appointment::book(&patient, &doctor, date, time),
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_reservation"))
        .and(body_partial_json(json!({
            "p_doctor_id": doctor.id,
            "p_expected_version": 3,
            "p_slots_booked": { "2024-06-01": ["10:00"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_reservation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.commit_reservation(write.clone()).await.is_ok());
    assert_matches!(
        store.commit_reservation(write).await,
        Err(StoreError::VersionConflict(id)) if id == doctor.id
    );
}

#[tokio::test]
async fn payment_flag_flip_is_conditional() {
    let server = MockServer::start().await;
    let doctor = practitioner(true, 500);
    let patient = patient();
    let mut appointment = Appointment::book(
        &patient,
        &doctor,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        TimeLabel::parse("10:00").unwrap(),
    );

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment.id)))
        .and(query_param("payment", "eq.false"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    appointment.payment = true;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.mark_paid(appointment.id).await.unwrap());
    assert!(!store.mark_paid(appointment.id).await.unwrap());
}

#[tokio::test]
async fn completion_write_skips_cancelled_rows() {
    let server = MockServer::start().await;
    let doctor = practitioner(true, 500);
    let patient = patient();
    let mut appointment = Appointment::book(
        &patient,
        &doctor,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        TimeLabel::parse("10:00").unwrap(),
    );

    // The filtered PATCH matches nothing because the row was cancelled.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment.id)))
        .and(query_param("is_completed", "eq.false"))
        .and(query_param("cancelled", "eq.false"))
        .and(body_partial_json(json!({ "is_completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    appointment.cancelled = true;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment])))
        .mount(&server)
        .await;

    let outcome = store_for(&server).mark_completed(appointment.id).await.unwrap();
    assert_eq!(outcome, CompletionOutcome::Cancelled);
}

#[tokio::test]
async fn practitioner_update_is_version_filtered() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(query_param("version", "eq.4"))
        .and(body_partial_json(json!({ "available": false, "version": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row(doctor_id, false, 500, 5)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let changes = PractitionerChanges { fees: None, available: Some(false) };

    let updated = store.update_practitioner(doctor_id, 4, changes.clone()).await.unwrap();
    assert!(!updated.available);
    assert_eq!(updated.version, 5);

    assert_matches!(
        store.update_practitioner(doctor_id, 3, changes).await,
        Err(StoreError::VersionConflict(_))
    );
}

#[tokio::test]
async fn backend_errors_are_retryable_database_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(MockSupabaseResponses::error_response("upstream down", "PGRST000")),
        )
        .mount(&server)
        .await;

    let err: AppointmentError = store_for(&server)
        .practitioner(Uuid::new_v4())
        .await
        .unwrap_err()
        .into();

    assert_matches!(err, AppointmentError::DatabaseError(_));
    assert!(err.kind().is_retryable());
}

#[tokio::test]
async fn coordinator_rereads_after_lost_race_and_reports_slot_taken() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    mount_patient(&server, patient_id).await;

    // First read: empty ledger at version 0. Every later read: a rival's
    // reservation of the same slot has landed.
    mount_doctor(&server, doctor_id, MockSupabaseResponses::doctor_row(doctor_id, true, 500, 0), Some(1)).await;
    let mut taken = MockSupabaseResponses::doctor_row(doctor_id, true, 500, 1);
    taken["slots_booked"] = json!({ "2024-06-01": ["10:00"] });
    mount_doctor(&server, doctor_id, taken, None).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_reservation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn SchedulingStore> = Arc::new(store_for(&server));
    let result = ReservationCoordinator::new(store, fast_retries(3))
        .reserve_slot(&Actor::patient(patient_id), request(doctor_id, "2024-06-01", "10:00"))
        .await;

    assert_matches!(result, Err(AppointmentError::SlotTaken));
}

#[tokio::test]
async fn coordinator_books_through_rpc() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    mount_patient(&server, patient_id).await;
    mount_doctor(&server, doctor_id, MockSupabaseResponses::doctor_row(doctor_id, true, 750, 2), None).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/commit_reservation"))
        .and(body_partial_json(json!({ "p_expected_version": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let store: Arc<dyn SchedulingStore> = Arc::new(store_for(&server));
    let appointment = ReservationCoordinator::new(store, fast_retries(3))
        .reserve_slot(&Actor::patient(patient_id), request(doctor_id, "2024-06-01", "10:00"))
        .await
        .unwrap();

    assert_eq!(appointment.amount, 750);
    assert_eq!(appointment.doctor_id, doctor_id);
    assert_eq!(appointment.patient_id, patient_id);
}
