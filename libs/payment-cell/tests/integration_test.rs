mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::store::SchedulingStore;
use payment_cell::router::payment_routes;
use payment_cell::services::signature::SignatureVerifier;
use payment_cell::state::PaymentState;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

use common::{booked_appointment, order, Booked, FakeGateway, SECRET};

fn create_test_app(config: AppConfig, booked: &Booked, gateway: Arc<FakeGateway>) -> Router {
    payment_routes(PaymentState::new(Arc::new(config), booked.store.clone(), gateway))
}

fn post(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", bearer)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn authorize_and_verify_over_http() {
    let config = TestConfig::default();
    let booked = booked_appointment(500).await;
    let gateway = Arc::new(FakeGateway::default());
    let app = create_test_app(config.to_app_config(), &booked, gateway.clone());
    let bearer = JwtTestUtils::bearer(&TestUser::with_id(booked.patient_id, "patient"), &config.jwt_secret);

    let response = app
        .clone()
        .oneshot(post("/razorpay", &bearer, json!({ "appointment_id": booked.appointment.id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["order"]["amount"], 500);
    let order_id = body["order"]["id"].as_str().unwrap().to_string();

    // The processor captures the payment out of band.
    gateway.put(order(&order_id, 500, &booked.appointment.id.to_string(), "paid"));

    let signature = SignatureVerifier::new(SECRET).unwrap().sign(&order_id, "pay_1").unwrap();
    let callback = json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": "pay_1",
        "razorpay_signature": signature
    });

    let response = app
        .clone()
        .oneshot(post("/razorpay/verify", &bearer, callback.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["newly_applied"], true);

    let response = app
        .oneshot(post("/razorpay/verify", &bearer, callback))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["newly_applied"], false);

    assert!(booked.store.appointment(booked.appointment.id).await.unwrap().unwrap().payment);
}

#[tokio::test]
async fn bad_signature_gets_generic_rejection() {
    let config = TestConfig::default();
    let booked = booked_appointment(500).await;
    let app = create_test_app(config.to_app_config(), &booked, Arc::new(FakeGateway::default()));
    let bearer = JwtTestUtils::bearer(&TestUser::with_id(booked.patient_id, "patient"), &config.jwt_secret);

    let response = app
        .oneshot(post(
            "/razorpay/verify",
            &bearer,
            json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "deadbeef"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "signature_invalid");
    assert_eq!(body["error"], "Payment verification failed");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn unconfigured_payments_fail_closed() {
    let config = TestConfig {
        razorpay_key_secret: String::new(),
        ..TestConfig::default()
    };
    let booked = booked_appointment(500).await;
    let gateway = Arc::new(FakeGateway::default());
    let app = create_test_app(config.to_app_config(), &booked, gateway.clone());
    let bearer = JwtTestUtils::bearer(&TestUser::with_id(booked.patient_id, "patient"), &config.jwt_secret);

    let response = app
        .oneshot(post("/razorpay", &bearer, json!({ "appointment_id": booked.appointment.id })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(gateway.created().is_empty());
}

#[tokio::test]
async fn payments_require_authentication() {
    let booked = booked_appointment(500).await;
    let app = create_test_app(
        TestConfig::default().to_app_config(),
        &booked,
        Arc::new(FakeGateway::default()),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/razorpay")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "appointment_id": booked.appointment.id }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
