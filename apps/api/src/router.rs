use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use appointment_cell::router::{appointment_routes, practitioner_routes};
use appointment_cell::state::SchedulingState;
use payment_cell::router::payment_routes;
use payment_cell::state::PaymentState;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let scheduling = SchedulingState::from_config(config.clone());
    let payments = PaymentState::with_razorpay(config, scheduling.store.clone());

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/appointments", appointment_routes(scheduling.clone()))
        .nest("/practitioners", practitioner_routes(scheduling))
        .nest("/payments", payment_routes(payments))
}
