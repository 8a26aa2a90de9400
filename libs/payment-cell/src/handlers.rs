// libs/payment-cell/src/handlers.rs
use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{AuthorizePaymentRequest, VerifyPaymentRequest};
use crate::state::PaymentState;

#[axum::debug_handler]
pub async fn authorize_payment(
    State(state): State<PaymentState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<AuthorizePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let order = state.reconciler()?.authorize(&actor, request).await?;

    Ok(Json(json!({
        "success": true,
        "order": order
    })))
}

#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<PaymentState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let confirmation = state.reconciler()?.verify(&actor, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment Successful",
        "appointment_id": confirmation.appointment_id,
        "newly_applied": confirmation.newly_applied
    })))
}
