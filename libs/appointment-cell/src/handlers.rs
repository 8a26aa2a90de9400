// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{parse_slot_date, ReserveSlotRequest, SlotQuery, UpdatePractitionerRequest};
use crate::state::SchedulingState;

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn reserve_slot(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ReserveSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.coordinator().reserve_slot(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment Booked",
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.release().cancel_appointment(appointment_id, &actor).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Cancelled",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .completion()
        .complete_appointment(appointment_id, &actor)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Completed",
        "appointment": appointment
    })))
}

// ==============================================================================
// LISTINGS & DASHBOARDS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_my_appointments(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.dashboard().patient_appointments(&actor).await?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn list_practitioner_appointments(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.dashboard().practitioner_appointments(&actor).await?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.dashboard().all_appointments(&actor).await?;

    Ok(Json(json!({ "success": true, "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn practitioner_dashboard(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let dashboard = state.dashboard().practitioner_dashboard(&actor).await?;

    Ok(Json(json!({ "success": true, "dashData": dashboard })))
}

#[axum::debug_handler]
pub async fn admin_dashboard(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let dashboard = state.dashboard().admin_dashboard(&actor).await?;

    Ok(Json(json!({ "success": true, "dashData": dashboard })))
}

// ==============================================================================
// PRACTITIONER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn booked_slots(
    State(state): State<SchedulingState>,
    Path(practitioner_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_slot_date(&query.date)?;
    let slots = state.availability().booked_slots(practitioner_id, date).await?;

    Ok(Json(json!({
        "success": true,
        "date": date,
        "booked_slots": slots
    })))
}

#[axum::debug_handler]
pub async fn change_availability(
    State(state): State<SchedulingState>,
    Path(practitioner_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let practitioner = state
        .availability()
        .change_availability(practitioner_id, &actor)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability Changed",
        "available": practitioner.available
    })))
}

#[axum::debug_handler]
pub async fn update_practitioner_terms(
    State(state): State<SchedulingState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdatePractitionerRequest>,
) -> Result<Json<Value>, AppError> {
    let practitioner = state.availability().update_terms(&actor, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile Updated",
        "fees": practitioner.fees,
        "available": practitioner.available
    })))
}
