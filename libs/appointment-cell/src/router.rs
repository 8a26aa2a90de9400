// libs/appointment-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::SchedulingState;

pub fn appointment_routes(state: SchedulingState) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::reserve_slot))
        .route("/mine", get(handlers::list_my_appointments))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/practitioner", get(handlers::list_practitioner_appointments))
        .route("/practitioner/dashboard", get(handlers::practitioner_dashboard))
        .route("/admin", get(handlers::list_all_appointments))
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

pub fn practitioner_routes(state: SchedulingState) -> Router {
    // Slot lookups back the public booking page.
    let public_routes = Router::new().route("/{practitioner_id}/slots", get(handlers::booked_slots));

    let protected_routes = Router::new()
        .route("/{practitioner_id}/availability", post(handlers::change_availability))
        .route("/me", patch(handlers::update_practitioner_terms))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
