// Route modules
pub mod bookings;
pub mod coach;
pub mod courses;
pub mod credits;

use crate::{
    app_state::AppState,
    middleware::{account_identity_middleware, logging_middleware},
};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};

use crate::models::common::MessageResponse;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    // Routes acting on behalf of an account
    let account_routes = Router::new()
        .route(
            "/courses/{course_id}/enroll",
            post(courses::enroll).delete(courses::cancel),
        )
        .route("/credits", get(credits::get_credit_summary))
        .route("/credits/purchases", get(credits::get_purchase_history))
        .route(
            "/credit-packages/{package_id}/purchase",
            post(credits::purchase_package),
        )
        .route("/bookings", get(bookings::get_booking_history))
        .route("/coach/courses", get(coach::get_coach_courses))
        .route("/coach/revenue", get(coach::get_monthly_revenue))
        .route_layer(middleware::from_fn(account_identity_middleware));

    let public_routes = Router::new()
        .route("/credit-packages", get(credits::list_packages))
        .route("/health", get(health));

    Router::new()
        .merge(account_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}

async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("ok"))
}
