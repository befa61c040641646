use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/ingredients", get(handlers::get_ingredients))
        .route("/dishes", get(handlers::get_dishes))
        // Accounts
        .route("/users", post(handlers::create_user))
        .route("/users/:user_id", get(handlers::get_user))
        // Recommendations and feedback
        .route(
            "/users/:user_id/recommendations",
            post(handlers::get_recommendations),
        )
        .route("/users/:user_id/selections", post(handlers::select_dish))
        .route("/users/:user_id/feedback", post(handlers::rate_recommendations))
        .route("/users/:user_id/recent", get(handlers::get_recent))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
