use crate::http::handlers::{ops, predictions};
use crate::http::middleware::request_log::log_requests;
use crate::AppState;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .route("/predict", post(predictions::create_prediction))
        .route("/predictions", get(predictions::list_predictions))
        .route("/predictions/:id", get(predictions::get_prediction))
        .route("/download", get(predictions::download_history))
        .layer(from_fn(log_requests))
        .with_state(state)
}
