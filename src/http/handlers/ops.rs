use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

/// Ready once a submission could be persisted: the history location has to be
/// writable.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.prediction_service;
    let records = service.record_count().await;
    let history_file = match service.history.exists().await {
        Ok(found) => found,
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::warn!(error = %reason, "history file status unknown");
            false
        }
    };
    let ready = match service.history.check_writable().await {
        Ok(()) => true,
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::warn!(error = %reason, "history location not writable");
            false
        }
    };
    let status = if ready {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": ready,
            "model": service.classifier.name(),
            "records": records,
            "history_file": history_file
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}
