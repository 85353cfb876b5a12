use crate::domain::feature_record::FeatureRecord;
use crate::error::PredictError;
use crate::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_prediction(
    State(state): State<AppState>,
    payload: Result<Json<FeatureRecord>, JsonRejection>,
) -> impl IntoResponse {
    let Json(input) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return PredictError::Validation {
                field: "body".to_string(),
                reason: rejection.body_text(),
            }
            .into_response()
        }
    };

    match state.prediction_service.submit(input).await {
        Ok(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_predictions(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.prediction_service.list().await;
    (axum::http::StatusCode::OK, Json(records)).into_response()
}

pub async fn get_prediction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => {
            return PredictError::Validation {
                field: "id".to_string(),
                reason: rejection.body_text(),
            }
            .into_response()
        }
    };

    match state.prediction_service.get(id).await {
        Ok(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn download_history(State(state): State<AppState>) -> impl IntoResponse {
    match state.prediction_service.download().await {
        Ok(bytes) => (
            axum::http::StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"predictions.json\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
