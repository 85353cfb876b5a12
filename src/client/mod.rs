//! HTTP client for the prediction service, plus the form mapping and table
//! rendering used by the `predict-client` binary.

pub mod form;
pub mod output;

use crate::domain::feature_record::FeatureRecord;
use crate::domain::prediction::PredictionRecord;
use crate::error::ErrorEnvelope;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("error: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("could not encode request: {0}")]
    Encode(String),
}

pub struct PredictorClient {
    client: Client,
    endpoint: String,
}

impl PredictorClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("predict-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub async fn predict(&self, input: &FeatureRecord) -> Result<PredictionRecord, ClientError> {
        let body = input
            .to_wire()
            .map_err(|e| ClientError::Encode(format!("{e:#}")))?;
        let resp = self
            .client
            .post(self.url("/predict"))
            .json(&body)
            .send()
            .await
            .map_err(connection)?;
        handle_response(resp).await
    }

    pub async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, ClientError> {
        let resp = self
            .client
            .get(self.url("/predictions"))
            .send()
            .await
            .map_err(connection)?;
        handle_response(resp).await
    }

    pub async fn get_prediction(&self, id: u64) -> Result<PredictionRecord, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/predictions/{id}")))
            .send()
            .await
            .map_err(connection)?;
        handle_response(resp).await
    }
}

fn connection(e: reqwest::Error) -> ClientError {
    ClientError::Connection(e.to_string())
}

async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls the message out of an error envelope, falling back to the raw body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => env.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_envelope_message() {
        let body = r#"{"error":{"code":"NOT_FOUND","message":"request with this ID not found","details":null}}"#;
        assert_eq!(error_message(body), "request with this ID not found");
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn api_error_shows_status_and_message() {
        let err = ClientError::Api {
            status: 404,
            message: "history file not found".to_string(),
        };
        assert_eq!(err.to_string(), "error: 404: history file not found");
    }

    #[test]
    fn endpoint_trailing_slash_is_dropped() {
        let client = PredictorClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/predictions"), "http://localhost:8000/predictions");
    }
}
