use crate::domain::feature_record::FeatureRecord;
use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub input: FeatureRecord,
    pub prediction: i64,
    pub probability: f64,
}

impl PredictionRecord {
    pub fn new(id: u64, input: FeatureRecord, prediction: i64, probability: f64) -> Self {
        Self {
            id,
            timestamp: chrono::Utc::now().naive_utc().trunc_subsecs(6),
            input,
            prediction,
            probability: round4(probability),
        }
    }
}

pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
