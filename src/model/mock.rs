use crate::model::Classifier;
use anyhow::{bail, Result};

pub struct MockClassifier {
    pub label: i64,
    pub probability: f64,
    pub behavior: String,
}

impl MockClassifier {
    pub fn fixed(label: i64, probability: f64) -> Self {
        Self {
            label,
            probability,
            behavior: "FIXED".to_string(),
        }
    }

    pub fn failing() -> Self {
        Self {
            label: 0,
            probability: 0.0,
            behavior: "ALWAYS_FAILURE".to_string(),
        }
    }
}

impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    fn predict(&self, _features: &[f64]) -> Result<i64> {
        if self.behavior == "ALWAYS_FAILURE" {
            bail!("mock model failure");
        }
        Ok(self.label)
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>> {
        if self.behavior == "ALWAYS_FAILURE" {
            bail!("mock model failure");
        }
        Ok(vec![1.0 - self.probability, self.probability])
    }
}
