use anyhow::Result;

pub mod mock;
pub mod tree_ensemble;

/// A pre-trained binary classifier. Implementations are loaded once and only
/// read afterwards, so they are shared across requests without locking.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &[f64]) -> Result<i64>;

    /// Class probabilities, index 1 being the positive class.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}
