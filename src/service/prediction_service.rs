use crate::domain::feature_record::FeatureRecord;
use crate::domain::prediction::PredictionRecord;
use crate::domain::prediction_log::PredictionLog;
use crate::error::{PredictError, HISTORY_FILE_NOT_FOUND, PREDICTION_NOT_FOUND};
use crate::model::Classifier;
use crate::repo::history_repo::HistoryStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct PredictionService {
    pub classifier: Arc<dyn Classifier>,
    pub history: Arc<dyn HistoryStore>,
    log: Arc<Mutex<PredictionLog>>,
}

impl PredictionService {
    /// Builds the service from whatever history has been persisted so far.
    pub async fn start(
        classifier: Arc<dyn Classifier>,
        history: Arc<dyn HistoryStore>,
    ) -> anyhow::Result<Self> {
        let records = history.load().await?.unwrap_or_default();
        let log = PredictionLog::from_records(records);
        tracing::info!(
            records = log.len(),
            last_id = log.last_id(),
            "prediction history loaded"
        );
        Ok(Self::with_log(classifier, history, log))
    }

    pub fn with_log(
        classifier: Arc<dyn Classifier>,
        history: Arc<dyn HistoryStore>,
        log: PredictionLog,
    ) -> Self {
        Self {
            classifier,
            history,
            log: Arc::new(Mutex::new(log)),
        }
    }

    pub async fn submit(&self, input: FeatureRecord) -> Result<PredictionRecord, PredictError> {
        input.validate()?;

        let (prediction, probability) = self.classify(&input)?;

        // id allocation, persist and append must not interleave between requests
        let mut log = self.log.lock().await;
        let id = log.next_id();
        let record = PredictionRecord::new(id, input, prediction, probability);

        // the log only changes once the file holds the new record, so a write
        // that fails or is abandoned leaves both untouched
        let mut next = Vec::with_capacity(log.len() + 1);
        next.extend_from_slice(log.records());
        next.push(record.clone());

        let saved = self.history.save(&next).await;
        if let Err(e) = saved {
            tracing::warn!(id, error = %e, "prediction not recorded, history write failed");
            return Err(PredictError::Persistence(format!("{e:#}")));
        }
        log.append(record.clone());

        tracing::info!(
            id = record.id,
            prediction = record.prediction,
            probability = record.probability,
            "prediction recorded"
        );
        Ok(record)
    }

    fn classify(&self, input: &FeatureRecord) -> Result<(i64, f64), PredictError> {
        let features = input.model_features();

        let prediction = self
            .classifier
            .predict(&features)
            .map_err(|e| PredictError::Inference(format!("{e:#}")))?;
        let proba = self
            .classifier
            .predict_proba(&features)
            .map_err(|e| PredictError::Inference(format!("{e:#}")))?;

        let probability = *proba.get(1).ok_or_else(|| {
            PredictError::Inference(format!(
                "expected two class probabilities, got {}",
                proba.len()
            ))
        })?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PredictError::Inference(format!(
                "positive class probability out of range: {probability}"
            )));
        }

        Ok((prediction, probability))
    }

    pub async fn list(&self) -> Vec<PredictionRecord> {
        self.log.lock().await.records().to_vec()
    }

    /// Any integer is a valid query; ids that no record carries, negative
    /// ones included, are simply not found.
    pub async fn get(&self, id: i64) -> Result<PredictionRecord, PredictError> {
        let log = self.log.lock().await;
        u64::try_from(id)
            .ok()
            .and_then(|id| log.find(id))
            .cloned()
            .ok_or_else(|| PredictError::NotFound(PREDICTION_NOT_FOUND.to_string()))
    }

    pub async fn download(&self) -> Result<Vec<u8>, PredictError> {
        match self.history.read_raw().await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(PredictError::NotFound(HISTORY_FILE_NOT_FOUND.to_string())),
            Err(e) => Err(PredictError::Persistence(format!("{e:#}"))),
        }
    }

    pub async fn record_count(&self) -> usize {
        self.log.lock().await.len()
    }

    /// Writes the current log once more. An empty log is left unwritten so a
    /// history file never appears without a prediction behind it.
    pub async fn flush(&self) -> anyhow::Result<()> {
        let log = self.log.lock().await;
        if log.is_empty() {
            return Ok(());
        }
        self.history.save(log.records()).await?;
        tracing::info!(records = log.len(), "prediction history flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::MockClassifier;
    use anyhow::Result;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryHistory {
        saved: std::sync::Mutex<Option<Vec<PredictionRecord>>>,
        fail_writes: AtomicBool,
        stall_writes: AtomicBool,
    }

    #[async_trait::async_trait]
    impl HistoryStore for MemoryHistory {
        async fn load(&self) -> Result<Option<Vec<PredictionRecord>>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save(&self, records: &[PredictionRecord]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            if self.stall_writes.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            *self.saved.lock().unwrap() = Some(records.to_vec());
            Ok(())
        }

        async fn read_raw(&self) -> Result<Option<Vec<u8>>> {
            match &*self.saved.lock().unwrap() {
                Some(records) => Ok(Some(serde_json::to_vec(records)?)),
                None => Ok(None),
            }
        }

        async fn exists(&self) -> Result<bool> {
            Ok(self.saved.lock().unwrap().is_some())
        }

        async fn check_writable(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("read-only");
            }
            Ok(())
        }
    }

    fn input() -> FeatureRecord {
        FeatureRecord {
            age: 25,
            ad_spend: 100.0,
            click_through_rate: 0.05,
            website_visits: 10,
            time_on_site: 30.0,
            gender_male: 1,
            channel_ppc: 1,
            channel_referral: 0,
            channel_seo: 0,
            channel_social_media: 0,
        }
    }

    async fn service(history: Arc<MemoryHistory>, model: MockClassifier) -> PredictionService {
        PredictionService::start(Arc::new(model), history).await.unwrap()
    }

    #[tokio::test]
    async fn first_submission_gets_id_one() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(1, 0.7321)).await;

        let rec = svc.submit(input()).await.unwrap();
        assert_eq!(rec.id, 1);
        assert_eq!(rec.prediction, 1);
        assert_eq!(rec.probability, 0.7321);
        assert_eq!(history.saved.lock().unwrap().as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_log() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(1, 0.5)).await;

        let err = svc
            .submit(FeatureRecord { age: 17, ..input() })
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::Validation { .. }));
        assert_eq!(svc.record_count().await, 0);
        assert!(!history.exists().await.unwrap());
    }

    #[tokio::test]
    async fn model_failure_is_an_inference_error() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history, MockClassifier::failing()).await;

        let err = svc.submit(input()).await.unwrap_err();
        assert!(matches!(err, PredictError::Inference(_)));
        assert_eq!(svc.record_count().await, 0);
    }

    #[tokio::test]
    async fn abandoned_write_leaves_log_unchanged() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(1, 0.7)).await;

        history.stall_writes.store(true, Ordering::SeqCst);
        let outcome = tokio::time::timeout(Duration::from_millis(50), svc.submit(input())).await;
        assert!(outcome.is_err());
        assert!(svc.list().await.is_empty());
        assert!(!history.exists().await.unwrap());

        history.stall_writes.store(false, Ordering::SeqCst);
        let rec = svc.submit(input()).await.unwrap();
        assert_eq!(rec.id, 1);
        assert_eq!(svc.list().await.len(), 1);
    }

    #[tokio::test]
    async fn negative_id_is_not_found() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history, MockClassifier::fixed(1, 0.7)).await;
        svc.submit(input()).await.unwrap();

        assert_eq!(svc.get(1).await.unwrap().id, 1);
        assert!(matches!(svc.get(-1).await, Err(PredictError::NotFound(_))));
        assert!(matches!(svc.get(2).await, Err(PredictError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_write_leaves_log_untouched() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(0, 0.1)).await;
        svc.submit(input()).await.unwrap();

        history.fail_writes.store(true, Ordering::SeqCst);
        let err = svc.submit(input()).await.unwrap_err();
        assert!(matches!(err, PredictError::Persistence(_)));
        assert_eq!(svc.record_count().await, 1);

        history.fail_writes.store(false, Ordering::SeqCst);
        let rec = svc.submit(input()).await.unwrap();
        assert_eq!(rec.id, 2);
    }

    #[tokio::test]
    async fn concurrent_submissions_get_distinct_ids() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(1, 0.6)).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move { svc.submit(input()).await }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=20).collect::<Vec<u64>>());
        assert_eq!(history.saved.lock().unwrap().as_ref().map(Vec::len), Some(20));
    }

    #[tokio::test]
    async fn download_before_any_write_is_not_found() {
        let svc = service(Arc::new(MemoryHistory::default()), MockClassifier::fixed(1, 0.5)).await;
        match svc.download().await {
            Err(PredictError::NotFound(msg)) => assert_eq!(msg, HISTORY_FILE_NOT_FOUND),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn flush_skips_empty_log() {
        let history = Arc::new(MemoryHistory::default());
        let svc = service(history.clone(), MockClassifier::fixed(1, 0.5)).await;
        svc.flush().await.unwrap();
        assert!(!history.exists().await.unwrap());
    }
}
