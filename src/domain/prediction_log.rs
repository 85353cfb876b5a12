use crate::domain::prediction::PredictionRecord;

/// In-memory prediction history. Ids are handed out from a counter seeded
/// with the highest id found when the log was loaded.
#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    records: Vec<PredictionRecord>,
    last_id: u64,
}

impl PredictionLog {
    pub fn from_records(records: Vec<PredictionRecord>) -> Self {
        let last_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        Self { records, last_id }
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Id the next appended record will carry. Does not advance the counter.
    pub fn next_id(&self) -> u64 {
        self.last_id + 1
    }

    pub fn append(&mut self, record: PredictionRecord) {
        self.last_id = self.last_id.max(record.id);
        self.records.push(record);
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn find(&self, id: u64) -> Option<&PredictionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature_record::FeatureRecord;

    fn record(id: u64) -> PredictionRecord {
        PredictionRecord::new(
            id,
            FeatureRecord {
                age: 40,
                ad_spend: 10.0,
                click_through_rate: 0.1,
                website_visits: 2,
                time_on_site: 5.0,
                gender_male: 0,
                channel_ppc: 0,
                channel_referral: 1,
                channel_seo: 0,
                channel_social_media: 0,
            },
            0,
            0.25,
        )
    }

    #[test]
    fn counter_starts_from_max_loaded_id() {
        let log = PredictionLog::from_records(vec![record(3), record(7), record(5)]);
        assert_eq!(log.last_id(), 7);
        assert_eq!(log.next_id(), 8);
    }

    #[test]
    fn empty_log_starts_at_one() {
        let log = PredictionLog::default();
        assert!(log.is_empty());
        assert_eq!(log.next_id(), 1);
    }

    #[test]
    fn find_scans_by_id() {
        let log = PredictionLog::from_records(vec![record(1), record(2), record(3)]);
        assert_eq!(log.find(2).map(|r| r.id), Some(2));
        assert!(log.find(99_999).is_none());
    }

    #[test]
    fn append_advances_counter() {
        let mut log = PredictionLog::from_records(vec![record(1)]);
        assert_eq!(log.next_id(), 2);
        log.append(record(2));
        assert_eq!(log.len(), 2);
        assert_eq!(log.next_id(), 3);
    }
}
