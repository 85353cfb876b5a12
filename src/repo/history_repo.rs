use crate::domain::prediction::PredictionRecord;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;

#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// `None` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<Vec<PredictionRecord>>>;

    /// Replaces the persisted history with `records`.
    async fn save(&self, records: &[PredictionRecord]) -> Result<()>;

    /// The persisted file exactly as stored, `None` if it was never written.
    async fn read_raw(&self) -> Result<Option<Vec<u8>>>;

    async fn exists(&self) -> Result<bool>;

    /// Fails when a save could not succeed, e.g. the target directory is
    /// missing or read-only.
    async fn check_writable(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    pub path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "predictions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl HistoryStore for JsonFileHistory {
    async fn load(&self) -> Result<Option<Vec<PredictionRecord>>> {
        let Some(bytes) = self.read_raw().await? else {
            return Ok(None);
        };
        let records: Vec<PredictionRecord> = serde_json::from_slice(&bytes)
            .with_context(|| format!("malformed history file {}", self.path.display()))?;
        Ok(Some(records))
    }

    async fn save(&self, records: &[PredictionRecord]) -> Result<()> {
        let body = to_indented_json(records)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    async fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    async fn exists(&self) -> Result<bool> {
        tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("failed to stat {}", self.path.display()))
    }

    async fn check_writable(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let meta = tokio::fs::metadata(&dir)
            .await
            .with_context(|| format!("history directory {} is not accessible", dir.display()))?;
        if !meta.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        if meta.permissions().readonly() {
            bail!("history directory {} is read-only", dir.display());
        }
        Ok(())
    }
}

/// Pretty JSON with four-space indentation, the layout of the history file.
pub fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature_record::FeatureRecord;

    fn record(id: u64, probability: f64) -> PredictionRecord {
        PredictionRecord::new(
            id,
            FeatureRecord {
                age: 33,
                ad_spend: 250.5,
                click_through_rate: 0.2,
                website_visits: 4,
                time_on_site: 12.0,
                gender_male: 1,
                channel_ppc: 0,
                channel_referral: 0,
                channel_seo: 0,
                channel_social_media: 1,
            },
            1,
            probability,
        )
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::new(dir.path().join("predictions.json"));
        assert!(store.load().await.unwrap().is_none());
        assert!(store.read_raw().await.unwrap().is_none());
        assert!(!store.exists().await.unwrap());
        assert!(store.check_writable().await.is_ok());
    }

    #[tokio::test]
    async fn missing_directory_is_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::new(dir.path().join("gone").join("predictions.json"));
        assert!(store.check_writable().await.is_err());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn save_then_load_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::new(dir.path().join("predictions.json"));
        let records = vec![record(1, 0.12345), record(2, 0.9)];
        store.save(&records).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, records);
        assert!(!dir.path().join("predictions.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_is_indented_with_stored_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistory::new(dir.path().join("predictions.json"));
        store.save(&[record(1, 0.5)]).await.unwrap();

        let text = String::from_utf8(store.read_raw().await.unwrap().unwrap()).unwrap();
        assert!(text.starts_with("[\n    {\n        \"id\": 1,"));
        assert!(text.contains("\"CampaignChannel_Social_Media\": 1"));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = JsonFileHistory::new(path);
        assert!(store.load().await.is_err());
    }
}
