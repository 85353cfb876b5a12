use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub history_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "model.json".to_string())
                .into(),
            history_file: std::env::var("HISTORY_FILE")
                .unwrap_or_else(|_| "predictions.json".to_string())
                .into(),
        }
    }
}
