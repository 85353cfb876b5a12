use anyhow::Context;
use conversion_predictor::config::AppConfig;
use conversion_predictor::domain::feature_record::model_feature_names;
use conversion_predictor::http::routes::router;
use conversion_predictor::model::tree_ensemble::TreeEnsemble;
use conversion_predictor::repo::history_repo::JsonFileHistory;
use conversion_predictor::service::prediction_service::PredictionService;
use conversion_predictor::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::from_env();

    let model = TreeEnsemble::load(&cfg.model_path, &model_feature_names())
        .context("cannot serve without a model")?;
    tracing::info!(
        path = %cfg.model_path.display(),
        trees = model.tree_count(),
        "model loaded"
    );

    let history = Arc::new(JsonFileHistory::new(cfg.history_file.clone()));
    let prediction_service = PredictionService::start(Arc::new(model), history).await?;

    let state = AppState {
        prediction_service: prediction_service.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    prediction_service.flush().await?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
