pub mod client;
pub mod config;
pub mod domain {
    pub mod feature_record;
    pub mod prediction;
    pub mod prediction_log;
}
pub mod error;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod predictions;
    }
    pub mod middleware {
        pub mod request_log;
    }
    pub mod routes;
}
pub mod model;
pub mod repo {
    pub mod history_repo;
}
pub mod service {
    pub mod prediction_service;
}

#[derive(Clone)]
pub struct AppState {
    pub prediction_service: service::prediction_service::PredictionService,
}
