use std::sync::Arc;

use axum::{Router, http::HeaderValue, routing::get};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{
    clients::engine::{EngineClient, make_engine_client},
    config::Config,
    handlers::{
        health_check::{health_check_handler, root_handler},
        stockfish::stockfish_handler,
    },
    services::{health_check::HealthCheckSvc, stockfish::StockfishSvc},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub health_check: HealthCheckSvc,
    pub stockfish_svc: Arc<StockfishSvc>,
    cors_origins: Vec<HeaderValue>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let engine = make_engine_client(&config);
        Self::with_engine(config, engine)
    }

    pub fn with_engine(
        config: Config,
        engine: Arc<dyn EngineClient + Send + Sync>,
    ) -> anyhow::Result<Self> {
        let cors_origins = config
            .cors_origins
            .iter()
            .map(|origin| {
                if origin == "*" {
                    anyhow::bail!("Wildcard CORS origin cannot be combined with credentials");
                }
                HeaderValue::from_str(origin)
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", origin))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        // Services
        let health_check = HealthCheckSvc::new(config.app_name.clone(), engine.clone());
        let stockfish_svc = Arc::new(StockfishSvc::new(
            engine,
            config.engine_depth,
            config.engine_timeout,
        ));

        Ok(Self {
            config,
            health_check,
            stockfish_svc,
            cors_origins,
        })
    }

    pub fn into_router(self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.cors_origins.clone()))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request());

        Router::new()
            .route("/", get(root_handler))
            .route("/api/v1/health", get(health_check_handler))
            .route("/api/v1/stockfish", get(stockfish_handler))
            .layer(cors)
            .with_state(self.into())
    }
}
