use std::sync::Arc;

use crate::{clients::engine::EngineClient, types::health_check::HealthResponse};

#[derive(Debug, Clone)]
pub struct HealthCheckSvc {
    app_name: String,
    engine: Arc<dyn EngineClient + Send + Sync>,
}

impl HealthCheckSvc {
    pub fn new(app_name: String, engine: Arc<dyn EngineClient + Send + Sync>) -> Self {
        Self { app_name, engine }
    }

    pub async fn health_check(&self) -> anyhow::Result<HealthResponse> {
        let response = if self.engine.ping().await? {
            HealthResponse {
                status: HealthResponse::OK.to_string(),
                message: format!("{} backend running", self.app_name),
            }
        } else {
            HealthResponse {
                status: HealthResponse::DEGRADED.to_string(),
                message: format!("{} backend running, chess engine unavailable", self.app_name),
            }
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::engine::{fixed::FixedEngineClient, uci::StockfishClient};

    #[tokio::test]
    async fn test_healthy_engine_reports_ok() {
        let svc = HealthCheckSvc::new(
            "ChessInsight".to_string(),
            Arc::new(FixedEngineClient::new(0)),
        );
        let health = svc.health_check().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.message, "ChessInsight backend running");
    }

    #[tokio::test]
    async fn test_missing_engine_reports_degraded() {
        let svc = HealthCheckSvc::new(
            "ChessInsight".to_string(),
            Arc::new(StockfishClient::new("/nonexistent/stockfish")),
        );
        let health = svc.health_check().await.unwrap();
        assert_eq!(health.status, "degraded");
    }
}
