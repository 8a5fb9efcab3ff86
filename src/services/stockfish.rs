use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    clients::engine::{
        EngineClient,
        types::{EngineError, Evaluation},
    },
    services::metrics::ENGINE_METRICS,
    types::stockfish::StockfishTestResponse,
};

#[derive(Debug, Clone)]
pub struct StockfishSvc {
    engine: Arc<dyn EngineClient + Send + Sync>,
    depth: u32,
    timeout: Duration,
}

impl StockfishSvc {
    pub fn new(engine: Arc<dyn EngineClient + Send + Sync>, depth: u32, timeout: Duration) -> Self {
        Self {
            engine,
            depth,
            timeout,
        }
    }

    /// Evaluates the starting position and reports the score for white and
    /// black, in that order.
    pub async fn test_stockfish(&self) -> Result<StockfishTestResponse, EngineError> {
        let eval = self.analyse().await?;
        // the starting position has white to move
        let (white, black) = eval.white_black(true);

        Ok(StockfishTestResponse {
            result: format!("{white} {black}"),
        })
    }

    async fn analyse(&self) -> Result<Evaluation, EngineError> {
        let start = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            self.engine.analyse_start_position(self.depth),
        )
        .await
        .unwrap_or_else(|_| Err(EngineError::Timeout(self.timeout)));

        match &outcome {
            Ok(eval) => {
                ENGINE_METRICS.analyses.inc();
                ENGINE_METRICS.analysis_latency.observe(start.elapsed());
                tracing::info!(depth = eval.depth, score = %eval.score, "Engine analysis finished");
            }
            Err(err) => {
                ENGINE_METRICS.failed_analyses.inc();
                tracing::warn!(error = %err, "Engine analysis failed");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::engine::{fixed::FixedEngineClient, types::Score};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct StuckEngine;

    #[async_trait]
    impl EngineClient for StuckEngine {
        async fn analyse_start_position(&self, _depth: u32) -> Result<Evaluation, EngineError> {
            std::future::pending().await
        }

        async fn ping(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[derive(Debug)]
    struct MatingEngine;

    #[async_trait]
    impl EngineClient for MatingEngine {
        async fn analyse_start_position(&self, depth: u32) -> Result<Evaluation, EngineError> {
            Ok(Evaluation {
                depth,
                score: Score::Mate(2),
            })
        }

        async fn ping(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_result_is_white_then_black() {
        let svc = StockfishSvc::new(
            Arc::new(FixedEngineClient::new(35)),
            10,
            Duration::from_secs(1),
        );
        let response = svc.test_stockfish().await.unwrap();
        assert_eq!(response.result, "35 -35");
    }

    #[tokio::test]
    async fn test_mate_scores_are_marked() {
        let svc = StockfishSvc::new(Arc::new(MatingEngine), 10, Duration::from_secs(1));
        let response = svc.test_stockfish().await.unwrap();
        assert_eq!(response.result, "#2 #-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_engine_times_out() {
        let svc = StockfishSvc::new(Arc::new(StuckEngine), 10, Duration::from_secs(5));
        let err = svc.test_stockfish().await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout(d) if d == Duration::from_secs(5)));
    }
}
