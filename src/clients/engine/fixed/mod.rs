use async_trait::async_trait;

use crate::clients::engine::{
    EngineClient,
    types::{EngineError, Evaluation, Score},
};

/// An `EngineClient` that answers every search with the same score and never
/// starts a process.
#[derive(Clone, Debug)]
pub struct FixedEngineClient {
    centipawns: i32,
}

impl FixedEngineClient {
    pub fn new(centipawns: i32) -> Self {
        Self { centipawns }
    }
}

#[async_trait]
impl EngineClient for FixedEngineClient {
    async fn analyse_start_position(&self, depth: u32) -> Result<Evaluation, EngineError> {
        Ok(Evaluation {
            depth,
            score: Score::Centipawns(self.centipawns),
        })
    }

    async fn ping(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_configured_score_at_requested_depth() {
        let client = FixedEngineClient::new(25);
        let eval = client.analyse_start_position(7).await.unwrap();
        assert_eq!(
            eval,
            Evaluation {
                depth: 7,
                score: Score::Centipawns(25),
            }
        );
    }

    #[tokio::test]
    async fn test_ping_returns_true() {
        assert!(FixedEngineClient::new(0).ping().await.unwrap());
    }
}
