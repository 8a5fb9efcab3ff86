pub mod fixed;
pub mod types;
pub mod uci;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use types::{EngineError, Evaluation};

use crate::{
    clients::engine::{fixed::FixedEngineClient, uci::StockfishClient},
    config::{Config, EngineBackend},
};

pub fn make_engine_client(config: &Config) -> Arc<dyn EngineClient + Send + Sync> {
    match config.engine_backend {
        EngineBackend::Stockfish => Arc::new(StockfishClient::new(config.stockfish_path.clone())),
        EngineBackend::Fixed => Arc::new(FixedEngineClient::new(config.engine_fixed_score)),
    }
}

/// Trait that defines the interface for chess engine clients.
#[async_trait]
pub trait EngineClient: Sync + Send + fmt::Debug {
    /// Searches the standard starting position to `depth` plies.
    async fn analyse_start_position(&self, depth: u32) -> Result<Evaluation, EngineError>;

    /// Ping the engine backend.
    async fn ping(&self) -> anyhow::Result<bool>;
}
