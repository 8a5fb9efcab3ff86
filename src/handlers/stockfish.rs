use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::{clients::engine::types::EngineError, state::AppState};

/// GET /api/v1/stockfish
pub async fn stockfish_handler(State(svc): State<Arc<AppState>>) -> impl IntoResponse {
    match svc.stockfish_svc.test_stockfish().await {
        Ok(resp) => Json(resp).into_response(),
        Err(err @ EngineError::Timeout(_)) => {
            (StatusCode::GATEWAY_TIMEOUT, err.to_string()).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
