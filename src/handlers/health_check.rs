use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::{state::AppState, types::health_check::RootResponse};

/// GET /
pub async fn root_handler(State(svc): State<Arc<AppState>>) -> impl IntoResponse {
    Json(RootResponse {
        message: format!("{} backend running", svc.config.app_name),
    })
}

/// GET /api/v1/health
pub async fn health_check_handler(State(svc): State<Arc<AppState>>) -> impl IntoResponse {
    match svc.health_check.health_check().await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
        )
            .into_response(),
    }
}
