use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::{
    config::ApiConfig,
    types::{health_check::HealthResponse, stockfish::StockfishTestResponse},
};

pub const HEALTH_PATH: &str = "/api/v1/health";
pub const STOCKFISH_PATH: &str = "/api/v1/stockfish";

/// The one way a backend call can fail. Network errors and non-2xx statuses
/// both arrive here untouched.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Shared HTTP client bound to the backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /api/v1/health
    pub async fn fetch_health(&self) -> Result<HealthResponse, ApiError> {
        self.get(HEALTH_PATH).await
    }

    /// GET /api/v1/stockfish
    pub async fn test_stockfish(&self) -> Result<StockfishTestResponse, ApiError> {
        self.get(STOCKFISH_PATH).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(body)
    }
}
