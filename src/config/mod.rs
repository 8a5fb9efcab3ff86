use serde::Deserialize;
use std::{env, time::Duration};

/// Local development backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Frontend dev server origins allowed by CORS unless overridden.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    Stockfish,
    Fixed,
}

impl Default for EngineBackend {
    fn default() -> Self {
        EngineBackend::Stockfish
    }
}

/// Backend server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The app port
    pub port: u16,

    /// The app address
    pub app_address: String,

    /// Metric PORT
    pub metrics_port: u16,

    /// The metrics address
    pub metrics_address: String,

    pub app_name: String,

    /// Deployment environment label, e.g. `development`
    pub environment: String,

    /// The engine backend
    pub engine_backend: EngineBackend,

    /// Path of the UCI engine binary
    pub stockfish_path: String,

    /// Search depth used for the stockfish test analysis
    pub engine_depth: u32,

    /// Upper bound on one engine analysis
    pub engine_timeout: Duration,

    /// Centipawn score reported by the fixed engine
    pub engine_fixed_score: i32,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&lookup, "PORT", 8000u16)?;
        let metrics_port = parse_or(&lookup, "METRICS_PORT", 3312u16)?;
        let app_address = format!("0.0.0.0:{}", port);
        let metrics_address = format!("0.0.0.0:{}", metrics_port);

        let engine_backend = match lookup("ENGINE_BACKEND")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "stockfish" | "" => EngineBackend::Stockfish,
            "fixed" => EngineBackend::Fixed,
            other => anyhow::bail!("Invalid ENGINE_BACKEND value: {}", other),
        };

        tracing::info!("Start with engine backend {:?}", engine_backend);

        let engine_depth = parse_or(&lookup, "ENGINE_DEPTH", 10u32)?;
        if engine_depth == 0 {
            anyhow::bail!("ENGINE_DEPTH must be at least 1");
        }

        let cors_origins: Vec<String> = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        // credentialed CORS cannot use a wildcard origin
        if cors_origins.iter().any(|origin| origin == "*") {
            anyhow::bail!("Invalid CORS_ORIGINS value: wildcard `*` is not allowed with credentials");
        }

        let engine_timeout_secs = parse_or(&lookup, "ENGINE_TIMEOUT_SECS", 30u64)?;
        if engine_timeout_secs == 0 {
            anyhow::bail!("ENGINE_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            port,
            app_address,
            metrics_port,
            metrics_address,
            app_name: lookup("APP_NAME").unwrap_or_else(|| "ChessInsight".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            engine_backend,
            stockfish_path: lookup("STOCKFISH_PATH")
                .unwrap_or_else(|| "/usr/bin/stockfish".to_string()),
            engine_depth,
            engine_timeout: Duration::from_secs(engine_timeout_secs),
            engine_fixed_score: parse_or(&lookup, "ENGINE_FIXED_SCORE", 0i32)?,
            cors_origins,
        })
    }
}

/// Frontend configuration: where the backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup("API_URL").filter(|url| !url.trim().is_empty()) {
            Some(base_url) => Self { base_url },
            None => Self::default(),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("Invalid {key} value {raw:?}: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_api_url_defaults_to_local_backend() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_api_url_override() {
        let config = ApiConfig::from_lookup(lookup_from(&[("API_URL", "http://api:9000")]));
        assert_eq!(config.base_url, "http://api:9000");

        let blank = ApiConfig::from_lookup(lookup_from(&[("API_URL", "  ")]));
        assert_eq!(blank, ApiConfig::default());
    }

    #[test]
    fn test_server_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.app_address, "0.0.0.0:8000");
        assert_eq!(config.app_name, "ChessInsight");
        assert_eq!(config.environment, "development");
        assert_eq!(config.engine_backend, EngineBackend::Stockfish);
        assert_eq!(config.stockfish_path, "/usr/bin/stockfish");
        assert_eq!(config.engine_depth, 10);
        assert_eq!(config.engine_timeout, Duration::from_secs(30));
        assert_eq!(config.cors_origins, DEFAULT_CORS_ORIGINS);
    }

    #[test]
    fn test_server_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9001"),
            ("ENGINE_BACKEND", "Fixed"),
            ("ENGINE_FIXED_SCORE", "-42"),
            ("CORS_ORIGINS", "http://a.test, ,http://b.test"),
        ]))
        .unwrap();

        assert_eq!(config.app_address, "0.0.0.0:9001");
        assert_eq!(config.engine_backend, EngineBackend::Fixed);
        assert_eq!(config.engine_fixed_score, -42);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ENGINE_BACKEND", "lc0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ENGINE_DEPTH", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ENGINE_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CORS_ORIGINS", "*")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CORS_ORIGINS", "http://a.test, *")])).is_err());
    }
}
