use std::env;
use std::path::PathBuf;

/// Prediction service configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    /// Coefficients file; the difference baseline is served when unset
    pub model_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
            model_path: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("SN7_API_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(defaults.port);

        let cors_origin = env::var("SN7_CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let model_path = env::var("SN7_MODEL_PATH").ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        Self { port, cors_origin, model_path }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
