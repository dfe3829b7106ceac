//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDER_DESK_API_URL` - Base URL of the orders backend
//!
//! ## Optional
//! - `ORDER_DESK_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDER_DESK_PORT` - Listen port (default: 3001)
//! - `ORDER_DESK_BASE_URL` - Public URL of the dashboard (default: `http://{host}:{port}`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)
//!
//! ## Optional (TLS)
//! - `ORDER_DESK_TLS_CERT` - PEM-encoded certificate chain
//! - `ORDER_DESK_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Normalized backend base URL (no trailing slash, no `/api`)
    pub api_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ORDER_DESK_TLS_CERT");
        let key_pem = get_optional_env("ORDER_DESK_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ORDER_DESK_TLS_*".to_string(),
                "Both ORDER_DESK_TLS_CERT and ORDER_DESK_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl DeskConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ORDER_DESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDER_DESK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ORDER_DESK_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDER_DESK_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("ORDER_DESK_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", SocketAddr::new(host, port)));

        let api_url = normalize_api_url(&get_required_env("ORDER_DESK_API_URL")?);
        url::Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ORDER_DESK_API_URL".to_string(), e.to_string())
        })?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            api_url,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Minimal configuration pointing at `api_url`, for tests and embedding.
    #[must_use]
    pub fn for_backend(api_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://127.0.0.1:3001".to_string(),
            api_url: normalize_api_url(api_url),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the dashboard is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Normalise the backend URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/api` segment (routes already carry it)
#[must_use]
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if let Some(stripped) = url.strip_suffix("/api") {
        url = stripped.to_string();
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slash_and_api() {
        assert_eq!(
            normalize_api_url("https://orders.example.com/api/"),
            "https://orders.example.com"
        );
        assert_eq!(
            normalize_api_url("https://orders.example.com///"),
            "https://orders.example.com"
        );
    }

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(normalize_api_url("localhost:5000"), "http://localhost:5000");
        assert_eq!(normalize_api_url("127.0.0.1:5000/"), "http://127.0.0.1:5000");
        assert_eq!(
            normalize_api_url("abcd.ngrok-free.app"),
            "https://abcd.ngrok-free.app"
        );
    }

    #[test]
    fn test_normalize_keeps_path_prefix() {
        assert_eq!(
            normalize_api_url("https://example.com/shop"),
            "https://example.com/shop"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = DeskConfig::for_backend("http://localhost:5000");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert_eq!(config.api_url, "http://localhost:5000");
    }

    #[test]
    fn test_is_secure_follows_base_url() {
        let mut config = DeskConfig::for_backend("http://localhost:5000");
        assert!(!config.is_secure());
        config.base_url = "https://desk.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let config = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_secret_private_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_key"));
    }
}
