//! Application configuration loaded from environment variables.
//!
//! Upstream base URLs are read once at startup; there is no runtime
//! reconfiguration.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API (token issuer, user data, cadastral lookups)
    pub backend_api_url: String,
    /// Base URL of the intranet API (project listings)
    pub intranet_api_url: String,
    /// Public URL the frontend is served from (CORS origin, Secure-cookie policy)
    pub public_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, variables can be set via a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_api_url: env::var("BACKEND_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_API_URL"))?,
            intranet_api_url: env::var("INTRANET_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("INTRANET_API_URL"))?,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    /// Whether cookies must carry the `Secure` attribute.
    ///
    /// True when the portal is served over https (production).
    pub fn cookie_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            backend_api_url: "http://backend.invalid".to_string(),
            intranet_api_url: "http://intranet.invalid".to_string(),
            public_url: "http://localhost:3000".to_string(),
            port: 8080,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("BACKEND_API_URL", "http://localhost:8000/");
        env::set_var("INTRANET_API_URL", "http://localhost:9000");

        let config = Config::from_env().expect("Config should load");

        // Trailing slash is stripped for consistent URL building
        assert_eq!(config.backend_api_url, "http://localhost:8000");
        assert_eq!(config.intranet_api_url, "http://localhost:9000");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_cookie_secure_follows_public_url_scheme() {
        let mut config = Config::test_default();
        assert!(!config.cookie_secure());

        config.public_url = "https://portal.example.net".to_string();
        assert!(config.cookie_secure());
    }
}
