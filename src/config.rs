//! Application configuration loaded from environment variables.
//!
//! The store endpoint and its credentials are supplied by the environment
//! (Application Default Credentials, or `FIRESTORE_EMULATOR_HOST` locally).

use std::env;

/// Which Store Gateway backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Managed Firestore (or the emulator).
    Firestore,
    /// In-process store, state is lost on restart.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Store backend selection
    pub store_backend: StoreBackend,
    /// GCP project ID hosting the Firestore database
    pub gcp_project_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Institution e-mail domain (e.g. "bu.edu"). When set, signups from
    /// other domains are rejected and user ids are derived from the local part.
    pub institution_email_domain: Option<String>,
}

impl Config {
    /// Config for tests: in-memory store, no institution domain.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            institution_email_domain: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            institution_email_domain: env::var("INSTITUTION_EMAIL_DOMAIN")
                .ok()
                .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("INSTITUTION_EMAIL_DOMAIN", "@BU.edu");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.institution_email_domain.as_deref(), Some("bu.edu"));
        assert_eq!(config.port, 8080);

        env::remove_var("STORE_BACKEND");
        env::remove_var("INSTITUTION_EMAIL_DOMAIN");
    }

    #[test]
    fn test_store_backend_rejects_unknown() {
        assert!("postgres".parse::<StoreBackend>().is_err());
        assert_eq!(
            " Firestore ".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
    }
}
