//! Service configuration from environment variables (`.env` honored via
//! dotenvy at startup). Every knob has a default; invalid values fall back
//! with a warning instead of failing boot.

use std::env;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "phi:2.7b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_WATCHLIST_PATH: &str = "data/scam_watchlist.csv";
pub const DEFAULT_SCAM_LOG_PATH: &str = "data/detected_scams.csv";
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_timeout: Duration,
    pub watchlist_path: String,
    pub scam_log_path: String,
    pub default_country_code: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            watchlist_path: DEFAULT_WATCHLIST_PATH.to_string(),
            scam_log_path: DEFAULT_SCAM_LOG_PATH.to_string(),
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timeout_secs = match env::var("OLLAMA_TIMEOUT_SECS") {
            Ok(v) => v.parse::<u64>().unwrap_or_else(|_| {
                warn!(value = %v, "invalid OLLAMA_TIMEOUT_SECS; using default");
                DEFAULT_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            ollama_timeout: Duration::from_secs(timeout_secs),
            watchlist_path: env::var("WATCHLIST_PATH").unwrap_or(defaults.watchlist_path),
            scam_log_path: env::var("SCAM_LOG_PATH").unwrap_or(defaults.scam_log_path),
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or(defaults.default_country_code),
        }
    }
}
