//! Startup configuration.
//!
//! All settings are read from the environment exactly once, at startup, and
//! passed into component constructors. Nothing reads the environment
//! mid-request.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Vector store host (required).
    pub db_host: String,
    /// Vector store port (required).
    pub db_port: u16,
    /// Chroma collection holding the documentation corpus.
    pub collection: String,
    /// Ollama endpoint serving the embedding model and the local chat model.
    pub ollama_endpoint: String,
    /// Gemini API key; when absent the hosted backend is disabled.
    pub gemini_api_key: Option<String>,
    /// Budget for each of the expanding and retrieving stages, in seconds.
    pub stage_timeout_secs: u64,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_host = required("DB_HOST")?;
        let db_port = required("DB_PORT")?
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidVar("DB_PORT", e.to_string()))?;

        let collection =
            std::env::var("DOCRAG_COLLECTION").unwrap_or_else(|_| "golang_docs".to_string());
        let ollama_endpoint = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        let stage_timeout_secs = match std::env::var("DOCRAG_STAGE_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidVar("DOCRAG_STAGE_TIMEOUT_SECS", e.to_string()))?,
            Err(_) => 60,
        };

        Ok(Self {
            db_host,
            db_port,
            collection,
            ollama_endpoint,
            gemini_api_key,
            stage_timeout_secs,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment access is process-global, so the cases share one test.
    #[test]
    fn test_from_env() {
        std::env::remove_var("DB_HOST");
        std::env::remove_var("DB_PORT");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar("DB_HOST"))
        ));

        std::env::set_var("DB_HOST", "localhost");
        std::env::set_var("DB_PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidVar("DB_PORT", _))
        ));

        std::env::set_var("DB_PORT", "8000");
        std::env::remove_var("DOCRAG_COLLECTION");
        std::env::remove_var("OLLAMA_HOST");
        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("DOCRAG_STAGE_TIMEOUT_SECS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 8000);
        assert_eq!(config.collection, "golang_docs");
        assert_eq!(config.ollama_endpoint, "http://localhost:11434");
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.stage_timeout_secs, 60);
    }
}
