use std::time::Duration;

use atelier_core::change_tracker::DEFAULT_WARMUP;

use crate::error::{EditorError, EditorResult};

/// Editor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Base URL of the API, including the version prefix.
    pub api_url: String,
    /// How long after a section is mounted rich-text editor callbacks are
    /// ignored.
    pub warmup: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/v1".to_string(),
            warmup: DEFAULT_WARMUP,
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                        |
    /// |--------------------|--------------------------------|
    /// | `ATELIER_API_URL`  | `http://localhost:3000/api/v1` |
    /// | `EDITOR_WARMUP_MS` | `300`                          |
    pub fn from_env() -> EditorResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_values(
            std::env::var("ATELIER_API_URL").ok(),
            std::env::var("EDITOR_WARMUP_MS").ok(),
        )
    }

    fn from_values(api_url: Option<String>, warmup_ms: Option<String>) -> EditorResult<Self> {
        let defaults = Self::default();

        let api_url = api_url
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let warmup = match warmup_ms {
            Some(ms) => ms.trim().parse().map(Duration::from_millis).map_err(|_| {
                EditorError::Validation(format!(
                    "EDITOR_WARMUP_MS must be a whole number of milliseconds, got '{ms}'"
                ))
            })?,
            None => defaults.warmup,
        };

        Ok(Self { api_url, warmup })
    }
}
