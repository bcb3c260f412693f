use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::favorites::DEFAULT_FAVORITES_KEY;
use crate::session::DEFAULT_SEARCH_DELAY;

/// Application configuration loaded explicitly from environment variables.
///
/// Redis URL is optional; if absent, favorites live only for the session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON corpus file.
    pub corpus_path: String,
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables persistence.
    pub redis_url: Option<String>,
    /// Debounce delay applied before a search runs.
    pub search_delay: Duration,
    /// Storage key of the favorites list.
    pub favorites_key: String,
}

impl Config {
    /// Required:
    /// - `KB_CORPUS_PATH`
    ///
    /// Optional:
    /// - `REDIS_URL`
    /// - `KB_SEARCH_DELAY_MS` (default: 300)
    /// - `KB_FAVORITES_KEY` (default: "knowledgebase-favorites")
    pub fn from_env() -> Result<Self, AppError> {
        let corpus_path = std::env::var("KB_CORPUS_PATH").map_err(|_| {
            AppError::Config("KB_CORPUS_PATH environment variable is required".to_string())
        })?;

        if !Path::new(&corpus_path).is_file() {
            return Err(AppError::Config(format!(
                "corpus file not found: {corpus_path}"
            )));
        }

        let search_delay = parse_delay_ms(std::env::var("KB_SEARCH_DELAY_MS").ok().as_deref())?;

        let favorites_key = std::env::var("KB_FAVORITES_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAVORITES_KEY.to_string());

        Ok(Self {
            corpus_path,
            redis_url: std::env::var("REDIS_URL").ok(),
            search_delay,
            favorites_key,
        })
    }

    pub fn corpus_file_path(&self) -> PathBuf {
        Path::new(&self.corpus_path).to_path_buf()
    }
}

fn parse_delay_ms(raw: Option<&str>) -> Result<Duration, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_SEARCH_DELAY),
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| AppError::Config(format!("KB_SEARCH_DELAY_MS must be milliseconds: {e}"))),
    }
}
