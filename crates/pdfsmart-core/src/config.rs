//! Editor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default backend location when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend location.
pub const API_BASE_URL_ENV: &str = "PDFSMART_API_BASE_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "PDFSMART_REQUEST_TIMEOUT_SECS";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Smallest zoom factor the session accepts.
pub const MIN_ZOOM: f64 = 0.5;

/// Zoom factor of a fresh session ("100%").
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Increment applied by zoom-in / zoom-out.
pub const ZOOM_STEP: f64 = 0.1;

/// Runtime configuration for an [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Backend base URL, without trailing slash.
    pub api_base_url: String,
    /// Timeout applied to every backend request.
    pub request_timeout_secs: u64,
    /// Lower zoom bound. There is no upper bound.
    pub min_zoom: f64,
    /// Step used by zoom-in / zoom-out.
    pub zoom_step: f64,
    /// Zoom restored by reset.
    pub default_zoom: f64,
    /// Maximum number of snapshots kept; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            min_zoom: MIN_ZOOM,
            zoom_step: ZOOM_STEP,
            default_zoom: DEFAULT_ZOOM,
            history_limit: None,
        }
    }
}

impl EditorConfig {
    /// Defaults overridden by `PDFSMART_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            config = config.with_api_base_url(url);
        }
        if let Ok(raw) = std::env::var(REQUEST_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid {}: {:?}", REQUEST_TIMEOUT_ENV, raw),
            }
        }
        config
    }

    /// Replace the base URL, trimming any trailing slash.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            log::warn!("Empty API base URL, keeping {}", self.api_base_url);
        } else {
            self.api_base_url = trimmed.to_string();
        }
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
