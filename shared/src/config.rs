use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    DEFAULT_API_BASE_URL, DEFAULT_END_REACHED_THRESHOLD, DEFAULT_FADE_MS, DEFAULT_HOLD_MS,
    DEFAULT_PER_PAGE, MAX_PER_PAGE,
};

/// How a fetched page is reconciled with the records already in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Drop the leading run of records at least as recent as the feed's
    /// oldest record. Cheap, but approximate.
    #[default]
    RecencyBoundary,
    /// Reject any id seen within the last `capacity` records.
    SeenIds { capacity: NonZeroUsize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeTiming {
    pub fade_ms: u64,
    pub hold_ms: u64,
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            fade_ms: DEFAULT_FADE_MS,
            hold_ms: DEFAULT_HOLD_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("per_page must be between 1 and {max}, got {value}")]
    PerPageOutOfRange { value: u32, max: u32 },
    #[error("invalid api base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("fade_ms must be > 0")]
    ZeroFade,
    #[error("end_reached_threshold must be finite and >= 0, got {0}")]
    InvalidThreshold(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub api_base_url: String,
    pub per_page: u32,
    pub fade: FadeTiming,
    /// Remaining content, in multiples of the visible length, below which
    /// the next page is requested.
    pub end_reached_threshold: f64,
    pub dedup: DedupStrategy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            fade: FadeTiming::default(),
            end_reached_threshold: DEFAULT_END_REACHED_THRESHOLD,
            dedup: DedupStrategy::default(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::PerPageOutOfRange {
                value: self.per_page,
                max: MAX_PER_PAGE,
            });
        }

        let parsed = Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.api_base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.fade.fade_ms == 0 {
            return Err(ConfigError::ZeroFade);
        }

        if !self.end_reached_threshold.is_finite() || self.end_reached_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.end_reached_threshold));
        }

        Ok(())
    }
}
