//! Application Configuration
//!
//! Configuration for the listing application layer.

use std::time::Duration;

/// Key of the local listings document
pub const LISTINGS_KEY: &str = "snapsell:listings";

/// Key of the preferences document
pub const PREFERENCES_KEY: &str = "snapsell:preferences";

/// Listing application configuration
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Storage key of the local listings collection
    pub listings_key: String,
    /// Storage key of the user's listing defaults
    pub preferences_key: String,
    /// Remaining creations at or below which the UI nudges
    pub low_quota_threshold: u32,
    /// Upper bound for a single analysis call
    pub analysis_timeout: Duration,
    /// Currency used when the caller passes none
    pub default_currency: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            listings_key: LISTINGS_KEY.to_string(),
            preferences_key: PREFERENCES_KEY.to_string(),
            low_quota_threshold: 2,
            analysis_timeout: Duration::from_secs(90),
            default_currency: "$".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn with_low_quota_threshold(mut self, threshold: u32) -> Self {
        self.low_quota_threshold = threshold;
        self
    }
}
