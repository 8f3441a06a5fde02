//! Listing Error Types
//!
//! Two families live here:
//! - [`ListingError`]: persistence and backend failures of the listing
//!   lifecycle, integrated with `kernel::error::AppError`
//! - [`AnalysisFailure`] / [`AnalysisError`]: the raw failure an analysis
//!   collaborator reports and the normalized, user-presentable outcome

use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::ListingId;
use platform::kv::KvError;
use thiserror::Error;

/// Listing-specific result type alias
pub type ListingResult<T> = Result<T, ListingError>;

/// Action offered whenever a quota blocks the user
pub const UPGRADE_ACTION: &str = "Upgrade to Pro or wait for tomorrow's refill";

/// Listing lifecycle errors
#[derive(Debug, Error)]
pub enum ListingError {
    /// Listing violates an entity invariant (e.g. no image reference)
    #[error("Invalid listing: {0}")]
    InvalidListing(String),

    /// No listing with this id in the addressed store
    #[error("Listing not found: {0}")]
    NotFound(ListingId),

    /// Operation on an account-backed listing while signed out
    #[error("Not signed in")]
    NotAuthenticated,

    /// Backend refused or would refuse the save
    #[error("No save slots remaining")]
    SaveSlotsExhausted,

    /// Image could not be read from the device
    #[error("Image unreadable: {0}")]
    Image(String),

    /// Device storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend could not be reached
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend answered with an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Client could not be constructed from its configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ListingError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListingError::InvalidListing(_) => ErrorKind::BadRequest,
            ListingError::NotFound(_) => ErrorKind::NotFound,
            ListingError::NotAuthenticated => ErrorKind::Unauthenticated,
            ListingError::SaveSlotsExhausted => ErrorKind::QuotaExceeded,
            ListingError::Image(_) | ListingError::Storage(_) | ListingError::Serialization(_) => {
                ErrorKind::Storage
            }
            ListingError::BackendUnavailable(_) => ErrorKind::Transient,
            ListingError::Backend(_) | ListingError::Configuration(_) => ErrorKind::Unknown,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ListingError::Storage(e) => {
                tracing::error!(error = %e, "Listing storage error");
            }
            ListingError::Serialization(e) => {
                tracing::error!(error = %e, "Listing serialization error");
            }
            ListingError::Backend(msg) => {
                tracing::error!(message = %msg, "Listing backend error");
            }
            ListingError::BackendUnavailable(msg) => {
                tracing::warn!(message = %msg, "Listing backend unavailable");
            }
            ListingError::SaveSlotsExhausted => {
                tracing::info!("Save blocked: no save slots remaining");
            }
            _ => {
                tracing::debug!(error = %self, "Listing error");
            }
        }
    }
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        let kind = err.kind();
        match err {
            ListingError::SaveSlotsExhausted => {
                AppError::quota_exceeded("You've used all of your free save slots.")
                    .with_action(UPGRADE_ACTION)
            }
            ListingError::InvalidListing(ref msg) => AppError::bad_request(msg.clone()),
            ListingError::NotAuthenticated => {
                AppError::unauthenticated("Sign in to change listings saved to your account.")
                    .with_action("Sign in")
            }
            ListingError::BackendUnavailable(_) => {
                AppError::transient("Couldn't reach the server. Please try again.").with_source(err)
            }
            // Transport and storage details stay in the source, never in the message
            other => AppError::from_kind(kind).with_source(other),
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Raw failure reported by an analysis collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisFailure {
    /// No answer within the allowed time
    #[error("analysis timed out")]
    Timeout,

    /// Transport-level failure (connect, reset, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// The service refused because the user's creation quota is used up
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The collaborator observed cancellation
    #[error("analysis cancelled")]
    Cancelled,

    /// Any other error, carrying the service's own message
    #[error("{0}")]
    Service(String),
}

/// Normalized analysis outcome error
///
/// Messages are always safe to show: they never contain endpoints,
/// provider names or version strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Hard stop; the user must upgrade or wait
    #[error("creation quota exceeded")]
    QuotaExceeded,

    /// User-initiated or superseded; silent
    #[error("analysis cancelled")]
    Cancelled,

    /// Retryable
    #[error("{message}")]
    Transient { message: String },

    /// Everything else
    #[error("{message}")]
    Unknown { message: String },
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::QuotaExceeded => ErrorKind::QuotaExceeded,
            AnalysisError::Cancelled => ErrorKind::Cancelled,
            AnalysisError::Transient { .. } => ErrorKind::Transient,
            AnalysisError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Text for the user-facing error surface
    pub fn user_message(&self) -> &str {
        match self {
            AnalysisError::QuotaExceeded => ErrorKind::QuotaExceeded.default_user_message(),
            AnalysisError::Cancelled => ErrorKind::Cancelled.default_user_message(),
            AnalysisError::Transient { message } | AnalysisError::Unknown { message } => message,
        }
    }

    /// Follow-up the UI should offer
    pub fn action(&self) -> Option<&'static str> {
        match self {
            AnalysisError::QuotaExceeded => Some(UPGRADE_ACTION),
            AnalysisError::Transient { .. } | AnalysisError::Unknown { .. } => Some("Try again"),
            AnalysisError::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let app = AppError::new(err.kind(), err.user_message().to_string());
        match err.action() {
            Some(action) => app.with_action(action),
            None => app,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_listing_error_kinds() {
        assert_eq!(ListingError::NotAuthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(ListingError::SaveSlotsExhausted.kind(), ErrorKind::QuotaExceeded);
        assert_eq!(
            ListingError::BackendUnavailable("dns".into()).kind(),
            ErrorKind::Transient
        );
    }

    #[test]
    fn test_backend_details_do_not_reach_app_message() {
        let err = ListingError::Backend("POST https://api.example.com/v1 returned 500".into());
        let app: AppError = err.into();
        assert!(!app.message().contains("https://"));
        assert_eq!(app.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_signed_out_and_offline_are_presentable() {
        let app: AppError = ListingError::NotAuthenticated.into();
        assert_eq!(app.status_code(), 401);
        assert_eq!(app.action(), Some("Sign in"));

        let app: AppError = ListingError::BackendUnavailable("dns lookup failed".into()).into();
        assert_eq!(app.kind(), ErrorKind::Transient);
        assert!(app.is_retryable());
        assert!(!app.message().contains("dns"));
        assert!(app.source().is_some());
    }

    #[test]
    fn test_save_slots_offers_upgrade() {
        let app: AppError = ListingError::SaveSlotsExhausted.into();
        assert_eq!(app.kind(), ErrorKind::QuotaExceeded);
        assert_eq!(app.action(), Some(UPGRADE_ACTION));
    }

    #[test]
    fn test_analysis_error_conversion() {
        let app: AppError = AnalysisError::QuotaExceeded.into();
        assert_eq!(app.status_code(), 402);
        assert_eq!(app.action(), Some(UPGRADE_ACTION));

        let app: AppError = AnalysisError::Cancelled.into();
        assert!(app.is_cancelled());
        assert!(app.action().is_none());
    }
}
