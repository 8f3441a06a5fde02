//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by the client core and the vision API.

use serde::Serialize;

/// Error classification
///
/// The first four variants form the user-facing taxonomy of the listing
/// flow (quota, cancellation, retryable, generic). The rest classify
/// request, storage and upstream failures. Every kind maps to an HTTP
/// status so the vision API can answer with it directly.
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::QuotaExceeded;
/// assert_eq!(kind.status_code(), 402);
/// assert!(!kind.is_retryable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Creation or save allowance used up
    QuotaExceeded,
    /// User-initiated cancellation, never shown as an error
    Cancelled,
    /// Network or timeout failure, safe to retry
    Transient,
    /// Anything else; shown with a generic message
    Unknown,
    /// 400 - malformed input
    BadRequest,
    /// 401 - an account is required
    Unauthenticated,
    /// 404 - resource not found
    NotFound,
    /// 500 - local persistence failed
    Storage,
    /// 502 - an upstream model or service answered with an error
    BadGateway,
}

impl ErrorKind {
    /// HTTP status code for this kind
    ///
    /// `Cancelled` uses the non-standard 499 (client closed request).
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::BadRequest.status_code(), 400);
    /// assert_eq!(ErrorKind::Transient.status_code(), 503);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::QuotaExceeded => 402,
            ErrorKind::NotFound => 404,
            ErrorKind::Cancelled => 499,
            ErrorKind::Unknown | ErrorKind::Storage => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::Transient => 503,
        }
    }

    /// Short human readable label
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::QuotaExceeded => "Quota Exceeded",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Transient => "Temporarily Unavailable",
            ErrorKind::Unknown => "Unknown Error",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Storage => "Storage Error",
            ErrorKind::BadGateway => "Bad Gateway",
        }
    }

    /// Message shown to users when nothing more specific is available.
    ///
    /// Never contains transport details.
    #[inline]
    pub const fn default_user_message(&self) -> &'static str {
        match self {
            ErrorKind::QuotaExceeded => "You've used all of today's listings.",
            ErrorKind::Cancelled => "Cancelled.",
            ErrorKind::Transient => {
                "We couldn't reach the listing service. Check your connection and try again."
            }
            ErrorKind::BadRequest => "That request didn't look right. Please try again.",
            ErrorKind::Unauthenticated => "Please sign in to continue.",
            ErrorKind::NotFound => "That listing no longer exists.",
            ErrorKind::Unknown | ErrorKind::Storage | ErrorKind::BadGateway => {
                "Something went wrong. Please try again."
            }
        }
    }

    /// Whether retrying the same operation can reasonably succeed
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::BadGateway)
    }

    /// Cancellation is silent: not logged as an error, not shown
    #[inline]
    pub const fn is_silent(&self) -> bool {
        matches!(self, ErrorKind::Cancelled)
    }

    /// 5xx kinds should be logged at error level
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Unauthenticated.status_code(), 401);
        assert_eq!(ErrorKind::QuotaExceeded.status_code(), 402);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Cancelled.status_code(), 499);
        assert_eq!(ErrorKind::Unknown.status_code(), 500);
        assert_eq!(ErrorKind::Storage.status_code(), 500);
        assert_eq!(ErrorKind::BadGateway.status_code(), 502);
        assert_eq!(ErrorKind::Transient.status_code(), 503);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(ErrorKind::BadGateway.is_retryable());
        assert!(!ErrorKind::QuotaExceeded.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }

    #[test]
    fn test_only_cancelled_is_silent() {
        assert!(ErrorKind::Cancelled.is_silent());
        assert!(!ErrorKind::Unknown.is_silent());
        assert!(!ErrorKind::Transient.is_silent());
    }

    #[test]
    fn test_default_messages_have_no_transport_details() {
        for kind in [
            ErrorKind::QuotaExceeded,
            ErrorKind::Transient,
            ErrorKind::Unknown,
            ErrorKind::BadGateway,
        ] {
            let message = kind.default_user_message();
            assert!(!message.contains("http"));
            assert!(!message.is_empty());
        }
    }
}
