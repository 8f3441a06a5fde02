//! Failure Classification
//!
//! Normalizes whatever an analysis collaborator reported into an
//! [`AnalysisError`] whose message is safe to show. Raw transport text
//! (hostnames, endpoint paths, provider version strings) never passes
//! through.

use crate::error::{AnalysisError, AnalysisFailure};

/// Shown for anything we cannot explain without leaking internals
pub const GENERIC_MESSAGE: &str = "Something went wrong while analyzing your photo. Please try again.";

/// Shown for retryable network and timeout failures
pub const RETRY_MESSAGE: &str =
    "We couldn't reach the analysis service. Check your connection and try again.";

/// Longer messages are assumed to be dumps, not sentences for people
const MAX_PLAIN_MESSAGE_LEN: usize = 160;

const TRANSIENT_MARKERS: &[&str] = &[
    "network request failed",
    "network error",
    "timed out",
    "timeout",
    "failed to fetch",
    "connection refused",
    "connection reset",
    "econnreset",
    "socket hang up",
    "offline",
    "service unavailable",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "deployment",
    "api version",
    "endpoint",
    "azure",
    "openai",
    "model",
    "token",
    "quota",
    "billing",
    "api key",
    "json",
    "status code",
    "exception",
    "traceback",
    "ssl",
    "tls",
    "dns",
    "internal server",
];

const USER_QUOTA_MARKERS: &[&str] = &[
    "quota exceeded",
    "no creations remaining",
    "daily limit",
    "out of credits",
];

/// Map a raw failure onto the user-facing taxonomy
pub fn classify_failure(failure: &AnalysisFailure) -> AnalysisError {
    match failure {
        AnalysisFailure::Cancelled => AnalysisError::Cancelled,
        AnalysisFailure::Quota(_) => AnalysisError::QuotaExceeded,
        AnalysisFailure::Timeout | AnalysisFailure::Network(_) => AnalysisError::Transient {
            message: RETRY_MESSAGE.to_string(),
        },
        AnalysisFailure::Service(message) => classify_message(message),
    }
}

fn classify_message(message: &str) -> AnalysisError {
    let trimmed = message.trim();
    if is_transient_message(trimmed) {
        return AnalysisError::Transient {
            message: RETRY_MESSAGE.to_string(),
        };
    }
    if trimmed.is_empty() || is_technical_message(trimmed) {
        return AnalysisError::Unknown {
            message: GENERIC_MESSAGE.to_string(),
        };
    }
    let lower = trimmed.to_lowercase();
    if USER_QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
        return AnalysisError::QuotaExceeded;
    }
    AnalysisError::Unknown {
        message: trimmed.to_string(),
    }
}

/// Network or timeout wording
pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Structural heuristics for text that must not reach the user
///
/// Any of: a URL or `www.` host, a dated version string (`YYYY-MM-DD`),
/// two or more technical keywords, or excessive length.
pub fn is_technical_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    if lower.contains("://") || lower.contains("www.") {
        return true;
    }
    if contains_iso_date(&lower) {
        return true;
    }
    let keywords = TECHNICAL_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();
    keywords >= 2 || message.chars().count() > MAX_PLAIN_MESSAGE_LEN
}

fn contains_iso_date(text: &str) -> bool {
    const SHAPE: &[u8; 10] = b"dddd-dd-dd";
    text.as_bytes().windows(SHAPE.len()).any(|window| {
        window.iter().zip(SHAPE).all(|(byte, shape)| match shape {
            b'd' => byte.is_ascii_digit(),
            other => byte == other,
        })
    })
}
