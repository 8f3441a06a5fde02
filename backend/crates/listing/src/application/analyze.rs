//! Analysis Request Controller
//!
//! Runs at most one analysis request at a time. Starting a new request
//! cancels the previous one, and a request that was superseded while in
//! flight always resolves to [`AnalysisError::Cancelled`], whatever the
//! collaborator answered.

use std::sync::{Arc, Mutex, PoisonError};

use derive_more::Display;
use kernel::fields::ListingFields;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::config::ListingConfig;
use crate::application::quota_tracker::QuotaTracker;
use crate::domain::repository::{AnalysisService, QuotaService};
use crate::domain::services::failure::classify_failure;
use crate::domain::value_object::{AuthState, ImagePayload, StatusReporter};
use crate::error::{AnalysisError, AnalysisFailure};

/// Result of one analysis request
pub type AnalysisOutcome = Result<ListingFields, AnalysisError>;

/// Lifecycle of the controller's current request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum RequestStatus {
    #[default]
    #[display("idle")]
    Idle,
    #[display("running")]
    Running,
    #[display("cancelled")]
    Cancelled,
    #[display("succeeded")]
    Succeeded,
    #[display("failed")]
    Failed,
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    auth: AuthState,
    currency: Option<String>,
    cancel: Option<CancellationToken>,
    status: Option<mpsc::UnboundedSender<String>>,
    check_quota: bool,
}

impl AnalysisOptions {
    pub fn new(auth: AuthState) -> Self {
        Self {
            auth,
            currency: None,
            cancel: None,
            status: None,
            check_quota: true,
        }
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Caller-owned token; cancelling it cancels the request
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Receiver of status text for this request
    pub fn status_sender(mut self, sender: mpsc::UnboundedSender<String>) -> Self {
        self.status = Some(sender);
        self
    }

    /// Skip the quota pre-check
    pub fn skip_quota_check(mut self) -> Self {
        self.check_quota = false;
        self
    }
}

#[derive(Debug, Default)]
struct Current {
    generation: u64,
    token: CancellationToken,
    status: RequestStatus,
}

/// Analysis Request Controller
pub struct AnalysisController<A, Q>
where
    A: AnalysisService,
    Q: QuotaService,
{
    service: Arc<A>,
    quota: Arc<QuotaTracker<Q>>,
    config: Arc<ListingConfig>,
    current: Mutex<Current>,
}

impl<A, Q> AnalysisController<A, Q>
where
    A: AnalysisService,
    Q: QuotaService,
{
    pub fn new(service: Arc<A>, quota: Arc<QuotaTracker<Q>>, config: Arc<ListingConfig>) -> Self {
        Self {
            service,
            quota,
            config,
            current: Mutex::new(Current::default()),
        }
    }

    /// Analyze `image`, superseding any request still running
    pub async fn start(&self, image: ImagePayload, options: AnalysisOptions) -> AnalysisOutcome {
        let AnalysisOptions {
            auth,
            currency,
            cancel,
            status,
            check_quota,
        } = options;

        let token = cancel.map(|t| t.child_token()).unwrap_or_default();
        let generation = {
            let mut current = self.lock();
            current.token.cancel();
            current.generation += 1;
            current.token = token.clone();
            current.status = RequestStatus::Running;
            current.generation
        };

        if check_quota && self.quota.fetch(&auth).await.blocks_creation() {
            tracing::info!("Analysis blocked: no creations remaining");
            return self.finish(generation, Err(AnalysisError::QuotaExceeded));
        }

        let currency = currency.unwrap_or_else(|| self.config.default_currency.clone());
        let reporter = status.map(StatusReporter::new).unwrap_or_default();
        tracing::debug!(generation, bytes = image.len(), "Starting analysis");

        let analysis = self.service.analyze(&image, &currency, &token, &reporter);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AnalysisFailure::Cancelled),
            answered = tokio::time::timeout(self.config.analysis_timeout, analysis) => {
                answered.unwrap_or(Err(AnalysisFailure::Timeout))
            }
        };
        // Let the collaborator stop any work it still has in flight
        token.cancel();

        let outcome = result.map_err(|failure| {
            let error = classify_failure(&failure);
            if !error.is_cancelled() {
                tracing::warn!(failure = %failure, kind = %error.kind(), "Analysis failed");
            }
            error
        });
        let outcome = self.finish(generation, outcome);

        if outcome.is_ok() {
            self.quota.fetch(&auth).await;
        }
        outcome
    }

    /// Cancel the request in flight, if any
    pub fn cancel(&self) {
        let current = self.lock();
        if current.status == RequestStatus::Running {
            tracing::debug!(generation = current.generation, "Cancelling analysis");
        }
        current.token.cancel();
    }

    /// Status of the most recently started request
    pub fn status(&self) -> RequestStatus {
        self.lock().status
    }

    fn finish(&self, generation: u64, outcome: AnalysisOutcome) -> AnalysisOutcome {
        let mut current = self.lock();
        if current.generation != generation {
            tracing::debug!(generation, "Discarding superseded analysis result");
            return Err(AnalysisError::Cancelled);
        }
        current.status = match &outcome {
            Ok(_) => RequestStatus::Succeeded,
            Err(AnalysisError::Cancelled) => RequestStatus::Cancelled,
            Err(_) => RequestStatus::Failed,
        };
        outcome
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_display() {
        assert_eq!(RequestStatus::Idle.to_string(), "idle");
        assert_eq!(RequestStatus::Succeeded.to_string(), "succeeded");
    }

    #[test]
    fn test_options_default_to_checking_quota() {
        let options = AnalysisOptions::new(AuthState::SignedOut);
        assert!(options.check_quota);
        assert!(!options.skip_quota_check().check_quota);
    }
}
