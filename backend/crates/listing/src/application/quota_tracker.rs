//! Quota Tracker
//!
//! Client-side view of the backend's quota counters. The backend is the
//! only authority: the cached value is replaced by successful fetches and
//! never adjusted locally. Pre-checks built on it only avoid obviously
//! wasted calls; the server may still refuse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::application::config::ListingConfig;
use crate::domain::entity::Quota;
use crate::domain::repository::QuotaService;
use crate::domain::value_object::AuthState;

/// Outcome of a quota fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStatus {
    Available(Quota),
    /// Transport or parse failure; callers must not block the user on it
    Unavailable,
}

impl QuotaStatus {
    pub fn quota(&self) -> Option<&Quota> {
        match self {
            QuotaStatus::Available(quota) => Some(quota),
            QuotaStatus::Unavailable => None,
        }
    }

    /// Hard block for analysis; fail-open when unavailable
    pub fn blocks_creation(&self) -> bool {
        self.quota().is_some_and(|q| !q.can_create())
    }

    /// Hard block for saving to the account; fail-open when unavailable
    pub fn blocks_save(&self) -> bool {
        self.quota().is_some_and(|q| !q.can_save())
    }

    /// Non-blocking low-quota nudge
    pub fn should_nudge(&self, threshold: u32) -> bool {
        self.quota().is_some_and(|q| q.is_low(threshold))
    }
}

#[derive(Debug, Default)]
struct Cache {
    /// Ticket of the fetch that produced `quota`
    ticket: u64,
    quota: Option<Quota>,
}

/// Quota Tracker
pub struct QuotaTracker<Q>
where
    Q: QuotaService,
{
    service: Arc<Q>,
    low_threshold: u32,
    next_ticket: AtomicU64,
    cache: Mutex<Cache>,
}

impl<Q> QuotaTracker<Q>
where
    Q: QuotaService,
{
    pub fn new(service: Arc<Q>, low_threshold: u32) -> Self {
        Self {
            service,
            low_threshold,
            next_ticket: AtomicU64::new(0),
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn from_config(service: Arc<Q>, config: &ListingConfig) -> Self {
        Self::new(service, config.low_quota_threshold)
    }

    /// Fetch the current counters from the backend
    ///
    /// Concurrent fetches may complete out of order; the cache keeps the
    /// response of the most recently started successful one.
    pub async fn fetch(&self, auth: &AuthState) -> QuotaStatus {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        match self.service.get(auth).await {
            Ok(quota) => {
                if !quota.is_consistent() {
                    tracing::warn!(
                        remaining = quota.creations_remaining_today,
                        daily_limit = quota.creations_daily_limit,
                        bonus = quota.bonus_creations_remaining,
                        "Backend quota exceeds daily limit plus bonus"
                    );
                }
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                if ticket > cache.ticket {
                    cache.ticket = ticket;
                    cache.quota = Some(quota);
                }
                tracing::debug!(
                    remaining = quota.creations_remaining_today,
                    save_slots = ?quota.save_slots_remaining,
                    is_pro = quota.is_pro,
                    "Fetched quota"
                );
                QuotaStatus::Available(quota)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Quota unavailable");
                QuotaStatus::Unavailable
            }
        }
    }

    /// Last successfully fetched counters
    pub fn cached(&self) -> Option<Quota> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .quota
    }

    /// Forget the cached counters (e.g. on sign-out)
    pub fn clear(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.ticket = self.next_ticket.load(Ordering::SeqCst);
        cache.quota = None;
    }

    pub fn can_create(quota: &Quota) -> bool {
        quota.can_create()
    }

    pub fn can_save(quota: &Quota) -> bool {
        quota.can_save()
    }

    pub fn is_low(&self, quota: &Quota) -> bool {
        quota.is_low(self.low_threshold)
    }

    pub fn low_threshold(&self) -> u32 {
        self.low_threshold
    }
}
