//! In-Memory Backend
//!
//! Account listing storage and quota counters kept in process. Used for
//! local development and tests; failures can be injected per operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use kernel::id::ListingId;

use crate::domain::entity::{Listing, ListingDraft, Quota};
use crate::domain::repository::{ListingBackend, QuotaService};
use crate::domain::value_object::{AuthState, Identity};
use crate::error::{ListingError, ListingResult};

#[derive(Debug, Default)]
struct BackendState {
    /// Listings per user id
    listings: HashMap<String, Vec<Listing>>,
    /// Storage path → byte length
    uploads: HashMap<String, usize>,
    next_id: u64,
}

/// Listing backend and quota service in one
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    quota: Mutex<Quota>,
    available: AtomicBool,
    fail_create_titles: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
    create_calls: AtomicUsize,
    upload_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(quota: Quota) -> Self {
        Self {
            state: Mutex::new(BackendState::default()),
            quota: Mutex::new(quota),
            available: AtomicBool::new(true),
            fail_create_titles: Mutex::new(HashSet::new()),
            fail_uploads: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
        }
    }

    /// Make every call fail as unreachable (or reachable again)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Refuse to create listings with this title
    pub fn fail_create_for(&self, title: impl Into<String>) {
        lock(&self.fail_create_titles).insert(title.into());
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_quota(&self, quota: Quota) {
        *lock(&self.quota) = quota;
    }

    pub fn quota(&self) -> Quota {
        *lock(&self.quota)
    }

    /// Spend one creation, as the analysis service does server-side
    pub fn consume_creation(&self) -> ListingResult<()> {
        let mut quota = lock(&self.quota);
        if quota.is_pro {
            return Ok(());
        }
        if quota.creations_remaining_today == 0 {
            return Err(ListingError::Backend("no creations remaining".into()));
        }
        // Remaining includes the bonus; the daily allowance is spent first
        quota.creations_remaining_today -= 1;
        quota.bonus_creations_remaining = quota
            .bonus_creations_remaining
            .min(quota.creations_remaining_today);
        Ok(())
    }

    pub fn listings_of(&self, identity: &Identity) -> Vec<Listing> {
        lock(&self.state)
            .listings
            .get(identity.user_id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> ListingResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ListingError::BackendUnavailable("backend offline".into()))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ListingBackend for InMemoryBackend {
    async fn list(&self, identity: &Identity) -> ListingResult<Vec<Listing>> {
        self.ensure_available()?;
        let mut listings = self.listings_of(identity);
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn create(&self, identity: &Identity, draft: &ListingDraft) -> ListingResult<ListingId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        if lock(&self.fail_create_titles).contains(&draft.title) {
            return Err(ListingError::Backend(format!("rejected listing {:?}", draft.title)));
        }
        if draft.storage_path.is_none() {
            return Err(ListingError::InvalidListing("image not uploaded".into()));
        }

        {
            let mut quota = lock(&self.quota);
            if !quota.is_pro {
                if let Some(slots) = quota.save_slots_remaining.as_mut() {
                    if *slots == 0 {
                        return Err(ListingError::SaveSlotsExhausted);
                    }
                    *slots -= 1;
                }
            }
        }

        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = ListingId::remote(format!("srv-{}", state.next_id))
            .map_err(|e| ListingError::Backend(e.to_string()))?;
        let mut listing = Listing::new(id.clone(), draft.clone())?;
        listing.image_uri = None;
        listing.image_url = listing
            .storage_path
            .as_ref()
            .map(|path| format!("memory://{path}"));
        state
            .listings
            .entry(identity.user_id.as_str().to_string())
            .or_default()
            .push(listing);
        Ok(id)
    }

    async fn update(&self, identity: &Identity, listing: &Listing) -> ListingResult<()> {
        self.ensure_available()?;
        let mut state = lock(&self.state);
        let slot = state
            .listings
            .get_mut(identity.user_id.as_str())
            .and_then(|listings| listings.iter_mut().find(|l| l.id == listing.id))
            .ok_or_else(|| ListingError::NotFound(listing.id.clone()))?;
        let created_at = slot.created_at;
        *slot = listing.clone();
        slot.created_at = created_at;
        Ok(())
    }

    async fn delete(&self, identity: &Identity, id: &ListingId) -> ListingResult<()> {
        self.ensure_available()?;
        let mut state = lock(&self.state);
        if let Some(listings) = state.listings.get_mut(identity.user_id.as_str()) {
            listings.retain(|l| &l.id != id);
        }
        Ok(())
    }

    async fn upload_image(
        &self,
        identity: &Identity,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ListingResult<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ListingError::Backend("upload rejected".into()));
        }
        let extension = mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .copied()
            .unwrap_or("bin");

        let mut state = lock(&self.state);
        state.next_id += 1;
        let path = format!(
            "{}/{}-{}.{extension}",
            identity.user_id,
            Utc::now().timestamp_millis(),
            state.next_id
        );
        state.uploads.insert(path.clone(), bytes.len());
        Ok(path)
    }
}

impl QuotaService for InMemoryBackend {
    async fn get(&self, _auth: &AuthState) -> ListingResult<Quota> {
        self.ensure_available()?;
        Ok(self.quota())
    }
}
