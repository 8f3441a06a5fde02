//! Listing Repository Facade
//!
//! Single entry point for listing persistence. Every call is routed by the
//! caller's auth state (create, list) or by the id namespace (update,
//! delete). Local and account listings are never merged.

use std::sync::Arc;

use kernel::fields::ListingFields;
use kernel::id::ListingId;
use platform::kv::KeyValueStore;

use crate::application::config::ListingConfig;
use crate::application::media::upload_if_needed;
use crate::application::quota_tracker::QuotaTracker;
use crate::domain::entity::{Listing, ListingDraft, Preferences};
use crate::domain::repository::{ImageReader, ListingBackend, QuotaService};
use crate::domain::value_object::AuthState;
use crate::error::{ListingError, ListingResult};
use crate::infra::local_store::LocalListingStore;
use crate::infra::preferences_store::PreferencesStore;

/// Listing Repository Facade
pub struct ListingRepository<S, B, R, Q>
where
    S: KeyValueStore,
    B: ListingBackend,
    R: ImageReader,
    Q: QuotaService,
{
    local: Arc<LocalListingStore<S>>,
    preferences: PreferencesStore<S>,
    backend: Arc<B>,
    reader: Arc<R>,
    quota: Arc<QuotaTracker<Q>>,
}

impl<S, B, R, Q> ListingRepository<S, B, R, Q>
where
    S: KeyValueStore,
    B: ListingBackend,
    R: ImageReader,
    Q: QuotaService,
{
    pub fn new(
        kv: Arc<S>,
        local: Arc<LocalListingStore<S>>,
        backend: Arc<B>,
        reader: Arc<R>,
        quota: Arc<QuotaTracker<Q>>,
        config: &ListingConfig,
    ) -> Self {
        Self {
            local,
            preferences: PreferencesStore::new(kv, config.preferences_key.clone()),
            backend,
            reader,
            quota,
        }
    }

    /// Draft for a fresh analysis, with blanks filled from the user's
    /// preferences
    pub async fn draft_from_analysis(
        &self,
        fields: ListingFields,
        image_uri: impl Into<String>,
    ) -> ListingDraft {
        let preferences = self.preferences.load().await;
        ListingDraft::from_analysis(fields, preferences.currency.clone(), image_uri)
            .with_preferences(&preferences)
    }

    pub async fn preferences(&self) -> Preferences {
        self.preferences.load().await
    }

    pub async fn save_preferences(&self, preferences: &Preferences) -> ListingResult<()> {
        self.preferences
            .save(preferences)
            .await
            .inspect_err(ListingError::log)
    }

    /// Persist a new listing to the account when signed in, on the device
    /// otherwise
    pub async fn create(&self, mut draft: ListingDraft, auth: &AuthState) -> ListingResult<Listing> {
        draft.validate()?;

        let Some(identity) = auth.identity() else {
            let id = self.local.save(draft.clone()).await.inspect_err(ListingError::log)?;
            return Listing::new(id, draft);
        };

        if self.quota.fetch(auth).await.blocks_save() {
            let err = ListingError::SaveSlotsExhausted;
            err.log();
            return Err(err);
        }

        let result = async {
            upload_if_needed(&*self.backend, &*self.reader, identity, &mut draft).await?;
            let id = self.backend.create(identity, &draft).await?;
            Listing::new(id, draft)
        }
        .await
        .inspect_err(ListingError::log);

        // The server consumed a slot, or knows better why it refused
        self.quota.fetch(auth).await;
        let listing = result?;
        tracing::info!(listing_id = %listing.id, "Created account listing");
        Ok(listing)
    }

    /// Account listings when signed in, device listings otherwise
    pub async fn list(&self, auth: &AuthState) -> ListingResult<Vec<Listing>> {
        match auth.identity() {
            Some(identity) => self
                .backend
                .list(identity)
                .await
                .inspect_err(ListingError::log),
            None => Ok(self.local.load_all().await),
        }
    }

    /// Save user edits to an existing listing
    pub async fn update(&self, listing: Listing, auth: &AuthState) -> ListingResult<Listing> {
        listing.validate()?;
        if listing.id.is_local() {
            return self.local.update(&listing).await.inspect_err(ListingError::log);
        }

        let identity = auth.identity().ok_or(ListingError::NotAuthenticated)?;
        let mut draft = listing.to_draft();
        upload_if_needed(&*self.backend, &*self.reader, identity, &mut draft)
            .await
            .inspect_err(ListingError::log)?;

        let listing = Listing {
            storage_path: draft.storage_path,
            ..listing
        };
        self.backend
            .update(identity, &listing)
            .await
            .inspect_err(ListingError::log)?;
        Ok(listing)
    }

    /// Delete by id; device listings can be deleted in any auth state
    pub async fn delete(&self, id: &ListingId, auth: &AuthState) -> ListingResult<()> {
        if id.is_local() {
            return self.local.delete_by_id(id).await.inspect_err(ListingError::log);
        }
        let identity = auth.identity().ok_or(ListingError::NotAuthenticated)?;
        self.backend
            .delete(identity, id)
            .await
            .inspect_err(ListingError::log)
    }
}
