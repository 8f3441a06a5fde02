//! Migration Coordinator
//!
//! Moves listings made while signed out into the account that just signed
//! in. Each listing is uploaded, created remotely and only then deleted
//! locally, so a crash mid-run can at worst duplicate a listing on the next
//! run, never lose one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use derive_more::Display;
use platform::kv::KeyValueStore;
use tokio::task::JoinHandle;

use crate::application::media::{MediaStep, ensure_uploaded};
use crate::application::quota_tracker::QuotaTracker;
use crate::application::session::AuthContext;
use crate::domain::entity::Listing;
use crate::domain::repository::{ImageReader, ListingBackend, QuotaService};
use crate::domain::value_object::{AuthState, Identity};
use crate::error::ListingError;
use crate::infra::local_store::LocalListingStore;

/// Outcome of one migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationResult {
    pub migrated: usize,
    pub failed: usize,
    /// Nothing to do, or another run was already active
    pub skipped: bool,
}

impl MigrationResult {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Where a single listing's migration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MigrationStage {
    #[display("read_image")]
    ReadImage,
    #[display("upload_image")]
    UploadImage,
    #[display("create_listing")]
    CreateListing,
    #[display("delete_local")]
    DeleteLocal,
}

impl From<MediaStep> for MigrationStage {
    fn from(step: MediaStep) -> Self {
        match step {
            MediaStep::ReadImage => MigrationStage::ReadImage,
            MediaStep::UploadImage => MigrationStage::UploadImage,
        }
    }
}

/// Clears the active flag when a run ends, however it ends
struct ActiveRun<'a>(&'a AtomicBool);

impl<'a> ActiveRun<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Migration Coordinator
pub struct MigrationCoordinator<S, B, R>
where
    S: KeyValueStore,
    B: ListingBackend,
    R: ImageReader,
{
    store: Arc<LocalListingStore<S>>,
    backend: Arc<B>,
    reader: Arc<R>,
    active: AtomicBool,
}

impl<S, B, R> MigrationCoordinator<S, B, R>
where
    S: KeyValueStore,
    B: ListingBackend,
    R: ImageReader,
{
    pub fn new(store: Arc<LocalListingStore<S>>, backend: Arc<B>, reader: Arc<R>) -> Self {
        Self {
            store,
            backend,
            reader,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Drain the local store into `identity`'s account
    ///
    /// Never fails as a whole: per-listing failures are logged, counted and
    /// left in the local store for the next run.
    pub async fn run(&self, identity: &Identity) -> MigrationResult {
        let Some(_active) = ActiveRun::acquire(&self.active) else {
            tracing::info!("Migration already running, skipping");
            return MigrationResult::skipped();
        };

        let mut batch = self.store.load_all().await;
        if batch.is_empty() {
            return MigrationResult::skipped();
        }
        // Oldest first, so backend insertion order matches creation order
        batch.reverse();

        tracing::info!(user_id = %identity.user_id, count = batch.len(), "Migrating local listings");
        let mut result = MigrationResult::default();
        for listing in &batch {
            match self.migrate_one(identity, listing).await {
                Ok(()) => result.migrated += 1,
                Err((stage, e)) => {
                    result.failed += 1;
                    tracing::warn!(
                        local_id = %listing.id,
                        stage = %stage,
                        error = %e,
                        "Listing migration failed"
                    );
                }
            }
        }

        tracing::info!(
            user_id = %identity.user_id,
            migrated = result.migrated,
            failed = result.failed,
            "Migration finished"
        );
        result
    }

    async fn migrate_one(
        &self,
        identity: &Identity,
        listing: &Listing,
    ) -> Result<(), (MigrationStage, ListingError)> {
        let mut draft = listing.to_draft();
        ensure_uploaded(&*self.backend, &*self.reader, identity, &mut draft)
            .await
            .map_err(|e| (MigrationStage::from(e.step), e.source))?;

        let remote_id = self
            .backend
            .create(identity, &draft)
            .await
            .map_err(|e| (MigrationStage::CreateListing, e))?;

        // The remote copy exists; a failed local delete only risks a
        // duplicate on the next run
        if let Err(e) = self.store.delete_by_id(&listing.id).await {
            tracing::warn!(
                local_id = %listing.id,
                remote_id = %remote_id,
                stage = %MigrationStage::DeleteLocal,
                error = %e,
                "Migrated listing could not be removed locally"
            );
        }
        Ok(())
    }
}

impl<S, B, R> MigrationCoordinator<S, B, R>
where
    S: KeyValueStore + Sync + 'static,
    B: ListingBackend + Sync + 'static,
    R: ImageReader + Sync + 'static,
{
    /// Run a migration on every sign-in, then refresh the quota
    ///
    /// A session that is already signed in when the task starts counts as
    /// a sign-in. Sign-out clears the cached quota. The task ends when
    /// every handle to `auth` is dropped.
    pub fn spawn_on_sign_in<Q>(
        self: Arc<Self>,
        auth: &AuthContext,
        quota: Arc<QuotaTracker<Q>>,
    ) -> JoinHandle<()>
    where
        Q: QuotaService + Sync + 'static,
    {
        let mut changes = auth.subscribe();
        tokio::spawn(async move {
            let mut previous = AuthState::SignedOut;
            loop {
                let current = changes.borrow_and_update().clone();
                if let Some(identity) = current.signed_in_since(&previous) {
                    self.run(identity).await;
                    quota.fetch(&current).await;
                } else if previous.is_signed_in() && !current.is_signed_in() {
                    quota.clear();
                }
                previous = current;

                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
