//! Collaborator Traits
//!
//! Interfaces to everything outside the core: the analysis model, the
//! account backend, the quota service, the auth provider and the device
//! media library. Implementations live in the infrastructure layer.

use kernel::fields::ListingFields;
use kernel::id::ListingId;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::domain::entity::{Listing, ListingDraft, Quota};
use crate::domain::value_object::{AuthState, Identity, ImagePayload, StatusReporter};
use crate::error::{AnalysisFailure, ListingResult};

/// Remote image analysis
#[trait_variant::make(AnalysisService: Send)]
pub trait LocalAnalysisService {
    /// Turn a photo into listing fields
    ///
    /// May take several seconds. Implementations should observe `cancel`
    /// and return [`AnalysisFailure::Cancelled`] early, and may push
    /// progress text through `status`.
    async fn analyze(
        &self,
        image: &ImagePayload,
        currency: &str,
        cancel: &CancellationToken,
        status: &StatusReporter,
    ) -> Result<ListingFields, AnalysisFailure>;
}

/// Account-backed listing storage
#[trait_variant::make(ListingBackend: Send)]
pub trait LocalListingBackend {
    /// All listings of the signed-in user
    async fn list(&self, identity: &Identity) -> ListingResult<Vec<Listing>>;

    /// Persist a draft, consuming one save slot; returns the backend id
    async fn create(&self, identity: &Identity, draft: &ListingDraft) -> ListingResult<ListingId>;

    /// Replace the content of an existing listing
    async fn update(&self, identity: &Identity, listing: &Listing) -> ListingResult<()>;

    async fn delete(&self, identity: &Identity, id: &ListingId) -> ListingResult<()>;

    /// Store image bytes; returns the storage path
    async fn upload_image(
        &self,
        identity: &Identity,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ListingResult<String>;
}

/// Backend quota counters
#[trait_variant::make(QuotaService: Send)]
pub trait LocalQuotaService {
    async fn get(&self, auth: &AuthState) -> ListingResult<Quota>;
}

/// Remote authentication provider
#[trait_variant::make(AuthProvider: Send)]
pub trait LocalAuthProvider {
    /// Identity of the current session, if any
    async fn current_user(&self) -> Option<Identity>;

    /// State-change events: `Some` on sign-in or refresh, `None` on sign-out
    fn events(&self) -> broadcast::Receiver<Option<Identity>>;
}

/// Device media access
#[trait_variant::make(ImageReader: Send)]
pub trait LocalImageReader {
    async fn read(&self, uri: &str) -> ListingResult<ImagePayload>;
}
