//! Listing Lifecycle Module
//!
//! Clean Architecture structure:
//! - `domain/` - Listing and quota entities, collaborator traits, pure rules
//! - `application/` - Quota tracking, analysis requests, migration, the listing facade
//! - `infra/` - Device storage, HTTP analysis client, in-memory backend
//!
//! ## Consistency Model
//! - The backend is the only authority on quota; the client caches the last
//!   successful fetch and uses it for pre-checks only
//! - Local-only listings reach an account exactly once, through migration
//!   on sign-in; reads never merge local and remote listings
//! - A local listing is deleted only after the backend confirmed its copy
//! - One analysis request is live per controller; a newer one supersedes it

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::analyze::{AnalysisController, AnalysisOptions, AnalysisOutcome, RequestStatus};
pub use application::config::ListingConfig;
pub use application::listings::ListingRepository;
pub use application::migrate::{MigrationCoordinator, MigrationResult};
pub use application::quota_tracker::{QuotaStatus, QuotaTracker};
pub use application::session::AuthContext;
pub use error::{AnalysisError, AnalysisFailure, ListingError, ListingResult};
pub use infra::local_store::LocalListingStore;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use kernel::fields::ListingFields;
    pub use kernel::id::{ListingId, UserId};
}
