//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Listing, Quota, Preferences)
//! - Domain value objects (prices, image payloads, identities, status reporting)
//! - Domain services (failure classification, flavor messages)
//! - Collaborator traits (analysis, backend, quota, auth, image access)

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;
