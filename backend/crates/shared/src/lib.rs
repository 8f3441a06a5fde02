//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of SnapSell vocabulary:
//! - Common error types and result aliases
//! - Identifier types for listings and users
//! - The listing field set produced by photo analysis
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across the client core and the vision API.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod fields;
pub mod id;
