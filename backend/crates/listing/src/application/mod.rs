//! Application Layer - Use Cases
//!
//! Orchestrates domain rules and the collaborator traits.

pub mod analyze;
pub mod config;
pub mod listings;
pub mod media;
pub mod migrate;
pub mod quota_tracker;
pub mod session;
