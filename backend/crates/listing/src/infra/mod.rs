//! Infrastructure Layer
//!
//! Implementations of the collaborator traits and device persistence.

pub mod http_analysis;
pub mod image_reader;
pub mod local_store;
pub mod memory;
pub mod preferences_store;
