//! Value Object Module

pub mod identity;
pub mod image;
pub mod price;
pub mod status;

pub use identity::{AuthState, Identity};
pub use image::ImagePayload;
pub use status::StatusReporter;
