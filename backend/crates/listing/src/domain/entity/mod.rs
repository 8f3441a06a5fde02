//! Entity Module

pub mod listing;
pub mod preferences;
pub mod quota;

pub use listing::{Listing, ListingDraft, Visibility};
pub use preferences::Preferences;
pub use quota::Quota;
