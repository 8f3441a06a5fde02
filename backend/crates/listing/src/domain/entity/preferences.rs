//! Preferences Entity

use serde::{Deserialize, Serialize};

/// Listing defaults the user set once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub currency: String,
    pub location: String,
    pub pickup_available: bool,
    pub shipping_available: bool,
    pub pickup_notes: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: "$".to_string(),
            location: String::new(),
            pickup_available: false,
            shipping_available: false,
            pickup_notes: String::new(),
        }
    }
}
