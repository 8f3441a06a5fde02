//! Listing Fields
//!
//! The structured result of analysing one photo. This is the payload the
//! vision API answers with and the input the client turns into a listing.

use serde::{Deserialize, Serialize};

/// Fields inferred from a photo
///
/// `price` stays a display string here ("45", "1,200.00"); conversion to
/// minor units happens when a listing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFields {
    pub title: String,
    pub price: String,
    pub description: String,
    pub condition: String,
    pub location: String,
    pub brand: String,
    pub pickup_available: bool,
    pub shipping_available: bool,
    pub pickup_notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_camel_case() {
        let fields = ListingFields {
            pickup_available: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["pickupAvailable"], true);
        assert_eq!(json["shippingAvailable"], false);
        assert_eq!(json["pickupNotes"], "");
    }

    #[test]
    fn test_missing_fields_default() {
        let fields: ListingFields = serde_json::from_str(r#"{"title":"Desk lamp"}"#).unwrap();
        assert_eq!(fields.title, "Desk lamp");
        assert!(fields.price.is_empty());
        assert!(!fields.shipping_available);
    }
}
