//! Listing Entity
//!
//! A sellable-item draft, either stored on the device or in an account.

use chrono::{DateTime, Utc};
use kernel::fields::ListingFields;
use kernel::id::ListingId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::preferences::Preferences;
use crate::domain::value_object::price::parse_price_cents;
use crate::error::{ListingError, ListingResult};

/// Who can see a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Listing entity
///
/// Older device stores wrote camelCase keys; the aliases keep them readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "priceCents")]
    pub price_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, alias = "pickupAvailable")]
    pub pickup_available: bool,
    #[serde(default, alias = "shippingAvailable")]
    pub shipping_available: bool,
    #[serde(default, alias = "pickupNotes")]
    pub pickup_notes: String,
    /// Device-local image reference
    #[serde(default, alias = "imageUri", skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    /// Backend storage object path
    #[serde(default, alias = "storagePath", skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Backend-resolved URL for display
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_currency() -> String {
    "$".to_string()
}

impl Listing {
    /// Materialize a draft under `id`
    pub fn new(id: ListingId, draft: ListingDraft) -> ListingResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            price_cents: draft.price_cents,
            currency: draft.currency,
            condition: draft.condition,
            location: draft.location,
            brand: draft.brand,
            pickup_available: draft.pickup_available,
            shipping_available: draft.shipping_available,
            pickup_notes: draft.pickup_notes,
            image_uri: draft.image_uri,
            storage_path: draft.storage_path,
            image_url: None,
            created_at: draft.created_at,
            visibility: draft.visibility,
        })
    }

    /// Check the image invariant
    pub fn validate(&self) -> ListingResult<()> {
        if has_image(&self.image_uri, &self.storage_path) {
            Ok(())
        } else {
            Err(ListingError::InvalidListing(format!(
                "listing {} has no image reference",
                self.id
            )))
        }
    }

    /// Content of this listing as a draft, keeping `created_at`
    pub fn to_draft(&self) -> ListingDraft {
        ListingDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            price_cents: self.price_cents,
            currency: self.currency.clone(),
            condition: self.condition.clone(),
            location: self.location.clone(),
            brand: self.brand.clone(),
            pickup_available: self.pickup_available,
            shipping_available: self.shipping_available,
            pickup_notes: self.pickup_notes.clone(),
            image_uri: self.image_uri.clone(),
            storage_path: self.storage_path.clone(),
            created_at: self.created_at,
            visibility: self.visibility,
        }
    }
}

/// Listing content without an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub currency: String,
    pub condition: String,
    pub location: String,
    pub brand: String,
    pub pickup_available: bool,
    pub shipping_available: bool,
    pub pickup_notes: String,
    pub image_uri: Option<String>,
    pub storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub visibility: Visibility,
}

impl ListingDraft {
    /// Draft from a successful analysis of the photo at `image_uri`
    pub fn from_analysis(
        fields: ListingFields,
        currency: impl Into<String>,
        image_uri: impl Into<String>,
    ) -> Self {
        Self {
            price_cents: parse_price_cents(&fields.price),
            title: fields.title.trim().to_string(),
            description: fields.description.trim().to_string(),
            currency: currency.into(),
            condition: fields.condition,
            location: fields.location,
            brand: fields.brand,
            pickup_available: fields.pickup_available,
            shipping_available: fields.shipping_available,
            pickup_notes: fields.pickup_notes,
            image_uri: Some(image_uri.into()),
            storage_path: None,
            created_at: Utc::now(),
            visibility: Visibility::default(),
        }
    }

    /// Fill what the analysis left blank from the user's defaults
    pub fn with_preferences(mut self, preferences: &Preferences) -> Self {
        if self.location.trim().is_empty() {
            self.location = preferences.location.clone();
        }
        if self.pickup_notes.trim().is_empty() {
            self.pickup_notes = preferences.pickup_notes.clone();
        }
        self.pickup_available |= preferences.pickup_available;
        self.shipping_available |= preferences.shipping_available;
        self
    }

    pub fn has_image(&self) -> bool {
        has_image(&self.image_uri, &self.storage_path)
    }

    pub fn validate(&self) -> ListingResult<()> {
        if self.has_image() {
            Ok(())
        } else {
            Err(ListingError::InvalidListing(
                "a listing needs a photo".to_string(),
            ))
        }
    }
}

fn has_image(image_uri: &Option<String>, storage_path: &Option<String>) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    present(image_uri) || present(storage_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ListingFields {
        ListingFields {
            title: "  Oak side table ".into(),
            price: "45.50".into(),
            condition: "Used - Good".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_from_analysis() {
        let draft = ListingDraft::from_analysis(fields(), "$", "file:///photos/1.jpg");
        assert_eq!(draft.title, "Oak side table");
        assert_eq!(draft.price_cents, Some(4550));
        assert_eq!(draft.visibility, Visibility::Private);
        assert!(draft.has_image());
    }

    #[test]
    fn test_listing_requires_an_image() {
        let mut draft = ListingDraft::from_analysis(fields(), "$", "x.jpg");
        draft.image_uri = Some("  ".into());
        let err = Listing::new(ListingId::new_local(), draft.clone()).unwrap_err();
        assert!(matches!(err, ListingError::InvalidListing(_)));

        draft.storage_path = Some("user/abc.jpg".into());
        assert!(Listing::new(ListingId::new_local(), draft).is_ok());
    }

    #[test]
    fn test_preferences_fill_blanks_only() {
        let prefs = Preferences {
            location: "Portland".into(),
            pickup_available: true,
            ..Default::default()
        };
        let mut analysed = fields();
        analysed.location = "Seattle".into();

        let draft = ListingDraft::from_analysis(analysed, "$", "x.jpg").with_preferences(&prefs);
        assert_eq!(draft.location, "Seattle");
        assert!(draft.pickup_available);

        let draft = ListingDraft::from_analysis(fields(), "$", "x.jpg").with_preferences(&prefs);
        assert_eq!(draft.location, "Portland");
    }

    #[test]
    fn test_to_draft_keeps_created_at() {
        let draft = ListingDraft::from_analysis(fields(), "$", "x.jpg");
        let created_at = draft.created_at;
        let listing = Listing::new(ListingId::new_local(), draft).unwrap();
        assert_eq!(listing.to_draft().created_at, created_at);
    }

    #[test]
    fn test_reads_legacy_camel_case_record() {
        let json = r#"{
            "id": "local-1",
            "title": "Bike",
            "imageUri": "file:///bike.jpg",
            "pickupAvailable": true,
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert!(listing.id.is_local());
        assert_eq!(listing.image_uri.as_deref(), Some("file:///bike.jpg"));
        assert!(listing.pickup_available);
        assert_eq!(listing.currency, "$");
        assert_eq!(listing.visibility, Visibility::Private);
    }
}
