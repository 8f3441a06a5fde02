//! Local Listing Store
//!
//! Listings created without an account live in one JSON document on the
//! device:
//!
//! ```json
//! {"version": 1, "listings": [ ... ]}
//! ```
//!
//! Older builds wrote a bare array; it is still read and becomes an
//! envelope on the next write. A document that cannot be decoded is copied
//! to `<key>:corrupt` before anything overwrites it.

use std::sync::Arc;

use kernel::id::ListingId;
use platform::kv::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::config::ListingConfig;
use crate::domain::entity::{Listing, ListingDraft};
use crate::error::{ListingError, ListingResult};

/// Envelope version written by this build
pub const STORE_VERSION: u32 = 1;

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Envelope { version: u32, listings: Vec<Listing> },
    Legacy(Vec<Listing>),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    listings: &'a [Listing],
}

enum Decoded {
    Listings(Vec<Listing>),
    Corrupt { raw: String, reason: String },
}

/// Local Listing Store
pub struct LocalListingStore<S>
where
    S: KeyValueStore,
{
    kv: Arc<S>,
    key: String,
    /// Held across every read-modify-write cycle
    write_lock: Mutex<()>,
}

impl<S> LocalListingStore<S>
where
    S: KeyValueStore,
{
    pub fn new(kv: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store under the configured listings key
    pub fn from_config(kv: Arc<S>, config: &ListingConfig) -> Self {
        Self::new(kv, config.listings_key.clone())
    }

    /// Store a new listing under a freshly generated local id
    pub async fn save(&self, draft: ListingDraft) -> ListingResult<ListingId> {
        draft.validate()?;
        let _guard = self.write_lock.lock().await;

        let mut listings = self.read_for_write().await?;
        let id = loop {
            let candidate = ListingId::new_local();
            if !listings.iter().any(|l| l.id == candidate) {
                break candidate;
            }
        };
        listings.push(Listing::new(id.clone(), draft)?);
        self.write(&listings).await?;

        tracing::debug!(local_id = %id, count = listings.len(), "Saved local listing");
        Ok(id)
    }

    /// Every stored listing, newest first
    ///
    /// An unreadable store yields an empty list.
    pub async fn load_all(&self) -> Vec<Listing> {
        let mut listings = match self.read().await {
            Ok(Decoded::Listings(listings)) => listings,
            Ok(Decoded::Corrupt { reason, .. }) => {
                tracing::error!(key = %self.key, reason = %reason, "Local listing store is corrupt");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "Failed to read local listings");
                Vec::new()
            }
        };
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listings
    }

    pub async fn get(&self, id: &ListingId) -> Option<Listing> {
        self.load_all().await.into_iter().find(|l| &l.id == id)
    }

    /// Replace the stored listing with the same id, keeping its `created_at`
    pub async fn update(&self, listing: &Listing) -> ListingResult<Listing> {
        listing.validate()?;
        let _guard = self.write_lock.lock().await;

        let mut listings = self.read_for_write().await?;
        let slot = listings
            .iter_mut()
            .find(|l| l.id == listing.id)
            .ok_or_else(|| ListingError::NotFound(listing.id.clone()))?;
        let created_at = slot.created_at;
        *slot = listing.clone();
        slot.created_at = created_at;
        let updated = slot.clone();
        self.write(&listings).await?;

        tracing::debug!(local_id = %listing.id, "Updated local listing");
        Ok(updated)
    }

    /// Remove a listing; unknown ids are not an error
    pub async fn delete_by_id(&self, id: &ListingId) -> ListingResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut listings = self.read_for_write().await?;
        let before = listings.len();
        listings.retain(|l| &l.id != id);
        if listings.len() == before {
            return Ok(());
        }
        self.write(&listings).await?;

        tracing::debug!(local_id = %id, "Deleted local listing");
        Ok(())
    }

    async fn read(&self) -> ListingResult<Decoded> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Decoded::Listings(Vec::new()));
        };
        if raw.trim().is_empty() {
            return Ok(Decoded::Listings(Vec::new()));
        }
        let decoded = match serde_json::from_str::<StoredDocument>(&raw) {
            Ok(StoredDocument::Envelope { version, listings }) if version <= STORE_VERSION => {
                Decoded::Listings(into_local_namespace(listings))
            }
            Ok(StoredDocument::Envelope { version, .. }) => Decoded::Corrupt {
                raw,
                reason: format!("unsupported version {version}"),
            },
            Ok(StoredDocument::Legacy(listings)) => Decoded::Listings(into_local_namespace(listings)),
            Err(e) => Decoded::Corrupt {
                raw,
                reason: e.to_string(),
            },
        };
        Ok(decoded)
    }

    /// Current listings for a mutation; a corrupt document is backed up
    /// and replaced by an empty collection
    async fn read_for_write(&self) -> ListingResult<Vec<Listing>> {
        match self.read().await? {
            Decoded::Listings(listings) => Ok(listings),
            Decoded::Corrupt { raw, reason } => {
                let backup_key = format!("{}:corrupt", self.key);
                self.kv.set(&backup_key, &raw).await?;
                tracing::error!(
                    key = %self.key,
                    backup = %backup_key,
                    reason = %reason,
                    "Local listing store is corrupt, starting over"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, listings: &[Listing]) -> ListingResult<()> {
        let document = serde_json::to_string(&EnvelopeRef {
            version: STORE_VERSION,
            listings,
        })?;
        self.kv.set(&self.key, &document).await?;
        Ok(())
    }
}

/// Everything on the device is local, whatever its stored id looks like
fn into_local_namespace(listings: Vec<Listing>) -> Vec<Listing> {
    listings
        .into_iter()
        .map(|listing| Listing {
            id: listing.id.clone().into_local(),
            ..listing
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use kernel::fields::ListingFields;
    use platform::kv::{FileKeyValueStore, MemoryKeyValueStore};

    const KEY: &str = "snapsell:listings";

    fn draft(title: &str, minutes_ago: i64) -> ListingDraft {
        let mut draft = ListingDraft::from_analysis(
            ListingFields {
                title: title.into(),
                ..Default::default()
            },
            "$",
            format!("file:///{title}.jpg"),
        );
        draft.created_at = Utc::now() - Duration::minutes(minutes_ago);
        draft
    }

    fn memory_store() -> (MemoryKeyValueStore, LocalListingStore<MemoryKeyValueStore>) {
        let kv = MemoryKeyValueStore::new();
        let store = LocalListingStore::new(Arc::new(kv.clone()), KEY);
        (kv, store)
    }

    #[tokio::test]
    async fn test_load_all_is_newest_first_with_distinct_ids() {
        let (_, store) = memory_store();
        let a = store.save(draft("a", 30)).await.unwrap();
        let b = store.save(draft("b", 10)).await.unwrap();
        let c = store.save(draft("c", 20)).await.unwrap();

        let listings = store.load_all().await;
        let ids: Vec<_> = listings.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec![b, c, a]);
        assert!(listings.iter().all(|l| l.id.is_local()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_, store) = memory_store();
        let id = store.save(draft("a", 0)).await.unwrap();
        store.delete_by_id(&id).await.unwrap();
        store.delete_by_id(&id).await.unwrap();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let (_, store) = memory_store();
        let id = store.save(draft("a", 60)).await.unwrap();
        let mut listing = store.get(&id).await.unwrap();
        let created_at = listing.created_at;

        listing.title = "Renamed".into();
        listing.created_at = Utc::now();
        let updated = store.update(&listing).await.unwrap();
        assert_eq!(updated.created_at, created_at);
        assert_eq!(store.get(&id).await.unwrap().title, "Renamed");

        listing.id = ListingId::new_local();
        assert!(matches!(
            store.update(&listing).await,
            Err(ListingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_draft_without_image() {
        let (_, store) = memory_store();
        let mut bad = draft("a", 0);
        bad.image_uri = None;
        assert!(matches!(
            store.save(bad).await,
            Err(ListingError::InvalidListing(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_legacy_array_and_rewrites_envelope() {
        let (kv, store) = memory_store();
        kv.insert_raw(
            KEY,
            r#"[{"id":"local-old","title":"Lamp","imageUri":"file:///lamp.jpg","createdAt":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        assert_eq!(store.load_all().await.len(), 1);
        store.save(draft("new", 0)).await.unwrap();

        let raw = kv.get(KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["listings"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unprefixed_legacy_id_stays_local() {
        let (kv, store) = memory_store();
        kv.insert_raw(
            KEY,
            r#"[{"id":"1700000000000","title":"Lamp","imageUri":"file:///lamp.jpg","createdAt":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let listings = store.load_all().await;
        assert_eq!(listings.len(), 1);
        assert!(listings[0].id.is_local());
        assert_eq!(listings[0].id.as_str(), "local-1700000000000");

        store.delete_by_id(&listings[0].id).await.unwrap();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_degrades_and_is_backed_up() {
        let (kv, store) = memory_store();
        kv.insert_raw(KEY, "{not json").unwrap();
        assert!(store.load_all().await.is_empty());

        store.save(draft("a", 0)).await.unwrap();
        assert_eq!(
            kv.get("snapsell:listings:corrupt").await.unwrap().as_deref(),
            Some("{not json")
        );
        assert_eq!(store.load_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_newer_version_is_not_read() {
        let (kv, store) = memory_store();
        kv.insert_raw(KEY, r#"{"version":9,"listings":[]}"#).unwrap();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_saves_are_not_lost() {
        let (_, store) = memory_store();
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(draft(&format!("item{i}"), i)).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.load_all().await.len(), 10);
    }

    #[tokio::test]
    async fn test_uses_configured_key() {
        let kv = MemoryKeyValueStore::new();
        let config = ListingConfig {
            listings_key: "tenant-a:listings".into(),
            ..Default::default()
        };
        let store = LocalListingStore::from_config(Arc::new(kv.clone()), &config);
        store.save(draft("a", 0)).await.unwrap();

        assert!(kv.get("tenant-a:listings").await.unwrap().is_some());
        assert!(kv.get(KEY).await.unwrap().is_none());
        assert_eq!(
            LocalListingStore::from_config(Arc::new(kv), &ListingConfig::default())
                .load_all()
                .await
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = LocalListingStore::new(Arc::new(FileKeyValueStore::new(dir.path())), KEY);
            store.save(draft("a", 0)).await.unwrap()
        };
        let reopened = LocalListingStore::new(Arc::new(FileKeyValueStore::new(dir.path())), KEY);
        assert_eq!(reopened.load_all().await[0].id, id);
    }
}
