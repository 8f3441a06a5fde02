//! Preferences Store

use std::sync::Arc;

use platform::kv::KeyValueStore;

use crate::domain::entity::Preferences;
use crate::error::ListingResult;

pub struct PreferencesStore<S>
where
    S: KeyValueStore,
{
    kv: Arc<S>,
    key: String,
}

impl<S> PreferencesStore<S>
where
    S: KeyValueStore,
{
    pub fn new(kv: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Stored preferences; missing or unreadable → defaults
    pub async fn load(&self) -> Preferences {
        match self.kv.get(&self.key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(key = %self.key, error = %e, "Ignoring unreadable preferences");
                Preferences::default()
            }),
            Ok(None) => Preferences::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read preferences");
                Preferences::default()
            }
        }
    }

    pub async fn save(&self, preferences: &Preferences) -> ListingResult<()> {
        let raw = serde_json::to_string(preferences)?;
        self.kv.set(&self.key, &raw).await?;
        Ok(())
    }
}
