//! Common ID Types
//!
//! Listing ids live in two namespaces: ids minted on the device for
//! listings that only exist locally, and ids assigned by the backend.
//! Local ids carry a fixed prefix so the namespace is recoverable from
//! the string alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Prefix of every device-local listing id
pub const LOCAL_ID_PREFIX: &str = "local-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
}

/// Listing identifier
///
/// Serialized as the plain id string.
///
/// ```
/// use kernel::id::ListingId;
///
/// let local = ListingId::new_local();
/// assert!(local.is_local());
///
/// let remote: ListingId = "8f14e45f".parse().unwrap();
/// assert!(remote.is_remote());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListingId {
    /// Minted on the device, never sent to the backend
    Local(String),
    /// Assigned by the backend
    Remote(String),
}

impl ListingId {
    /// Generate a fresh local id (`local-<uuid v4>`)
    pub fn new_local() -> Self {
        ListingId::Local(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Wrap an id returned by the backend
    pub fn remote(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(ListingId::Remote(id))
    }

    /// The same id moved into the local namespace
    ///
    /// Ids stored on the device by builds that did not prefix them would
    /// otherwise parse as backend ids.
    pub fn into_local(self) -> Self {
        match self {
            ListingId::Local(_) => self,
            ListingId::Remote(id) => ListingId::Local(format!("{LOCAL_ID_PREFIX}{id}")),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ListingId::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ListingId::Remote(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ListingId::Local(id) | ListingId::Remote(id) => id,
        }
    }
}

impl FromStr for ListingId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.starts_with(LOCAL_ID_PREFIX) {
            Ok(ListingId::Local(s.to_string()))
        } else {
            Ok(ListingId::Remote(s.to_string()))
        }
    }
}

impl TryFrom<String> for ListingId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListingId> for String {
    fn from(id: ListingId) -> Self {
        match id {
            ListingId::Local(id) | ListingId::Remote(id) => id,
        }
    }
}

impl fmt::Debug for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingId::Local(id) => write!(f, "Local({id})"),
            ListingId::Remote(id) => write!(f, "Remote({id})"),
        }
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account identifier issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
