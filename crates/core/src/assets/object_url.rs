//! Revocable local references to fetched assets.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// A `blob:` style reference handed to the engine instead of the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes registered behind an [`ObjectUrl`].
#[derive(Debug, Clone)]
pub struct Blob {
    pub data: Bytes,
    pub mime: String,
}

/// Registry of live object URLs. Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlStore {
    entries: Arc<RwLock<HashMap<ObjectUrl, Blob>>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `data` and returns a fresh URL for it.
    pub fn create(&self, data: Bytes, mime: impl Into<String>) -> ObjectUrl {
        let url = ObjectUrl(format!("blob:{}", Uuid::new_v4()));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                url.clone(),
                Blob {
                    data,
                    mime: mime.into(),
                },
            );
        url
    }

    /// Returns the blob behind `url`, if it has not been revoked.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Revokes `url`. Revoking an unknown or already revoked URL is a no-op.
    pub fn revoke(&self, url: &ObjectUrl) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
