//! # Object Storage
//!
//! Product images are written through the [`ObjectStore`] trait. The service
//! ships a local-filesystem store (served back under `/media`) and an
//! in-memory store used by tests.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
}

/// Object storage operations needed by the back office
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its public URL
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Delete an object; deleting a missing object is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Key of an object this store handed out `url` for, if any
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// `<tenant_id>/<uuid>.<ext>`, with the extension taken from the uploaded
/// file name (`bin` when it has none).
pub fn object_key(tenant_id: Uuid, filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!("{}/{}.{}", tenant_id, Uuid::new_v4(), extension)
}

fn checked_relative_path(key: &str) -> Result<PathBuf, StorageError> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

fn key_from_public_url(base: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    url.strip_prefix(&prefix)
        .filter(|key| checked_relative_path(key).is_ok())
        .map(str::to_string)
}

/// Stores objects under a directory on local disk
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError> {
        let path = self.root.join(checked_relative_path(key)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            key = %key,
            content_type = content_type.unwrap_or("application/octet-stream"),
            size_bytes = bytes.len(),
            "Stored object on local disk"
        );

        Ok(StoredObject {
            key: key.to_string(),
            public_url: public_url(&self.public_base_url, key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.root.join(checked_relative_path(key)?);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        key_from_public_url(&self.public_base_url, url)
    }
}

/// In-process store; can be switched into a failing mode
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    public_base_url: String,
    objects: RwLock<HashMap<String, (Option<String>, Bytes)>>,
    fail: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            ..Self::default()
        }
    }

    /// Make every subsequent `put` fail
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<StoredObject, StorageError> {
        checked_relative_path(key)?;
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("memory store is failing".to_string()));
        }

        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.map(str::to_string), bytes));

        Ok(StoredObject {
            key: key.to_string(),
            public_url: public_url(&self.public_base_url, key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        key_from_public_url(&self.public_base_url, url)
    }
}
