use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SubfluxError};

/// Blob storage for uploaded originals, translated files and archives
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `data` under `key`, returning its download URL
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<String>;

    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Replace characters that are unsafe in storage keys
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Reject keys that could escape the storage root
fn validate_key(key: &str) -> Result<&Path> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(SubfluxError::Storage(format!("Invalid storage key: {}", key)));
    }
    Ok(path)
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Artifact store on the local filesystem
pub struct LocalArtifactStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
        })
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<String> {
        let path = self.root.join(validate_key(key)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SubfluxError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|e| SubfluxError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(public_url(&self.public_base_url, key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(validate_key(key)?);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SubfluxError::NotFound(format!("Artifact {}", key)))
            }
            Err(e) => Err(SubfluxError::Storage(format!("Failed to read {}: {}", path.display(), e))),
        }
    }
}

/// Artifact store kept in memory
#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(public_url("/files", key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| SubfluxError::NotFound(format!("Artifact {}", key)))
    }
}
