//! Raw collection backends.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::records::Domain;
use crate::store::{ParseFailure, StoreError, StoreResult};

const COLLECTION_EXTENSION: &str = "json";

/// Key/value repository holding one serialized collection per domain.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Load the stored collection text. `Ok(None)` when nothing is stored;
    /// `Err` only when the backend itself cannot be read.
    async fn load(&self, domain: Domain) -> StoreResult<Option<String>>;

    /// Replace the stored collection text.
    async fn save(&self, domain: Domain, contents: String) -> StoreResult<()>;
}

/// In-memory backend, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    collections: Arc<RwLock<HashMap<Domain, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw text for a domain without going through a store (no change
    /// event is published).
    pub fn insert_raw(&self, domain: Domain, contents: impl Into<String>) {
        if let Ok(mut collections) = self.collections.write() {
            collections.insert(domain, contents.into());
        }
    }

    pub fn raw(&self, domain: Domain) -> Option<String> {
        self.collections
            .read()
            .ok()
            .and_then(|collections| collections.get(&domain).cloned())
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self, domain: Domain) -> StoreResult<Option<String>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::unavailable(domain, "memory store lock poisoned"))?;
        Ok(collections.get(&domain).cloned())
    }

    async fn save(&self, domain: Domain, contents: String) -> StoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::unavailable(domain, "memory store lock poisoned"))?;
        collections.insert(domain, contents);
        Ok(())
    }
}

/// Identity of a collection file's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

/// Result of probing a collection file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed {
    /// `None` when the file does not exist.
    pub fingerprint: Option<Fingerprint>,
    /// The file is exactly what this process last wrote.
    pub own_write: bool,
}

/// Backend storing each collection as `<data_dir>/<domain key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
    own_writes: Arc<Mutex<HashMap<Domain, Fingerprint>>>,
}

impl FileBackend {
    /// Create a backend rooted at `data_dir`, creating the directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            own_writes: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, domain: Domain) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", domain.key(), COLLECTION_EXTENSION))
    }

    /// Inspect a collection file, noting whether this process wrote it last.
    pub async fn observe(&self, domain: Domain) -> StoreResult<Observed> {
        let own_writes = self.own_writes.lock().await;
        let fingerprint = self.fingerprint(domain).await?;
        let own_write = fingerprint.is_some() && own_writes.get(&domain) == fingerprint.as_ref();
        Ok(Observed {
            fingerprint,
            own_write,
        })
    }

    async fn fingerprint(&self, domain: Domain) -> StoreResult<Option<Fingerprint>> {
        match tokio::fs::metadata(self.path_for(domain)).await {
            Ok(metadata) => Ok(Some(Fingerprint {
                modified: metadata.modified().ok(),
                len: metadata.len(),
            })),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

#[async_trait]
impl StoreBackend for FileBackend {
    /// Read a collection file.
    ///
    /// A file whose bytes are not UTF-8 is corrupt data, not an IO failure: it
    /// is logged and read as empty.
    async fn load(&self, domain: Domain) -> StoreResult<Option<String>> {
        let bytes = match tokio::fs::read(self.path_for(domain)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err)),
        };
        match String::from_utf8(bytes) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) => {
                let failure = ParseFailure {
                    domain,
                    reason: err.to_string(),
                };
                tracing::warn!(error = %failure, "treating collection as empty");
                Ok(None)
            }
        }
    }

    async fn save(&self, domain: Domain, contents: String) -> StoreResult<()> {
        let mut own_writes = self.own_writes.lock().await;

        let path = self.path_for(domain);
        let temp_path = path.with_extension(format!("{}.tmp", COLLECTION_EXTENSION));

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, &path).await?;

        if let Some(fingerprint) = self.fingerprint(domain).await? {
            own_writes.insert(domain, fingerprint);
        }
        Ok(())
    }
}
