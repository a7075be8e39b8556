//! Persisted registry cache
//!
//! The registry is stored as one JSON snapshot under the per-application
//! cache directory:
//!
//! ```text
//! {"version":1,"checksum":"<sha256 hex>","endpoints":["10.0.0.5:5037"]}
//! ```
//!
//! Every save replaces the previous snapshot atomically (temp file, then
//! rename). The checksum covers the endpoint list so that truncated or
//! edited files are reported as corrupt instead of being half-loaded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use df_protocol::Endpoint;

use crate::config;
use crate::error::CacheError;
use crate::registry::Registry;

/// Default cache entry name
pub const CACHE_NAME: &str = "devices";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    checksum: String,
    endpoints: Vec<Endpoint>,
}

/// Location of a persisted registry snapshot
#[derive(Debug, Clone)]
pub struct RegistryCache {
    dir: PathBuf,
    name: String,
}

impl RegistryCache {
    /// Cache stored in `dir` under the default name
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_name(dir, CACHE_NAME)
    }

    /// Cache stored in `dir` under a custom name
    pub fn with_name(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Cache in the default per-user cache directory
    pub fn default_location() -> Self {
        Self::new(config::default_cache_dir())
    }

    /// Directory holding the cache
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.name))
    }

    /// Whether a snapshot exists
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Load the registry
    ///
    /// Returns [`CacheError::NotFound`] if no snapshot was ever saved and
    /// [`CacheError::Corrupt`] if one exists but fails validation.
    pub fn load(&self) -> Result<Registry, CacheError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(path));
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(corrupt(&path, "not valid UTF-8"));
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| corrupt(&path, e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(corrupt(
                &path,
                format!("unsupported snapshot version {}", snapshot.version),
            ));
        }

        if checksum(&snapshot.endpoints) != snapshot.checksum {
            return Err(corrupt(&path, "checksum mismatch"));
        }

        let registry: Registry = snapshot.endpoints.into_iter().collect();
        tracing::debug!(path = %path.display(), count = registry.len(), "Loaded registry cache");
        Ok(registry)
    }

    /// Replace the persisted snapshot with `registry`
    pub fn save(&self, registry: &Registry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        let endpoints = registry.to_vec();
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            checksum: checksum(&endpoints),
            endpoints,
        };
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(path = %path.display(), count = registry.len(), "Saved registry cache");
        Ok(())
    }

    /// Delete the cache directory
    ///
    /// Returns whether anything was removed; a missing directory is not an
    /// error.
    pub fn clear(&self) -> Result<bool, CacheError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> CacheError {
    CacheError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn checksum(endpoints: &[Endpoint]) -> String {
    let mut hasher = Sha256::new();
    for endpoint in endpoints {
        hasher.update(endpoint.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
