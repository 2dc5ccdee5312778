//! On-disk credential store.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CredentialError;

/// File name of the lock file inside the state directory.
pub const LOCK_FILE: &str = "agent.lock.json";

/// Controller endpoint and pairing key, as persisted in the lock file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    /// Controller WebSocket endpoint, stored under the `websocket` key.
    #[serde(rename = "websocket")]
    pub endpoint: String,
    /// Pairing key presented during auth.
    pub key: String,
}

/// Persistent store for paired credentials.
///
/// `save_once` writes at most once per process run: the first successful call
/// persists, later calls are no-ops. Loading an existing lock file also counts
/// as persisted, so a restart never rewrites it.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    persisted: AtomicBool,
}

impl CredentialStore {
    /// Creates a store rooted at `state_dir`.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join(LOCK_FILE),
            persisted: AtomicBool::new(false),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads credentials from disk, if any were saved before.
    pub fn load(&self) -> Result<Option<Credentials>, CredentialError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let credentials = serde_json::from_str(&content)?;
        self.persisted.store(true, Ordering::SeqCst);
        Ok(Some(credentials))
    }

    /// Writes credentials unless they were already persisted.
    ///
    /// Returns `true` when this call performed the write.
    pub fn save_once(&self, credentials: &Credentials) -> Result<bool, CredentialError> {
        if self.persisted.load(Ordering::SeqCst) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(credentials)?)?;
        self.persisted.store(true, Ordering::SeqCst);
        Ok(true)
    }
}
