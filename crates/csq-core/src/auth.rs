//! Bearer token storage shared by every API call

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Result, discover};

/// Holds the bearer token, optionally persisted to a file.
///
/// Clones share the same token, so clearing it after a 401 on one request
/// is seen by every other holder.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    path: Option<PathBuf>,
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    /// A store that never touches the filesystem.
    pub fn in_memory(token: Option<String>) -> Self {
        Self {
            path: None,
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Load the token file from a config directory (missing file = logged out).
    pub fn open(dir: &Path) -> Result<Self> {
        let path = discover::token_path(dir);
        let token = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            Some(raw.trim().to_string()).filter(|t| !t.is_empty())
        } else {
            None
        };

        Ok(Self {
            path: Some(path),
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.read().is_some()
    }

    /// Store a new token, persisting it when file-backed.
    pub fn save(&self, token: &str) -> Result<()> {
        let token = token.trim().to_string();
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &token)?;
        }
        *self.token.write() = Some(token);
        Ok(())
    }

    /// Forget the token. Removing an already missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        *self.token.write() = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
