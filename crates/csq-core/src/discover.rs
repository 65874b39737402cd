//! Discovery module: find the csq configuration directory
//!
//! A project-local `.csq` folder found by walking up from the working
//! directory wins over the per-user config directory.

use std::path::{Path, PathBuf};

use crate::{CSQ_DIR, CsqError, Result};

/// Find the directory containing `.csq` by walking up from the given path.
///
/// Returns the path to the directory containing .csq (not the .csq folder itself).
pub fn find_csq_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.canonicalize().ok()?;

    loop {
        if current.join(CSQ_DIR).is_dir() {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Per-user config directory, e.g. `~/.config/csq`.
pub fn user_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("csq"))
        .ok_or_else(|| CsqError::Config("Could not determine the user config directory".into()))
}

/// The directory holding config and credentials for `start`.
pub fn config_dir(start: &Path) -> Result<PathBuf> {
    match find_csq_root(start) {
        Some(root) => Ok(csq_dir(&root)),
        None => user_dir(),
    }
}

/// Get the .csq directory path for a given root.
pub fn csq_dir(root: &Path) -> PathBuf {
    root.join(CSQ_DIR)
}

/// Get the config file path inside a config directory.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

/// Get the credential file path inside a config directory.
pub fn token_path(dir: &Path) -> PathBuf {
    dir.join("token")
}
