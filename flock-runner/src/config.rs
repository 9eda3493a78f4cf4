use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use flock_core::FlockConfig;

/// Read and validate a JSON flock config. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<FlockConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = FlockConfig::from_json(&json)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

/// Re-reads a config file whenever its modification time changes
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Starts from the file's current mtime, so the first `poll` only
    /// fires after the file is touched again.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let modified = modified_time(&path);
        Self { path, modified }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed config if the file changed since the last poll. Unreadable
    /// or malformed files are logged and skipped; validation is left to the
    /// caller.
    pub fn poll(&mut self) -> Option<FlockConfig> {
        let modified = modified_time(&self.path);
        if modified.is_none() || modified == self.modified {
            return None;
        }
        self.modified = modified;

        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };
        match FlockConfig::from_json(&json) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
