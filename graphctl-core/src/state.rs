//! Tracked state persisted between runs.
//!
//! # Storage layout
//!
//! ```text
//! ~/.graphctl/
//!   state.yaml      (mode 0600, holds write-only secrets and router tokens)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(path: &Path, …)` — explicit path; used in tests with `TempDir`
//! - `fn(…)` — derives the path from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{state_io, StateError};
use crate::types::{ResourceAddress, ResourceModel};

/// Highest state file version this build reads and the one it writes.
pub const STATE_VERSION: u32 = 1;

/// Root of the state YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<ResourceAddress, ResourceModel>,
    pub updated_at: DateTime<Utc>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }
}

impl StateFile {
    pub fn get(&self, address: &ResourceAddress) -> Option<&ResourceModel> {
        self.resources.get(address)
    }

    /// Track `model` at `address`, replacing any previous entry.
    pub fn insert(&mut self, address: ResourceAddress, model: ResourceModel) {
        self.resources.insert(address, model);
        self.updated_at = Utc::now();
    }

    /// Stop tracking `address`. Returns the dropped model, if any.
    pub fn remove(&mut self, address: &ResourceAddress) -> Option<ResourceModel> {
        let removed = self.resources.remove(address);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.graphctl/state.yaml` — pure, no I/O.
pub fn default_state_path_at(home: &Path) -> PathBuf {
    home.join(".graphctl").join("state.yaml")
}

/// `default_state_path_at` convenience wrapper.
pub fn default_state_path() -> Result<PathBuf, StateError> {
    Ok(default_state_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load state from `path`.
///
/// A missing file is a first run and yields an empty [`StateFile`].
/// Returns `StateError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<StateFile, StateError> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| state_io(path, e))?;
    let state: StateFile = serde_yaml::from_str(&contents).map_err(|e| StateError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    if state.version > STATE_VERSION {
        return Err(StateError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: state.version,
            supported: STATE_VERSION,
        });
    }
    tracing::debug!(path = %path.display(), resources = state.resources.len(), "loaded state");
    Ok(state)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<StateFile, StateError> {
    load_at(&default_state_path()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save state to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem).
pub fn save_at(path: &Path, state: &StateFile) -> Result<(), StateError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| state_io(dir, e))?;
            set_dir_permissions(dir)?;
        }
    }

    let tmp_path = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(state)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| state_io(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(state_io(path, e));
    }
    tracing::debug!(path = %path.display(), resources = state.resources.len(), "saved state");
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(state: &StateFile) -> Result<(), StateError> {
    save_at(&default_state_path()?, state)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, StateError> {
    dirs::home_dir().ok_or(StateError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| state_io(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| state_io(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
