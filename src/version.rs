//! Persistent asset version store.
//!
//! Maps logical base names to integer version numbers, persisted as a flat
//! JSON object. Missing or corrupt state is treated as an empty store, and
//! the full mapping is rewritten at the end of every publish run so the
//! file stays in sync with the currently declared asset set.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Version store errors.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Version lookup or bump for a base name the store does not track.
    #[error("unknown version key: `{0}`")]
    UnknownKey(String),

    /// The store could not be written back to disk.
    #[error("unable to write version file {path}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mapping could not be serialized.
    #[error("unable to serialize version data")]
    Serialize(#[from] serde_json::Error),
}

/// Mapping from base name to published version number.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
    entries: BTreeMap<String, u64>,
}

impl VersionStore {
    /// Load persisted versions.
    ///
    /// Any read or parse failure yields an empty store; entries whose value
    /// is not an unsigned integer are dropped (and restored to the start
    /// version by [`reconcile`](Self::reconcile)).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<BTreeMap<String, Value>>(&content).ok())
            .map(|raw| {
                raw.into_iter()
                    .filter_map(|(key, value)| value.as_u64().map(|version| (key, version)))
                    .collect()
            })
            .unwrap_or_default();
        Self { path, entries }
    }

    /// Normalize the store against the declared asset set.
    ///
    /// Declared bases keep their persisted version when present; bases
    /// without a valid entry are assigned `start`; undeclared keys are
    /// dropped.
    pub fn reconcile(&mut self, declared: &[String], start: u64) {
        self.entries = declared
            .iter()
            .map(|base| {
                let version = self.entries.get(base).copied().unwrap_or(start);
                (base.clone(), version)
            })
            .collect();
    }

    /// Current version for a base name.
    pub fn get(&self, base: &str) -> Option<u64> {
        self.entries.get(base).copied()
    }

    /// Increment the version for `base` by exactly one.
    pub fn bump(&mut self, base: &str) -> Result<u64, VersionError> {
        match self.entries.get_mut(base) {
            Some(version) => {
                *version += 1;
                Ok(*version)
            }
            None => Err(VersionError::UnknownKey(base.to_string())),
        }
    }

    /// Rewrite the full mapping to disk, overwriting prior content.
    pub fn persist(&self) -> Result<(), VersionError> {
        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json).map_err(|source| VersionError::Persist {
            path: self.path.clone(),
            source,
        })
    }

    /// Number of tracked base names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no base names are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
