//! Publish decision engine.
//!
//! Compares freshly built artifacts against the most recently published
//! distribution entries and assigns version-stamped filenames. Entries are
//! immutable: a changed artifact is written under a bumped version, never
//! over the prior file.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::asset::Artifact;
use crate::config::{BuildConfig, ConfigError};
use crate::utils::hash;
use crate::version::{VersionError, VersionStore};
use crate::{debug, log};

/// Outcome of comparing one artifact against its published copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No prior distribution entry existed.
    New,
    /// Prior entry is byte-identical; nothing written.
    Unchanged,
    /// Prior entry differs; version bumped and a new entry written.
    Changed,
}

/// Base name → published filename chosen during this run.
pub type ResolvedNames = FxHashMap<String, String>;

/// Publish every artifact, then persist the version store.
///
/// The store is persisted once after all artifacts, whether or not any
/// version changed. Every declared base must end up with exactly one
/// resolved filename; anything less is a fatal configuration error.
pub fn publish_artifacts(
    config: &BuildConfig,
    artifacts: &[Artifact],
    store: &mut VersionStore,
) -> Result<ResolvedNames> {
    let dist = config.dist_path();
    log!("publish"; "copying new or changed files to: {}", dist.display());

    let mut resolved = ResolvedNames::default();
    for artifact in artifacts {
        let (classification, name) = publish_one(&dist, artifact, store)?;
        match classification {
            Classification::New => {
                log!("publish"; "{}", format!("+ [new file] {name}").yellow());
            }
            Classification::Unchanged => {
                log!("publish"; "{}", format!("- [no change] {name}").dimmed());
            }
            Classification::Changed => {
                log!("publish"; "{}", format!("+ [new version] {name}").cyan());
            }
        }
        resolved.insert(artifact.base.clone(), name);
    }

    store.persist().context("unable to persist version store")?;

    // every declared asset must have resolved to a filename
    for base in config.declared_bases() {
        if !resolved.contains_key(&base) {
            return Err(ConfigError::MissingResolvedName(base).into());
        }
    }

    Ok(resolved)
}

/// Classify one artifact against the entry at its current version.
fn publish_one(
    dist: &Path,
    artifact: &Artifact,
    store: &mut VersionStore,
) -> Result<(Classification, String)> {
    let version = store
        .get(&artifact.base)
        .ok_or_else(|| VersionError::UnknownKey(artifact.base.clone()))?;
    let name = artifact.dist_name(version);
    let path = dist.join(&name);

    // missing prior entry is a NEW classification, not an error
    let prior = match hash::compute_file(&path) {
        Ok(hash) => Some(hash),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| {
                format!("unable to read distribution entry: {}", path.display())
            });
        }
    };

    match prior {
        None => {
            write_entry(&path, artifact)?;
            Ok((Classification::New, name))
        }
        Some(prior) if prior == hash::compute(&artifact.content) => {
            Ok((Classification::Unchanged, name))
        }
        Some(prior) => {
            debug!(
                "publish";
                "{}: fresh hash {} differs from published {}",
                artifact.base, hash::compute(&artifact.content), prior
            );
            let version = store.bump(&artifact.base)?;
            let name = artifact.dist_name(version);
            let path = dist.join(&name);
            write_entry(&path, artifact)?;
            Ok((Classification::Changed, name))
        }
    }
}

fn write_entry(path: &Path, artifact: &Artifact) -> Result<()> {
    fs::write(path, &artifact.content)
        .with_context(|| format!("unable to write distribution entry: {}", path.display()))
}
