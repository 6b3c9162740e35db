//! Build configuration management for `stamp.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[remote]`         | rsync push target (ssh host, destination path)   |
//! | `[build]`          | Output directories, naming, include destinations |
//! | `[files]`          | Declared template, script and style inputs       |

mod error;
mod files;
mod util;

pub use error::ConfigError;
pub use files::{FileBundle, FilesConfig, TemplatesConfig};
use util::find_config_file;

use crate::{cli::Cli, log};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing stamp.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Remote push settings
    pub remote: RemoteConfig,

    /// Build output settings
    pub build: BuildSection,

    /// Declared asset inputs
    pub files: FilesConfig,
}

impl BuildConfig {
    /// Load configuration by searching upward from the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            bail!(
                "config file '{}' not found in current or parent directories",
                cli.config.display()
            );
        };

        let mut config = Self::from_path(&config_path)?;
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file: {}", path.display()))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        for field in &ignored {
            log!("config"; "unknown config field ignored: {field}");
        }
        Ok(config)
    }

    /// Parse TOML content, collecting unknown field paths.
    pub(crate) fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let deserializer = toml::Deserializer::new(content);
        let mut ignored = Vec::new();
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .context("invalid config file")?;
        Ok((config, ignored))
    }

    /// Validate the declared asset set.
    ///
    /// Base names key both the version store and the distribution
    /// filenames, so they must be unique across templates, scripts and
    /// styles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = FxHashSet::default();
        for base in self.declared_bases() {
            if !seen.insert(base.clone()) {
                return Err(ConfigError::DuplicateBase(base));
            }
        }
        for bundle in self.files.scripts.iter().chain(&self.files.styles) {
            if bundle.sources.is_empty() {
                return Err(ConfigError::EmptyBundle(bundle.name.clone()));
            }
        }
        Ok(())
    }

    /// Every declared output base name, in publish order: template bundle
    /// first, then script bundles, then style bundles.
    pub fn declared_bases(&self) -> Vec<String> {
        let mut bases = Vec::new();
        if let Some(templates) = &self.files.templates {
            bases.push(templates.filename.clone());
        }
        bases.extend(self.files.scripts.iter().map(|b| b.name.clone()));
        bases.extend(self.files.styles.iter().map(|b| b.name.clone()));
        bases
    }

    /// Join a path relative to the project root.
    pub fn root_join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// Staging directory, recreated on every publish run.
    pub fn staging_path(&self) -> PathBuf {
        self.root.join(&self.build.staging_dir)
    }

    /// Distribution directory holding version-stamped entries.
    pub fn dist_path(&self) -> PathBuf {
        self.root.join(&self.build.dist_dir)
    }

    /// Persisted version state file.
    pub fn version_path(&self) -> PathBuf {
        self.root.join(&self.build.version_file)
    }

    /// Destination for generated script include tags.
    pub fn script_include_path(&self) -> PathBuf {
        self.root.join(&self.build.script_include)
    }

    /// Destination for generated style include tags.
    pub fn style_include_path(&self) -> PathBuf {
        self.root.join(&self.build.style_include)
    }

    /// URL prefix for generated tags (`/` when absolute_urls is set).
    pub fn src_prefix(&self) -> &'static str {
        if self.build.absolute_urls { "/" } else { "" }
    }

    /// Hard limit for non-interactive pipeline stages.
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.build.stage_timeout_secs)
    }
}

// ============================================================================
// [remote] section
// ============================================================================

/// `[remote]` section: rsync push target.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Remote ssh host, e.g. "example.com" (empty = local push path)
    pub ssh_host: String,

    /// Destination path on the local machine or ssh host
    pub push_path: String,

    /// rsync --exclude-from file, relative to the project root
    pub exclude_from: Option<String>,
}

// ============================================================================
// [build] section
// ============================================================================

/// `[build]` section: output locations and naming.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Directory for published, version-stamped files
    pub dist_dir: String,

    /// Directory for freshly staged build output, recreated each run
    pub staging_dir: String,

    /// Indent inserted between generated include tags
    pub tag_indent: String,

    /// Prefix generated URLs with `/`
    pub absolute_urls: bool,

    /// Version assigned to a base name on first encounter
    pub version_start: u64,

    /// Version state file, relative to the project root
    pub version_file: String,

    /// Destination for generated script include tags
    pub script_include: String,

    /// Destination for generated style include tags
    pub style_include: String,

    /// Hard limit for non-interactive pipeline stages, in seconds
    pub stage_timeout_secs: u64,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            dist_dir: "dist".to_string(),
            staging_dir: "latest".to_string(),
            tag_indent: "  ".to_string(),
            absolute_urls: false,
            version_start: 3000,
            version_file: "version.json".to_string(),
            script_include: "build-js.html".to_string(),
            style_include: "build-css.html".to_string(),
            stage_timeout_secs: 300,
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
pub(crate) fn test_parse_config(content: &str) -> BuildConfig {
    let (config, _) = BuildConfig::parse_with_ignored(content).unwrap();
    config
}
