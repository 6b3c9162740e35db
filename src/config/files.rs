//! `[files]` section: declared asset inputs.

use serde::Deserialize;

/// Declared template, script and style inputs.
///
/// Script and style bundles are arrays of tables so declaration order is
/// preserved through to publishing and tag generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Template bundle settings (omit when not using templates)
    pub templates: Option<TemplatesConfig>,

    /// Scripts included in development mode only
    pub dev_scripts: Vec<String>,

    /// Script bundles, minified and published
    pub scripts: Vec<FileBundle>,

    /// Style bundles, minified and published
    pub styles: Vec<FileBundle>,
}

/// One named bundle of source files.
#[derive(Debug, Clone, Deserialize)]
pub struct FileBundle {
    /// Logical base name, stable across versions
    pub name: String,

    /// Source files relative to the project root, concatenated in order
    pub sources: Vec<String>,
}

/// `[files.templates]`: template bundle settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Base name of the generated bundle
    pub filename: String,

    /// JS namespace templates are registered under
    pub namespace: String,

    /// Template directory relative to the project root
    pub dir: String,

    /// Template file extension filter
    pub ext: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            filename: "templates".to_string(),
            namespace: "JST".to_string(),
            dir: "templates".to_string(),
            ext: ".html".to_string(),
        }
    }
}
