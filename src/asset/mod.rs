//! Build artifacts: bundling, minification and template compilation.

pub mod bundle;
pub mod kind;
pub mod minify;
pub mod templates;

pub use kind::AssetKind;

/// In-memory build output for one logical asset.
///
/// Ephemeral: lives for a single pipeline run, produced by the template and
/// bundle stages and consumed by the publish decision.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Logical base name, stable across versions (e.g. "script").
    pub base: String,

    /// Asset kind, fixed at creation time.
    pub kind: AssetKind,

    /// Built content.
    pub content: String,
}

impl Artifact {
    pub fn new(base: impl Into<String>, kind: AssetKind, content: String) -> Self {
        Self {
            base: base.into(),
            kind,
            content,
        }
    }

    /// Distribution filename for a given version, e.g. `script-3001.min.js`.
    pub fn dist_name(&self, version: u64) -> String {
        format!("{}-{}{}", self.base, version, self.kind.dist_ext())
    }

    /// Staged filename (no version suffix), e.g. `script.min.js`.
    pub fn staged_name(&self) -> String {
        format!("{}{}", self.base, self.kind.dist_ext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dist_name() {
        let artifact = Artifact::new("script", AssetKind::Script, String::new());
        assert_eq!(artifact.dist_name(3001), "script-3001.min.js");

        let artifact = Artifact::new("style", AssetKind::Stylesheet, String::new());
        assert_eq!(artifact.dist_name(3000), "style-3000.min.css");

        let artifact = Artifact::new("templates", AssetKind::TemplateBundle, String::new());
        assert_eq!(artifact.dist_name(3000), "templates-3000.js");
    }

    #[test]
    fn test_staged_name() {
        let artifact = Artifact::new("script", AssetKind::Script, String::new());
        assert_eq!(artifact.staged_name(), "script.min.js");
    }
}
