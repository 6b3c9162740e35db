//! Asset kind definitions.

/// Kind of built asset, attached to each artifact at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Minified JS bundle.
    Script,
    /// Minified CSS bundle.
    Stylesheet,
    /// Generated JS template bundle.
    TemplateBundle,
}

impl AssetKind {
    /// Extension used for staged and distribution filenames.
    pub const fn dist_ext(self) -> &'static str {
        match self {
            Self::Script => ".min.js",
            Self::Stylesheet => ".min.css",
            Self::TemplateBundle => ".js",
        }
    }
}
