//! Configuration error types.

use thiserror::Error;

/// Fatal configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The same base name is declared by more than one asset family.
    #[error("duplicate base name declared: `{0}`")]
    DuplicateBase(String),

    /// A script or style bundle declares no source files.
    #[error("bundle `{0}` declares no source files")]
    EmptyBundle(String),

    /// A declared asset received no resolved filename during publish.
    #[error("no resolved filename for declared asset `{0}`")]
    MissingResolvedName(String),
}
