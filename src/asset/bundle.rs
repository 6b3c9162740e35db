//! Script and stylesheet bundle building.
//!
//! Sources are concatenated in declared order, minified in-process, and
//! staged under the staging directory.

use anyhow::{Context, Result};
use std::fs;

use crate::config::{BuildConfig, FileBundle};
use crate::log;

use super::{Artifact, AssetKind, minify};

/// Build all configured script and style bundles, in declaration order.
pub fn build_bundles(config: &BuildConfig) -> Result<Vec<Artifact>> {
    log!("minify"; "compressing js & css");

    let mut artifacts = Vec::new();
    for bundle in &config.files.scripts {
        artifacts.push(build_bundle(config, bundle, AssetKind::Script)?);
    }
    for bundle in &config.files.styles {
        artifacts.push(build_bundle(config, bundle, AssetKind::Stylesheet)?);
    }
    Ok(artifacts)
}

/// Concatenate, minify and stage a single bundle.
///
/// A bundle the minifier rejects is staged unminified with a log message.
fn build_bundle(config: &BuildConfig, bundle: &FileBundle, kind: AssetKind) -> Result<Artifact> {
    let mut parts = Vec::with_capacity(bundle.sources.len());
    for source in &bundle.sources {
        let path = config.root_join(source);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("unable to read bundle source: {}", path.display()))?;
        parts.push(content);
    }
    let concatenated = parts.join("\n");

    let content = match minify::minify(kind, &concatenated) {
        Some(minified) => minified,
        None => {
            log!("minify"; "failed to minify bundle `{}`, staging unminified", bundle.name);
            concatenated
        }
    };

    let artifact = Artifact::new(&bundle.name, kind, content);
    let staged = config.staging_path().join(artifact.staged_name());
    fs::write(&staged, &artifact.content)
        .with_context(|| format!("unable to stage bundle: {}", staged.display()))?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.root = dir.path().to_path_buf();
        fs::create_dir_all(config.staging_path()).unwrap();
        config
    }

    #[test]
    fn test_build_script_bundle() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        fs::write(dir.path().join("a.js"), "const a = 1;\n").unwrap();
        fs::write(dir.path().join("b.js"), "console.log(a + 1);\n").unwrap();
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["a.js".to_string(), "b.js".to_string()],
        });

        let artifacts = build_bundles(&config).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].base, "script");
        assert_eq!(artifacts[0].kind, AssetKind::Script);

        // staged copy matches the artifact content
        let staged = fs::read_to_string(config.staging_path().join("script.min.js")).unwrap();
        assert_eq!(staged, artifacts[0].content);
    }

    #[test]
    fn test_build_style_bundle() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        fs::write(dir.path().join("style.css"), "body {\n  color: red;\n}\n").unwrap();
        config.files.styles.push(FileBundle {
            name: "style".to_string(),
            sources: vec!["style.css".to_string()],
        });

        let artifacts = build_bundles(&config).unwrap();
        assert_eq!(artifacts[0].kind, AssetKind::Stylesheet);
        assert!(config.staging_path().join("style.min.css").exists());
    }

    #[test]
    fn test_unparseable_source_staged_unminified() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        fs::write(dir.path().join("bad.js"), "function {").unwrap();
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["bad.js".to_string()],
        });

        let artifacts = build_bundles(&config).unwrap();
        assert_eq!(artifacts[0].content, "function {");
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["absent.js".to_string()],
        });

        assert!(build_bundles(&config).is_err());
    }

    #[test]
    fn test_bundle_order_matches_declaration() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        fs::write(dir.path().join("a.js"), "const a = 1;\n").unwrap();
        fs::write(dir.path().join("c.css"), "body { color: red; }\n").unwrap();
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["a.js".to_string()],
        });
        config.files.styles.push(FileBundle {
            name: "style".to_string(),
            sources: vec!["c.css".to_string()],
        });

        let bases: Vec<_> = build_bundles(&config)
            .unwrap()
            .into_iter()
            .map(|a| a.base)
            .collect();
        assert_eq!(bases, ["script", "style"]);
    }
}
