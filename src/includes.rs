//! Include-tag generation for development and production modes.
//!
//! Tags are rebuilt from scratch on every invocation and written to two
//! fixed destinations, fully overwriting prior content. Order follows the
//! configuration's declaration order, never sorted.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::fs;

use crate::config::{BuildConfig, ConfigError};
use crate::log;
use crate::publish::ResolvedNames;

/// Ordered script and style tag sets for one generator run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IncludeTags {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
}

fn script_tag(src: &str) -> String {
    format!(r#"<script src="{src}"></script>"#)
}

fn style_tag(href: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{href}">"#)
}

/// Tags referencing raw source paths (development mode).
///
/// Dev-only scripts come first, then each script bundle's sources, then
/// style bundle sources. No dependency on the publish decision.
pub fn dev_tags(config: &BuildConfig) -> IncludeTags {
    let prefix = config.src_prefix();
    let mut tags = IncludeTags::default();

    for file in &config.files.dev_scripts {
        tags.scripts.push(script_tag(&format!("{prefix}{file}")));
    }
    for bundle in &config.files.scripts {
        for file in &bundle.sources {
            tags.scripts.push(script_tag(&format!("{prefix}{file}")));
        }
    }
    for bundle in &config.files.styles {
        for file in &bundle.sources {
            tags.styles.push(style_tag(&format!("{prefix}{file}")));
        }
    }
    tags
}

/// Tags referencing version-stamped distribution entries (production mode).
///
/// The template bundle comes first, then script bundles, then style
/// bundles. A declared asset without a resolved filename is fatal.
pub fn prod_tags(
    config: &BuildConfig,
    resolved: &ResolvedNames,
) -> Result<IncludeTags, ConfigError> {
    let prefix = config.src_prefix();
    let dist = config.build.dist_dir.trim_end_matches('/');
    let mut tags = IncludeTags::default();

    let mut script_bases: Vec<&String> = Vec::new();
    if let Some(templates) = &config.files.templates {
        script_bases.push(&templates.filename);
    }
    script_bases.extend(config.files.scripts.iter().map(|b| &b.name));

    for base in script_bases {
        let name = resolved
            .get(base)
            .ok_or_else(|| ConfigError::MissingResolvedName(base.clone()))?;
        tags.scripts.push(script_tag(&format!("{prefix}{dist}/{name}")));
    }
    for bundle in &config.files.styles {
        let name = resolved
            .get(&bundle.name)
            .ok_or_else(|| ConfigError::MissingResolvedName(bundle.name.clone()))?;
        tags.styles.push(style_tag(&format!("{prefix}{dist}/{name}")));
    }
    Ok(tags)
}

/// Overwrite both include destinations with the given tag sets.
pub fn write_includes(config: &BuildConfig, tags: &IncludeTags, production: bool) -> Result<()> {
    let state = if production {
        "[production]".magenta().to_string()
    } else {
        "[development]".green().to_string()
    };
    log!("includes"; "writing includes for: {state}");

    let separator = format!("\n{}", config.build.tag_indent);
    let script_path = config.script_include_path();
    fs::write(&script_path, format!("{}\n", tags.scripts.join(&separator)))
        .with_context(|| format!("unable to write include file: {}", script_path.display()))?;
    let style_path = config.style_include_path();
    fs::write(&style_path, format!("{}\n", tags.styles.join(&separator)))
        .with_context(|| format!("unable to write include file: {}", style_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileBundle, TemplatesConfig};
    use tempfile::TempDir;

    fn test_config() -> BuildConfig {
        let mut config = BuildConfig::default();
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["a.js".to_string(), "b.js".to_string()],
        });
        config.files.styles.push(FileBundle {
            name: "style".to_string(),
            sources: vec!["c.css".to_string()],
        });
        config
    }

    #[test]
    fn test_dev_tag_order_stable() {
        let config = test_config();
        let tags = dev_tags(&config);

        assert_eq!(
            tags.scripts,
            [
                r#"<script src="a.js"></script>"#,
                r#"<script src="b.js"></script>"#,
            ]
        );
        assert_eq!(tags.styles, [r#"<link rel="stylesheet" href="c.css">"#]);

        // regeneration is byte-identical
        assert_eq!(dev_tags(&config), tags);
    }

    #[test]
    fn test_dev_scripts_come_first() {
        let mut config = test_config();
        config.files.dev_scripts = vec!["libs/livereload.js".to_string()];
        let tags = dev_tags(&config);
        assert_eq!(tags.scripts[0], r#"<script src="libs/livereload.js"></script>"#);
        assert_eq!(tags.scripts.len(), 3);
    }

    #[test]
    fn test_dev_absolute_urls_prefix() {
        let mut config = test_config();
        config.build.absolute_urls = true;
        let tags = dev_tags(&config);
        assert_eq!(tags.scripts[0], r#"<script src="/a.js"></script>"#);
    }

    #[test]
    fn test_prod_template_bundle_first() {
        let mut config = test_config();
        config.files.templates = Some(TemplatesConfig::default());

        let mut resolved = ResolvedNames::default();
        resolved.insert("templates".to_string(), "templates-3000.js".to_string());
        resolved.insert("script".to_string(), "script-3001.min.js".to_string());
        resolved.insert("style".to_string(), "style-3000.min.css".to_string());

        let tags = prod_tags(&config, &resolved).unwrap();
        assert_eq!(
            tags.scripts,
            [
                r#"<script src="dist/templates-3000.js"></script>"#,
                r#"<script src="dist/script-3001.min.js"></script>"#,
            ]
        );
        assert_eq!(
            tags.styles,
            [r#"<link rel="stylesheet" href="dist/style-3000.min.css">"#]
        );
    }

    #[test]
    fn test_prod_missing_resolved_name_fatal() {
        let config = test_config();
        let resolved = ResolvedNames::default();
        assert!(matches!(
            prod_tags(&config, &resolved),
            Err(ConfigError::MissingResolvedName(name)) if name == "script"
        ));
    }

    #[test]
    fn test_write_includes_overwrites_with_indent_join() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.root = dir.path().to_path_buf();

        // pre-existing content must be fully replaced
        std::fs::write(config.script_include_path(), "stale").unwrap();

        let tags = dev_tags(&config);
        write_includes(&config, &tags, false).unwrap();

        let scripts = std::fs::read_to_string(config.script_include_path()).unwrap();
        assert_eq!(
            scripts,
            "<script src=\"a.js\"></script>\n  <script src=\"b.js\"></script>\n"
        );
        let styles = std::fs::read_to_string(config.style_include_path()).unwrap();
        assert_eq!(styles, "<link rel=\"stylesheet\" href=\"c.css\">\n");

        // deterministic regeneration
        write_includes(&config, &tags, false).unwrap();
        assert_eq!(
            std::fs::read_to_string(config.script_include_path()).unwrap(),
            scripts
        );
    }
}
