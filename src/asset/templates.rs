//! Template bundle compilation.
//!
//! Reads every template in the configured directory and emits a single JS
//! bundle registering each template's source under a shared namespace:
//!
//! ```text
//! this.JST=this.JST||{};
//! this.JST["templates/home.html"] = "<h1>{{title}}</h1>";
//! ```

use anyhow::{Context, Result};
use std::fs;

use crate::config::BuildConfig;
use crate::log;

use super::{Artifact, AssetKind};

/// Build the template bundle, if templates are configured.
///
/// An unreadable template directory skips the whole stage; an unreadable
/// individual template file is skipped with a log message.
pub fn build_template_bundle(config: &BuildConfig) -> Result<Option<Artifact>> {
    let Some(templates) = &config.files.templates else {
        return Ok(None);
    };

    let dir = config.root_join(&templates.dir);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => {
            log!("templates"; "invalid template dir: {}", dir.display());
            return Ok(None);
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(&templates.ext))
        .collect();
    // readdir order is platform-dependent
    names.sort();

    let ns = &templates.namespace;
    let mut bundle = format!("{ns}={ns}||{{}};\n");
    let mut compiled = 0usize;
    for name in &names {
        let path = dir.join(name);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(_) => {
                log!("templates"; "unable to read template file: {}", path.display());
                continue;
            }
        };
        let source = source.strip_prefix('\u{feff}').unwrap_or(&source).trim();

        let rel = format!("{}/{}", templates.dir.trim_end_matches('/'), name);
        let key = format!("{}{}", config.src_prefix(), rel);
        bundle.push_str(&format!(
            "{ns}[{}] = {};\n",
            serde_json::to_string(&key)?,
            serde_json::to_string(source)?
        ));
        compiled += 1;
    }

    log!("templates"; "compiled {} js template(s)", compiled);

    let artifact = Artifact::new(&templates.filename, AssetKind::TemplateBundle, bundle);
    let staged = config.staging_path().join(artifact.staged_name());
    fs::write(&staged, &artifact.content)
        .with_context(|| format!("unable to stage template bundle: {}", staged.display()))?;
    Ok(Some(artifact))
}
