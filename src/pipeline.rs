//! Sequential stage pipeline.
//!
//! Stages are plain functions over an explicit context, run strictly in
//! order. Non-interactive stages run on a worker thread under a hard
//! timeout; a stage error or timeout stops the run. All state flows through
//! [`PipelineCtx`], never ambient globals.

use anyhow::{Context, Result, bail};
use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::asset::{self, Artifact};
use crate::cli::Mode;
use crate::config::BuildConfig;
use crate::includes;
use crate::{debug, log};
use crate::publish::{self, ResolvedNames};
use crate::remote;
use crate::version::VersionStore;

/// State threaded through pipeline stages.
#[derive(Debug)]
pub struct PipelineCtx {
    pub config: BuildConfig,
    pub store: VersionStore,
    pub artifacts: Vec<Artifact>,
    pub resolved: ResolvedNames,
}

impl PipelineCtx {
    /// Load and reconcile the version store against the declared asset set.
    ///
    /// The normalized store is persisted immediately so stale or missing
    /// entries never reach the publish decision.
    pub fn new(config: BuildConfig) -> Result<Self> {
        let mut store = VersionStore::load(config.version_path());
        store.reconcile(&config.declared_bases(), config.build.version_start);
        store.persist().context("unable to persist version store")?;
        debug!("versions"; "tracking {} asset(s)", store.len());

        Ok(Self {
            config,
            store,
            artifacts: Vec::new(),
            resolved: ResolvedNames::default(),
        })
    }
}

type StageFn = fn(&mut PipelineCtx) -> Result<()>;

/// One named pipeline stage.
struct Stage {
    name: &'static str,
    /// Interactive stages block on user input and are exempt from the timeout.
    interactive: bool,
    run: StageFn,
}

const fn stage(name: &'static str, run: StageFn) -> Stage {
    Stage {
        name,
        interactive: false,
        run,
    }
}

const fn interactive(name: &'static str, run: StageFn) -> Stage {
    Stage {
        name,
        interactive: true,
        run,
    }
}

/// Fixed stage sequence for the selected invocation mode.
fn stages_for(mode: Option<Mode>) -> Vec<Stage> {
    match mode {
        Some(Mode::Push) => vec![
            stage("init-dist-paths", init_dist_paths),
            stage("build-templates", build_templates),
            stage("minify-bundles", minify_bundles),
            stage("publish-decision", publish_decision),
            stage("write-prod-includes", write_prod_includes),
            interactive("push-remote", push_remote),
            stage("write-dev-includes", write_dev_includes),
        ],
        Some(Mode::Test) => vec![
            stage("init-dist-paths", init_dist_paths),
            stage("build-templates", build_templates),
            stage("minify-bundles", minify_bundles),
            stage("publish-decision", publish_decision),
            stage("write-prod-includes", write_prod_includes),
        ],
        None => vec![stage("write-dev-includes", write_dev_includes)],
    }
}

/// Run the full pipeline for the selected mode.
pub fn run_mode(mode: Option<Mode>, config: BuildConfig) -> Result<()> {
    log!("stamp"; "builder v{}", env!("CARGO_PKG_VERSION"));

    let timeout = config.stage_timeout();
    let mut ctx = PipelineCtx::new(config)?;
    for stage in stages_for(mode) {
        let started = Instant::now();
        ctx = run_stage(&stage, ctx, timeout)?;
        debug!("pipeline"; "stage `{}` finished in {:.2?}", stage.name, started.elapsed());
    }
    Ok(())
}

fn run_stage(stage: &Stage, ctx: PipelineCtx, timeout: Duration) -> Result<PipelineCtx> {
    let result = if stage.interactive {
        let mut ctx = ctx;
        (stage.run)(&mut ctx).map(|()| ctx)
    } else {
        run_with_deadline(stage.name, stage.run, ctx, timeout)
    };
    result.with_context(|| format!("stage `{}` failed", stage.name))
}

/// Run a stage on a worker thread, failing the pipeline if it does not
/// complete within the deadline. A timed-out stage thread is abandoned.
fn run_with_deadline(
    name: &'static str,
    run: StageFn,
    mut ctx: PipelineCtx,
    timeout: Duration,
) -> Result<PipelineCtx> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = run(&mut ctx);
        let _ = tx.send((ctx, result));
    });
    match rx.recv_timeout(timeout) {
        Ok((ctx, result)) => result.map(|()| ctx),
        Err(mpsc::RecvTimeoutError::Timeout) => bail!("stage `{name}` timed out after {timeout:?}"),
        Err(mpsc::RecvTimeoutError::Disconnected) => bail!("stage `{name}` panicked"),
    }
}

// ============================================================================
// Stage functions
// ============================================================================

/// Recreate the staging directory and ensure the dist directory exists.
///
/// Must run before any later filesystem write.
fn init_dist_paths(ctx: &mut PipelineCtx) -> Result<()> {
    let staging = ctx.config.staging_path();
    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("unable to clear staging dir: {}", staging.display()))?;
    }
    fs::create_dir_all(&staging)
        .with_context(|| format!("unable to create staging dir: {}", staging.display()))?;

    let dist = ctx.config.dist_path();
    fs::create_dir_all(&dist)
        .with_context(|| format!("unable to create dist dir: {}", dist.display()))?;
    Ok(())
}

fn build_templates(ctx: &mut PipelineCtx) -> Result<()> {
    if let Some(artifact) = asset::templates::build_template_bundle(&ctx.config)? {
        ctx.artifacts.push(artifact);
    }
    Ok(())
}

fn minify_bundles(ctx: &mut PipelineCtx) -> Result<()> {
    let bundled = asset::bundle::build_bundles(&ctx.config)?;
    ctx.artifacts.extend(bundled);
    Ok(())
}

fn publish_decision(ctx: &mut PipelineCtx) -> Result<()> {
    ctx.resolved = publish::publish_artifacts(&ctx.config, &ctx.artifacts, &mut ctx.store)?;
    Ok(())
}

fn write_prod_includes(ctx: &mut PipelineCtx) -> Result<()> {
    let tags = includes::prod_tags(&ctx.config, &ctx.resolved)?;
    includes::write_includes(&ctx.config, &tags, true)
}

fn push_remote(ctx: &mut PipelineCtx) -> Result<()> {
    remote::push(&ctx.config)
}

fn write_dev_includes(ctx: &mut PipelineCtx) -> Result<()> {
    let tags = includes::dev_tags(&ctx.config);
    includes::write_includes(&ctx.config, &tags, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileBundle;
    use tempfile::TempDir;

    fn project(dir: &TempDir) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.root = dir.path().to_path_buf();
        fs::write(dir.path().join("a.js"), "const a = 1;\nconsole.log(a);\n").unwrap();
        fs::write(dir.path().join("c.css"), "body {\n  color: red;\n}\n").unwrap();
        config.files.scripts.push(FileBundle {
            name: "script".to_string(),
            sources: vec!["a.js".to_string()],
        });
        config.files.styles.push(FileBundle {
            name: "style".to_string(),
            sources: vec!["c.css".to_string()],
        });
        config
    }

    #[test]
    fn test_test_mode_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);

        run_mode(Some(Mode::Test), config.clone()).unwrap();

        // version-stamped distribution entries at the start version
        assert!(config.dist_path().join("script-3000.min.js").exists());
        assert!(config.dist_path().join("style-3000.min.css").exists());

        // production includes reference the stamped names
        let scripts = fs::read_to_string(config.script_include_path()).unwrap();
        assert!(scripts.contains("dist/script-3000.min.js"));
        let styles = fs::read_to_string(config.style_include_path()).unwrap();
        assert!(styles.contains("dist/style-3000.min.css"));

        // version state written
        let state = fs::read_to_string(config.version_path()).unwrap();
        assert!(state.contains("\"script\":3000"));
    }

    #[test]
    fn test_second_run_unchanged_keeps_versions() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);

        run_mode(Some(Mode::Test), config.clone()).unwrap();
        run_mode(Some(Mode::Test), config.clone()).unwrap();

        let entries = fs::read_dir(config.dist_path()).unwrap().count();
        assert_eq!(entries, 2); // still one entry per bundle
    }

    #[test]
    fn test_changed_source_bumps_version() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);

        run_mode(Some(Mode::Test), config.clone()).unwrap();
        fs::write(dir.path().join("a.js"), "console.log(2);\n").unwrap();
        run_mode(Some(Mode::Test), config.clone()).unwrap();

        assert!(config.dist_path().join("script-3001.min.js").exists());
        // style bundle did not change
        assert!(!config.dist_path().join("style-3001.min.css").exists());
    }

    #[test]
    fn test_dev_mode_only_writes_includes() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);

        run_mode(None, config.clone()).unwrap();

        let scripts = fs::read_to_string(config.script_include_path()).unwrap();
        assert_eq!(scripts, "<script src=\"a.js\"></script>\n");
        assert!(!config.dist_path().exists());
        assert!(!config.staging_path().exists());
    }

    #[test]
    fn test_staging_dir_recreated_each_run() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);

        run_mode(Some(Mode::Test), config.clone()).unwrap();
        fs::write(config.staging_path().join("leftover"), "x").unwrap();
        run_mode(Some(Mode::Test), config.clone()).unwrap();

        assert!(!config.staging_path().join("leftover").exists());
    }

    #[test]
    fn test_stage_deadline_enforced() {
        fn sleepy(_ctx: &mut PipelineCtx) -> Result<()> {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        }

        let dir = TempDir::new().unwrap();
        let mut config = BuildConfig::default();
        config.root = dir.path().to_path_buf();
        let ctx = PipelineCtx::new(config).unwrap();

        let err =
            run_with_deadline("sleepy", sleepy, ctx, Duration::from_millis(50)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_stage_error_propagates() {
        fn failing(_ctx: &mut PipelineCtx) -> Result<()> {
            bail!("boom")
        }

        let dir = TempDir::new().unwrap();
        let mut config = BuildConfig::default();
        config.root = dir.path().to_path_buf();
        let ctx = PipelineCtx::new(config).unwrap();

        let err = run_stage(
            &stage("failing", failing),
            ctx,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("stage `failing` failed"));
    }
}
