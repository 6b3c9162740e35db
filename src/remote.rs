//! Remote push via rsync, gated by an interactive confirmation.

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::time::Duration;

use crate::config::{BuildConfig, RemoteConfig};
use crate::log;
use crate::utils::exec::Cmd;

/// Hard limit for the rsync invocation.
const PUSH_TIMEOUT: Duration = Duration::from_secs(1800);

/// Push the project root to the configured remote.
///
/// A negative answer skips the push and the pipeline continues. A nonzero
/// rsync exit is an error that halts the pipeline; already published
/// distribution entries are not rolled back.
pub fn push(config: &BuildConfig) -> Result<()> {
    let remote = &config.remote;
    if remote.push_path.is_empty() {
        log!("push"; "no remote path configured, skipping push");
        return Ok(());
    }

    let dest = destination(remote);
    if !confirm(&dest)? {
        log!("push"; "{}", "remote push aborted".yellow());
        return Ok(());
    }

    which::which("rsync").context("rsync not found in PATH")?;

    let mut cmd = Cmd::new("rsync").args(["-avzhO", "--include=.htaccess"]);
    if !remote.ssh_host.is_empty() {
        cmd = cmd.args(["-e", "ssh"]);
    }
    if let Some(exclude) = &remote.exclude_from {
        let path = config.root_join(exclude);
        if path.exists() {
            cmd = cmd.arg(format!("--exclude-from={}", path.display()));
        }
    }

    // trailing slash: sync the root's contents, not the directory itself
    let source = format!("{}/", config.root.display());
    log!("push"; "ok. lets do this: {}", format!("rsync {source} {dest}").cyan());

    let status = cmd
        .arg(&source)
        .arg(&dest)
        .cwd(&config.root)
        .timeout(PUSH_TIMEOUT)
        .run()?;

    if !status.success() {
        bail!("rsync exited with code {}", status.code().unwrap_or(-1));
    }
    log!("push"; "push complete!");
    Ok(())
}

/// Resolve the rsync destination argument.
///
/// Local destinations get `~` expanded because spawn does not know about
/// shell aliases; ssh destinations are passed through for the remote shell
/// to expand.
fn destination(remote: &RemoteConfig) -> String {
    if remote.ssh_host.is_empty() {
        shellexpand::tilde(&remote.push_path).into_owned()
    } else {
        format!("{}:{}", remote.ssh_host, remote.push_path)
    }
}

/// Prompt for confirmation before pushing.
fn confirm(dest: &str) -> Result<bool> {
    eprint!(
        "about to push files to [{}] proceed? [enter = continue, no = abort] ",
        dest.cyan()
    );
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    // any answer containing 'n' aborts
    Ok(!input.trim().to_lowercase().contains('n'))
}
