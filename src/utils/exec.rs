//! External command execution utilities.
//!
//! Builder API for running external commands with inherited terminal
//! streams and an optional hard timeout.
//!
//! # Example
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! Cmd::new("rsync")
//!     .args(["-avzhO", "src/", "host:dest/"])
//!     .cwd(root)
//!     .timeout(Duration::from_secs(1800))
//!     .run()?;
//! ```

use anyhow::{Context, Result, bail};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

/// Command builder for external process execution.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set a hard timeout; the process is killed when it elapses.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Run the command with inherited stdio and return its exit status.
    pub fn run(self) -> Result<ExitStatus> {
        let name = self.program.to_string_lossy().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))?;

        let Some(limit) = self.timeout else {
            return child
                .wait()
                .with_context(|| format!("failed to wait for `{name}`"));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to wait for `{name}`"))?
            {
                return Ok(status);
            }
            if started.elapsed() > limit {
                child.kill().ok();
                child.wait().ok();
                bail!("`{name}` timed out after {limit:?}");
            }
            thread::sleep(Duration::from_millis(100));
        }
    }
}
