//! Git history and staged-diff adapters.
//!
//! Both shell out to `git` and stream stdout into the diff parser.
//! Stderr is drained on a separate thread so a chatty subprocess can
//! never deadlock the pipe.

use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::detect::Fragment;
use crate::diff::parser::parse_stream;

use super::{FragmentSource, SourceError};

/// Reads repository history via `git log -p -U0 --full-history`.
#[derive(Debug)]
pub struct GitLogSource {
    repo: PathBuf,
    /// Extra user options forwarded to `git log` (`--all`, commit
    /// ranges such as `foo...`, and similar).
    log_opts: Vec<String>,
}

impl GitLogSource {
    /// Creates a history reader for the repository at `repo`.
    #[must_use]
    pub fn new(repo: PathBuf, log_opts: Vec<String>) -> Self {
        Self { repo, log_opts }
    }
}

impl FragmentSource for GitLogSource {
    fn fragments(&self, sink: &mut dyn FnMut(Fragment)) -> Result<(), SourceError> {
        let mut args: Vec<String> = vec![
            "log".to_owned(),
            "-p".to_owned(),
            "-U0".to_owned(),
            "--full-history".to_owned(),
        ];
        args.extend(self.log_opts.iter().cloned());
        run_git(&self.repo, &args, sink)
    }
}

/// Reads the staged (index vs. HEAD) diff via `git diff --staged -U0`.
#[derive(Debug)]
pub struct StagedSource {
    repo: PathBuf,
}

impl StagedSource {
    /// Creates a staged-diff reader for the repository at `repo`.
    #[must_use]
    pub fn new(repo: PathBuf) -> Self {
        Self { repo }
    }
}

impl FragmentSource for StagedSource {
    fn fragments(&self, sink: &mut dyn FnMut(Fragment)) -> Result<(), SourceError> {
        let args: Vec<String> = vec![
            "diff".to_owned(),
            "--staged".to_owned(),
            "-U0".to_owned(),
        ];
        run_git(&self.repo, &args, sink)
    }
}

/// Spawns git, streams stdout through the diff parser, and reports a
/// source error on non-zero exit.
fn run_git(
    repo: &PathBuf,
    args: &[String],
    sink: &mut dyn FnMut(Fragment),
) -> Result<(), SourceError> {
    let describe = args.join(" ");
    let mut child = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SourceError::Git {
            args: describe.clone(),
            detail: format!("failed to spawn git: {e}"),
        })?;

    let stderr_thread = drain_stderr(&mut child);
    let Some(stdout) = child.stdout.take() else {
        return Err(SourceError::Git {
            args: describe,
            detail: "stdout pipe unavailable".to_owned(),
        });
    };

    parse_stream(BufReader::new(stdout), sink)?;

    let status = child.wait()?;
    let stderr = stderr_thread
        .and_then(|t| t.join().ok())
        .unwrap_or_default();
    if !status.success() {
        return Err(SourceError::Git {
            args: describe,
            detail: format!("exited with {status}: {}", stderr.trim()),
        });
    }
    Ok(())
}

fn drain_stderr(child: &mut Child) -> Option<std::thread::JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    }))
}
