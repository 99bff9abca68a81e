//! Source control client for committing accepted plans
//!
//! Train builds record the accepted plan file in version control. The trait is
//! the seam; `SystemGit` drives the system git binary.

use crate::core::error::{CuratorError, CuratorResult, GitError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Stage, commit and push an accepted plan file
pub trait SourceControlClient: Send + Sync {
  fn commit_and_push(&self, file: &Path, message: &str) -> CuratorResult<()>;
}

/// SourceControlClient backed by the system git binary
pub struct SystemGit {
  root: PathBuf,
  remote: String,
  branch: String,
}

impl SystemGit {
  pub fn new(root: impl Into<PathBuf>, remote: impl Into<String>, branch: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      remote: remote.into(),
      branch: branch.into(),
    }
  }

  fn git(&self, args: &[&str]) -> CuratorResult<()> {
    let output = Command::new("git").current_dir(&self.root).args(args).output()?;
    if !output.status.success() {
      return Err(CuratorError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(())
  }
}

impl SourceControlClient for SystemGit {
  fn commit_and_push(&self, file: &Path, message: &str) -> CuratorResult<()> {
    let file = file.to_string_lossy().into_owned();
    self.git(&["add", &file])?;
    self.git(&["commit", "-m", message])?;
    self.git(&["push", &self.remote, &self.branch]).map_err(|e| {
      CuratorError::Git(GitError::PushFailed {
        remote: self.remote.clone(),
        branch: self.branch.clone(),
        reason: e.to_string(),
      })
    })
  }
}
