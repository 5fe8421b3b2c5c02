//! Git worktree patch controller.
//!
//! Wraps the single shared checkout of the pinned target repository that
//! every treatment's patches are applied to and reverted from. All
//! operations shell out to `git` with the worktree as working directory and
//! captured output; this is the only part of the system that mutates shared
//! external state.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::error::HarnessError;

/// Result of the worktree preflight check.
///
/// Each failed condition contributes one human-readable issue; an empty
/// list means the worktree is ready for a collection run.
#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    /// Problems found, empty when the worktree is ready
    pub issues: Vec<String>,
}

impl PreflightReport {
    /// True when no issues were found.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Handle to the pinned git worktree.
///
/// The worktree is a single shared filesystem resource; operations are
/// strictly sequential and the caller is responsible for calling
/// [`Worktree::revert`] after every mutation attempt.
#[derive(Debug, Clone)]
pub struct Worktree {
    path: PathBuf,
}

impl Worktree {
    /// Wrap an existing checkout directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory this worktree operates on.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a patch file, gated by a dry-run check.
    ///
    /// `git apply --check` runs first; if it fails the worktree is left
    /// untouched and `Ok(false)` is returned. Blind application can
    /// partially succeed and leave a half-modified tree, which the dry-run
    /// gate prevents for the common case. A patch that passes the check
    /// but fails real application still returns `Ok(false)`; the tree is
    /// then in a best-effort state the caller must revert.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Spawn`] if `git` itself cannot be invoked.
    pub fn apply_patch(&self, patch: &Path) -> Result<bool, HarnessError> {
        let check = self.git(&["apply", "--check", &patch.to_string_lossy()])?;
        if !check.status.success() {
            tracing::debug!(
                patch = %patch.display(),
                stderr = %String::from_utf8_lossy(&check.stderr),
                "patch failed dry-run check"
            );
            return Ok(false);
        }

        let applied = self.git(&["apply", &patch.to_string_lossy()])?;
        if !applied.status.success() {
            tracing::warn!(
                patch = %patch.display(),
                stderr = %String::from_utf8_lossy(&applied.stderr),
                "patch passed dry-run but failed application"
            );
        }
        Ok(applied.status.success())
    }

    /// Discard all tracked modifications and delete untracked files,
    /// restoring the last-committed state.
    ///
    /// Idempotent: reverting an already-clean tree succeeds and changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Spawn`] if `git` cannot be invoked,
    /// [`HarnessError::Git`] if either revert command exits nonzero.
    pub fn revert(&self) -> Result<(), HarnessError> {
        self.git_ok(&["checkout", "."])?;
        self.git_ok(&["clean", "-fd"])?;
        tracing::debug!(worktree = %self.path.display(), "worktree reverted");
        Ok(())
    }

    /// Verify the worktree is ready for a collection run.
    ///
    /// Checks, in order: the directory exists, it is a git repository,
    /// `HEAD` matches the expected pin (the pin may be an abbreviated
    /// commit id; prefix match in either direction), and the tree has no
    /// uncommitted changes. Conditions after a missing/non-git directory
    /// are skipped since git commands cannot run there.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Spawn`] if `git` cannot be invoked.
    pub fn preflight(&self, expected_commit: Option<&str>) -> Result<PreflightReport, HarnessError> {
        let mut report = PreflightReport::default();

        if !self.path.is_dir() {
            report
                .issues
                .push(format!("worktree not found: {}", self.path.display()));
            return Ok(report);
        }
        if !self.path.join(".git").exists() {
            report.issues.push(format!(
                "not a git repository (no .git): {}",
                self.path.display()
            ));
            return Ok(report);
        }

        if let Some(pin) = expected_commit {
            let head = self.git(&["rev-parse", "HEAD"])?;
            let actual = String::from_utf8_lossy(&head.stdout).trim().to_string();
            if !head.status.success() {
                report.issues.push("git rev-parse HEAD failed".to_string());
            } else if !actual.starts_with(pin) && !pin.starts_with(&actual) {
                report.issues.push(format!(
                    "worktree commit {actual} does not match expected pin {pin}"
                ));
            }
        }

        let status = self.git(&["status", "--porcelain"])?;
        if !status.status.success() {
            report.issues.push("git status failed".to_string());
        } else if !status.stdout.is_empty() {
            report.issues.push(format!(
                "worktree is dirty (uncommitted changes):\n{}",
                String::from_utf8_lossy(&status.stdout).trim_end()
            ));
        }

        Ok(report)
    }

    fn git(&self, args: &[&str]) -> Result<Output, HarnessError> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.output().map_err(|source| HarnessError::Spawn {
            program: "git".to_string(),
            source,
        })
    }

    fn git_ok(&self, args: &[&str]) -> Result<(), HarnessError> {
        let output = self.git(args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(HarnessError::Git {
                args: args.join(" "),
                worktree: self.path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let worktree = Worktree::new(dir.path().join("nonexistent"));
        let report = worktree.preflight(None).unwrap();
        assert!(!report.is_ok());
        assert!(report.issues[0].contains("not found"));
    }

    #[test]
    fn preflight_reports_plain_directory() {
        let dir = tempfile::tempdir().unwrap();
        let worktree = Worktree::new(dir.path());
        let report = worktree.preflight(None).unwrap();
        assert!(report.issues.iter().any(|i| i.contains(".git")));
    }

    #[test]
    fn empty_report_is_ok() {
        assert!(PreflightReport::default().is_ok());
    }
}
