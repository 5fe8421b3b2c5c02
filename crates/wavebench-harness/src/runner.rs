//! Acceptance test runner invocation.
//!
//! The test runner is an external collaborator: the pipeline only needs
//! "run this feature's acceptance tests against the worktree and leave a
//! JUnit report at this path". The trait seam keeps the pipeline testable
//! with a canned-report fake instead of a real runner.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::HarnessError;

/// Runs one feature's acceptance tests and writes a JUnit XML report.
pub trait AcceptanceRunner {
    /// Run the acceptance tests for `feature_id` inside `worktree`,
    /// writing the JUnit report to `report_path`.
    ///
    /// Failing tests are not an error: they show up in the report. Only a
    /// runner that cannot be invoked at all is an `Err`. A runner that
    /// crashes before producing a report simply leaves `report_path`
    /// absent, which the pipeline treats as "no score for this feature".
    ///
    /// # Errors
    ///
    /// Implementation-defined invocation failures.
    fn run(
        &self,
        feature_id: &str,
        worktree: &Path,
        report_path: &Path,
    ) -> Result<(), HarnessError>;
}

/// Production runner invoking `pytest` over the acceptance suite.
///
/// Matches the target repository's layout: each feature's tests live at
/// `tests/acceptance/test_{feature}_*.py` relative to the worktree.
#[derive(Debug, Clone)]
pub struct PytestRunner {
    /// Program to invoke, normally `"pytest"`
    pub program: String,
    /// Acceptance test directory relative to the worktree
    pub test_root: String,
}

impl PytestRunner {
    /// Runner with the default program name and test layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "pytest".to_string(),
            test_root: "tests/acceptance".to_string(),
        }
    }
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceptanceRunner for PytestRunner {
    fn run(
        &self,
        feature_id: &str,
        worktree: &Path,
        report_path: &Path,
    ) -> Result<(), HarnessError> {
        let test_glob = format!("{}/test_{}_*.py", self.test_root, feature_id.to_lowercase());
        let junit_arg = format!("--junitxml={}", report_path.display());

        tracing::debug!(feature_id, test_glob, "running acceptance tests");

        // Exit status is deliberately ignored: failing tests exit nonzero
        // but still produce the report.
        let output = Command::new(&self.program)
            .args([test_glob.as_str(), junit_arg.as_str(), "-q"])
            .current_dir(worktree)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| HarnessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(
                feature_id,
                status = ?output.status.code(),
                "acceptance run exited nonzero (failing tests or runner error)"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runner_targets_pytest() {
        let runner = PytestRunner::new();
        assert_eq!(runner.program, "pytest");
        assert_eq!(runner.test_root, "tests/acceptance");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = PytestRunner {
            program: "definitely-not-a-real-runner".to_string(),
            test_root: "tests".to_string(),
        };
        let dir = tempfile::tempdir().unwrap();
        let err = runner
            .run("F1", dir.path(), &dir.path().join("out.xml"))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }));
    }
}
