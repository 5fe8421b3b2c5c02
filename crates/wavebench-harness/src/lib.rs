//! Wavebench Harness - collection-side collaborators
//!
//! Everything side-effecting in the scoring system:
//! - [`Worktree`]: dry-run-gated patch application and unconditional
//!   revert against the pinned git checkout
//! - [`AcceptanceRunner`] / [`PytestRunner`]: external test-runner
//!   invocation producing JUnit reports
//! - [`ScoreStore`]: per-treatment JSON score records
//! - [`ScoreCollector`]: the sequential apply / test / parse / revert
//!   pipeline
//!
//! Execution is single-threaded and strictly sequential: the worktree is
//! one shared filesystem resource with no isolation between features, so
//! the pipeline never overlaps two feature attempts.

#![warn(unreachable_pub)]

pub mod collect;
pub mod error;
pub mod runner;
pub mod store;
pub mod worktree;

// Re-exports for convenience
pub use collect::{patch_path, ScoreCollector};
pub use error::HarnessError;
pub use runner::{AcceptanceRunner, PytestRunner};
pub use store::ScoreStore;
pub use worktree::{PreflightReport, Worktree};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
