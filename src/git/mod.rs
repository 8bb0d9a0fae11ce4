//! Local git operations
//!
//! The merge strategies talk to the working copy only through [`GitRepo`],
//! so the orchestration can be exercised without a real repository.

mod client;

pub use client::{GitClient, HOOKS_DISABLE_ENV, authenticated_remote_url, redact};

use crate::error::Result;
use async_trait::async_trait;

/// Version-control primitives used by the merge tooling
#[async_trait]
pub trait GitRepo: Send + Sync {
    /// Whether the working copy has uncommitted changes
    async fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Currently checked out branch, or `None` for a detached HEAD
    async fn current_branch(&self) -> Result<Option<String>>;

    /// Currently checked out branch, falling back to the HEAD commit SHA
    async fn current_branch_or_revision(&self) -> Result<String> {
        match self.current_branch().await? {
            Some(branch) => Ok(branch),
            None => self.rev_parse("HEAD").await,
        }
    }

    /// Force-fetch refspecs from the authenticated remote
    async fn fetch(&self, refspecs: &[String]) -> Result<()>;

    /// Check out a branch or revision
    async fn checkout(&self, rev: &str, force: bool) -> Result<()>;

    /// Resolve a revision to a commit SHA
    async fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Whether `branch` contains the commit `sha`
    async fn has_commit(&self, branch: &str, sha: &str) -> Result<bool>;

    /// Rebase `branch` onto `base` with `--autosquash`
    ///
    /// When `edit_messages` is set the interactive todo list is shown so the
    /// operator can reword commits. The rebase is aborted on failure.
    async fn rebase_autosquash(&self, base: &str, branch: &str, edit_messages: bool) -> Result<()>;

    /// Append `line` to the message of every commit in `range`
    async fn append_to_commit_messages(&self, range: &str, line: &str) -> Result<()>;

    /// Cherry-pick `range` onto the checked out branch
    ///
    /// Returns `Ok(false)` on conflicts, after aborting the cherry-pick.
    /// A dry run never leaves commits behind.
    async fn cherry_pick(&self, range: &str, dry_run: bool) -> Result<bool>;

    /// Push refspecs to the authenticated remote in a single atomic push
    async fn push(&self, refspecs: &[String]) -> Result<()>;

    /// Force-delete local branches
    async fn delete_branches(&self, branches: &[String]) -> Result<()>;
}
