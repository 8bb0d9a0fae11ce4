//! Local autosquash merge

use crate::error::Result;
use crate::merge::failure::{Failure, FailureCause};
use crate::merge::pull_request::PullRequest;
use crate::merge::strategy::{
    MergeStrategy, StrategyContext, TEMP_PR_HEAD_BRANCH, cherry_pick_into_targets,
    delete_temp_branches, fetch_into_temp_branches, pr_base_sha, push_targets,
    satisfies_base_sha,
};
use async_trait::async_trait;
use tracing::debug;

/// Squashes fixup commits locally, then pushes the PR's commits to every
/// target branch
///
/// GitHub does not see a merge, so the PR is closed with a comment when it
/// does not target the default branch.
pub struct AutosquashMergeStrategy<'a> {
    ctx: StrategyContext<'a>,
}

impl<'a> AutosquashMergeStrategy<'a> {
    /// Create the strategy
    pub const fn new(ctx: StrategyContext<'a>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MergeStrategy for AutosquashMergeStrategy<'_> {
    async fn prepare(&self, pr: &PullRequest) -> Result<()> {
        fetch_into_temp_branches(self.ctx.git, pr).await
    }

    async fn merge(&self, pr: &PullRequest) -> Result<Option<Failure>> {
        let git = self.ctx.git;

        if !satisfies_base_sha(git, pr).await? {
            return Ok(Some(FailureCause::UnsatisfiedBaseSha.into()));
        }

        // The base commit stays put across the rebase, so the range remains
        // valid afterwards.
        let base_sha = pr_base_sha(git, pr).await?;
        let range = format!("{base_sha}..{TEMP_PR_HEAD_BRANCH}");

        let before_rebase = git.current_branch_or_revision().await?;
        git.rebase_autosquash(&base_sha, TEMP_PR_HEAD_BRANCH, pr.needs_commit_message_fixup)
            .await?;
        git.checkout(&before_rebase, true).await?;

        git.append_to_commit_messages(&range, &format!("PR Close #{}", pr.number))
            .await?;

        let failed = cherry_pick_into_targets(git, &range, &pr.target_branches, false).await?;
        if !failed.is_empty() {
            return Ok(Some(FailureCause::MergeConflicts(failed).into()));
        }

        push_targets(git, &pr.target_branches).await?;

        if pr.github_target_branch != self.ctx.config.default_branch {
            debug!(pr_number = pr.number, "closing pull request after push");
            let body = format!(
                "The changes were merged into the following branches: {}",
                pr.target_branches.join(", ")
            );
            self.ctx.platform.create_comment(pr.number, &body).await?;
            self.ctx.platform.close_pull_request(pr.number).await?;
        }

        Ok(None)
    }

    async fn cleanup(&self, pr: &PullRequest) -> Result<()> {
        delete_temp_branches(self.ctx.git, pr).await
    }
}
