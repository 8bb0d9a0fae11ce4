//! Merge through the GitHub merge endpoint

use crate::config::GithubApiMergeConfig;
use crate::error::{Error, Result};
use crate::merge::failure::{Failure, FailureCause};
use crate::merge::pull_request::PullRequest;
use crate::merge::strategy::{
    MergeStrategy, StrategyContext, cherry_pick_into_targets, delete_temp_branches,
    fetch_into_temp_branches, pr_commit_range, push_targets, satisfies_base_sha,
};
use crate::types::{MergeMethod, MergeRequest};
use async_trait::async_trait;
use tracing::debug;

/// Merges the PR into its GitHub base branch through the API, then
/// cherry-picks the merged commits into the remaining target branches
pub struct GithubApiMergeStrategy<'a> {
    ctx: StrategyContext<'a>,
    api: &'a GithubApiMergeConfig,
}

impl<'a> GithubApiMergeStrategy<'a> {
    /// Create the strategy
    pub const fn new(ctx: StrategyContext<'a>, api: &'a GithubApiMergeConfig) -> Self {
        Self { ctx, api }
    }

    /// Default squash commit: title with PR reference, then body
    fn default_squash_message(pr: &PullRequest) -> String {
        let mut message = format!("{} (#{})", pr.title, pr.number);
        if let Some(body) = pr.body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            message.push_str("\n\n");
            message.push_str(body);
        }
        message
    }

    fn build_request(&self, pr: &PullRequest, method: MergeMethod) -> Result<MergeRequest> {
        let mut request = MergeRequest {
            method,
            commit_title: None,
            commit_message: None,
            sha: Some(pr.head_sha.clone()),
        };
        if method != MergeMethod::Squash {
            return Ok(request);
        }

        let mut message = Self::default_squash_message(pr);
        if pr.needs_commit_message_fixup
            && let Some(edited) = self.ctx.prompt.edit(&message)?
        {
            message = edited;
        }
        let (title, body) = split_commit_message(&message);
        request.commit_title = Some(title);
        request.commit_message = Some(format!("{body}PR Close #{}", pr.number));
        Ok(request)
    }
}

/// Split a commit message into its subject and the rest
///
/// The rest keeps a trailing blank line when non-empty so footers can be
/// appended directly.
fn split_commit_message(message: &str) -> (String, String) {
    let message = message.trim();
    match message.split_once('\n') {
        Some((title, rest)) => {
            let rest = rest.trim();
            let body = if rest.is_empty() {
                String::new()
            } else {
                format!("{rest}\n\n")
            };
            (title.trim().to_string(), body)
        }
        None => (message.to_string(), String::new()),
    }
}

#[async_trait]
impl MergeStrategy for GithubApiMergeStrategy<'_> {
    async fn prepare(&self, pr: &PullRequest) -> Result<()> {
        fetch_into_temp_branches(self.ctx.git, pr).await
    }

    async fn merge(&self, pr: &PullRequest) -> Result<Option<Failure>> {
        let git = self.ctx.git;

        if !pr.target_branches.contains(&pr.github_target_branch) {
            return Ok(Some(
                FailureCause::MismatchingTargetBranch(pr.target_branches.clone()).into(),
            ));
        }

        if !satisfies_base_sha(git, pr).await? {
            return Ok(Some(FailureCause::UnsatisfiedBaseSha.into()));
        }

        let method = self.api.method_for(&pr.labels);
        if pr.needs_commit_message_fixup && method != MergeMethod::Squash {
            return Ok(Some(FailureCause::UnableToFixupCommitMessageSquashOnly.into()));
        }

        let cherry_pick_branches: Vec<String> = pr
            .target_branches
            .iter()
            .filter(|b| **b != pr.github_target_branch)
            .cloned()
            .collect();

        // Refuse to merge on GitHub if a later cherry-pick would conflict.
        if !cherry_pick_branches.is_empty() {
            let range = pr_commit_range(git, pr).await?;
            let failed = cherry_pick_into_targets(git, &range, &cherry_pick_branches, true).await?;
            if !failed.is_empty() {
                return Ok(Some(FailureCause::MergeConflicts(failed).into()));
            }
        }

        let request = self.build_request(pr, method)?;
        debug!(pr_number = pr.number, %method, "merging through the GitHub API");
        let result = match self.ctx.platform.merge_pull_request(pr.number, &request).await {
            Ok(result) => result,
            Err(e) => {
                return match e.status() {
                    Some(403 | 404) => Ok(Some(FailureCause::InsufficientPermissions.into())),
                    Some(405 | 409) => Ok(Some(
                        FailureCause::MergeConflicts(vec![pr.github_target_branch.clone()]).into(),
                    )),
                    _ => Err(e),
                };
            }
        };

        if !result.merged {
            return Err(Error::GitHubApi(format!(
                "Unexpected merge response for #{}: {}",
                pr.number,
                result.message.as_deref().unwrap_or("not merged")
            )));
        }

        if cherry_pick_branches.is_empty() {
            return Ok(None);
        }

        let merge_sha = result.sha.ok_or_else(|| {
            Error::GitHubApi(format!("GitHub did not report the merge commit of #{}", pr.number))
        })?;
        let commit_count = if method == MergeMethod::Squash {
            1
        } else {
            pr.commit_count
        };

        git.fetch(&[format!("refs/heads/{}", pr.github_target_branch)])
            .await?;
        let range = format!("{merge_sha}~{commit_count}..{merge_sha}");
        let failed = cherry_pick_into_targets(git, &range, &cherry_pick_branches, false).await?;
        if !failed.is_empty() {
            return Ok(Some(FailureCause::MergeConflicts(failed).into()));
        }

        push_targets(git, &cherry_pick_branches).await?;
        Ok(None)
    }

    async fn cleanup(&self, pr: &PullRequest) -> Result<()> {
        delete_temp_branches(self.ctx.git, pr).await
    }
}
