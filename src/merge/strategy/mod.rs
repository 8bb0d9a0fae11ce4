//! Merge strategies
//!
//! A strategy lands a validated pull request on its target branches. Both
//! strategies work on temporary local branches: the PR head is fetched into
//! [`TEMP_PR_HEAD_BRANCH`] and every target branch into
//! `merge_pr_target_<branch>`. Nothing is pushed until all target branches
//! were updated locally, and the final push is atomic.

mod api_merge;
mod autosquash;

pub use api_merge::GithubApiMergeStrategy;
pub use autosquash::AutosquashMergeStrategy;

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::merge::failure::Failure;
use crate::merge::pull_request::PullRequest;
use crate::platform::PlatformService;
use crate::prompt::Prompt;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Local branch the PR head is fetched into
pub const TEMP_PR_HEAD_BRANCH: &str = "merge_pr_head";

/// Local branch a target branch is fetched into
pub fn temp_target_branch(branch: &str) -> String {
    format!("merge_pr_target_{branch}")
}

/// Lands a pull request on its target branches
#[async_trait]
pub trait MergeStrategy: Send + Sync {
    /// Fetch everything the merge needs into temporary branches
    async fn prepare(&self, pr: &PullRequest) -> Result<()>;

    /// Perform the merge
    ///
    /// `Ok(Some(_))` is a merge failure the operator should see; `Err` is
    /// an unexpected git or GitHub error.
    async fn merge(&self, pr: &PullRequest) -> Result<Option<Failure>>;

    /// Delete the temporary branches
    async fn cleanup(&self, pr: &PullRequest) -> Result<()>;
}

/// Collaborators a strategy works with
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    /// Validated merge policy
    pub config: &'a MergeConfig,
    /// Remote platform
    pub platform: &'a dyn PlatformService,
    /// Local repository
    pub git: &'a dyn GitRepo,
    /// Operator interaction
    pub prompt: &'a dyn Prompt,
}

/// Names of the available strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Merge through the GitHub merge endpoint, cherry-pick into the rest
    GithubApi,
    /// Autosquash rebase locally, then push to every target branch
    Autosquash,
}

impl StrategyKind {
    /// Construct the strategy
    pub fn build<'a>(self, ctx: StrategyContext<'a>) -> Result<Box<dyn MergeStrategy + 'a>> {
        match self {
            Self::GithubApi => {
                let api = ctx.config.github_api_merge.as_ref().ok_or_else(|| {
                    Error::Config("the github-api strategy requires a github_api_merge section".into())
                })?;
                Ok(Box::new(GithubApiMergeStrategy::new(ctx, api)))
            }
            Self::Autosquash => Ok(Box::new(AutosquashMergeStrategy::new(ctx))),
        }
    }

    /// Name used in configuration files
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GithubApi => "github-api",
            Self::Autosquash => "autosquash",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "github-api" => Ok(Self::GithubApi),
            "autosquash" => Ok(Self::Autosquash),
            other => Err(format!(
                "Unknown merge strategy \"{other}\". Expected one of: github-api, autosquash."
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fetch_refspecs(pr: &PullRequest) -> Vec<String> {
    let mut refspecs = vec![format!("refs/pull/{}/head:{TEMP_PR_HEAD_BRANCH}", pr.number)];
    refspecs.extend(
        pr.target_branches
            .iter()
            .map(|b| format!("refs/heads/{b}:{}", temp_target_branch(b))),
    );
    refspecs
}

fn push_refspecs(branches: &[String]) -> Vec<String> {
    branches
        .iter()
        .map(|b| format!("{}:refs/heads/{b}", temp_target_branch(b)))
        .collect()
}

/// Fetch the PR head and all target branches into temporary branches
pub(crate) async fn fetch_into_temp_branches(git: &dyn GitRepo, pr: &PullRequest) -> Result<()> {
    debug!(pr_number = pr.number, targets = ?pr.target_branches, "fetching merge branches");
    git.fetch(&fetch_refspecs(pr)).await
}

/// Delete all temporary branches created for `pr`
pub(crate) async fn delete_temp_branches(git: &dyn GitRepo, pr: &PullRequest) -> Result<()> {
    let mut branches = vec![TEMP_PR_HEAD_BRANCH.to_string()];
    branches.extend(pr.target_branches.iter().map(|b| temp_target_branch(b)));
    git.delete_branches(&branches).await
}

/// Commit the PR's first commit is based on
pub(crate) async fn pr_base_sha(git: &dyn GitRepo, pr: &PullRequest) -> Result<String> {
    git.rev_parse(&format!("{TEMP_PR_HEAD_BRANCH}~{}", pr.commit_count))
        .await
}

/// Revision range covering the PR's commits on [`TEMP_PR_HEAD_BRANCH`]
pub(crate) async fn pr_commit_range(git: &dyn GitRepo, pr: &PullRequest) -> Result<String> {
    let base_sha = pr_base_sha(git, pr).await?;
    Ok(format!("{base_sha}..{TEMP_PR_HEAD_BRANCH}"))
}

/// Whether the PR head contains the required base commit, if any
pub(crate) async fn satisfies_base_sha(git: &dyn GitRepo, pr: &PullRequest) -> Result<bool> {
    match pr.required_base_sha {
        Some(ref sha) => git.has_commit(TEMP_PR_HEAD_BRANCH, sha).await,
        None => Ok(true),
    }
}

/// Cherry-pick `range` into the temporary branch of every target
///
/// Returns the branches that could not be cherry-picked cleanly.
pub(crate) async fn cherry_pick_into_targets(
    git: &dyn GitRepo,
    range: &str,
    branches: &[String],
    dry_run: bool,
) -> Result<Vec<String>> {
    let mut failed = Vec::new();
    for branch in branches {
        git.checkout(&temp_target_branch(branch), true).await?;
        if !git.cherry_pick(range, dry_run).await? {
            debug!(branch, range, dry_run, "cherry-pick conflicted");
            failed.push(branch.clone());
        }
    }
    Ok(failed)
}

/// Push the temporary branches of `branches` to the remote atomically
pub(crate) async fn push_targets(git: &dyn GitRepo, branches: &[String]) -> Result<()> {
    if branches.is_empty() {
        return Ok(());
    }
    debug!(branches = ?branches, "pushing target branches");
    git.push(&push_refspecs(branches)).await
}
