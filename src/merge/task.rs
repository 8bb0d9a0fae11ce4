//! A single merge attempt of one pull request

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::merge::failure::Failure;
use crate::merge::pull_request::{PullRequest, load_and_validate_pull_request};
use crate::merge::strategy::{MergeStrategy, StrategyContext};
use crate::platform::PlatformService;
use crate::prompt::Prompt;
use tracing::{debug, warn};

/// Behavior switches for a merge task
#[derive(Debug, Clone, Copy)]
pub struct TaskFlags {
    /// Ask for confirmation of the target branches before merging
    pub branch_prompt: bool,
}

impl Default for TaskFlags {
    fn default() -> Self {
        Self {
            branch_prompt: true,
        }
    }
}

/// Outcome of a merge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// The pull request was merged
    Success,
    /// The local working copy has uncommitted changes
    DirtyWorkingDir,
    /// A git command failed unexpectedly
    UnknownGitError,
    /// A GitHub request failed unexpectedly
    GithubError {
        /// Description of the failed request
        message: String,
    },
    /// The operator declined to proceed
    UserAborted,
    /// The pull request could not be merged
    Failed(Failure),
}

impl MergeResult {
    /// The failure, if the pull request could not be merged
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Map an unexpected error onto a result
///
/// Only authentication failures propagate, so the caller can explain how to
/// fix the token. Everything else ends the attempt with a result.
fn classify(err: Error) -> Result<MergeResult> {
    match err {
        Error::Unauthorized(_) => Err(err),
        Error::GitHubStatus { .. }
        | Error::GitHubApi(_)
        | Error::Timeout(..)
        | Error::Platform(_)
        | Error::Http(_)
        | Error::Auth(_)
        | Error::Registry(_) => {
            warn!(error = %err, "remote request failed during merge");
            Ok(MergeResult::GithubError {
                message: err.to_string(),
            })
        }
        // Local failures, including a prompt that could not be answered.
        Error::Git { .. }
        | Error::Io(_)
        | Error::Config(_)
        | Error::InvalidConfig(_)
        | Error::Internal(_) => {
            warn!(error = %err, "local failure during merge");
            Ok(MergeResult::UnknownGitError)
        }
    }
}

/// Message for the target branch confirmation
pub fn branch_prompt_message(pr: &PullRequest) -> String {
    format!(
        "Pull request #{} by {} ({}) will merge into: {}\nDo you want to proceed merging?",
        pr.number,
        pr.author,
        pr.url,
        pr.target_branches.join(", ")
    )
}

/// Merges one pull request with a validated configuration
pub struct PullRequestMergeTask<'a> {
    config: &'a MergeConfig,
    platform: &'a dyn PlatformService,
    git: &'a dyn GitRepo,
    prompt: &'a dyn Prompt,
    flags: TaskFlags,
}

impl<'a> PullRequestMergeTask<'a> {
    /// Create a task
    pub const fn new(
        config: &'a MergeConfig,
        platform: &'a dyn PlatformService,
        git: &'a dyn GitRepo,
        prompt: &'a dyn Prompt,
        flags: TaskFlags,
    ) -> Self {
        Self {
            config,
            platform,
            git,
            prompt,
            flags,
        }
    }

    const fn context(&self) -> StrategyContext<'a> {
        StrategyContext {
            config: self.config,
            platform: self.platform,
            git: self.git,
            prompt: self.prompt,
        }
    }

    /// Attempt to merge `pr_number`
    ///
    /// The working copy is checked before anything is requested from GitHub.
    /// Once a strategy ran, the previously checked out branch is restored and
    /// temporary branches are deleted whatever the outcome. Only errors that
    /// cannot be expressed as a [`MergeResult`] are returned as `Err`.
    pub async fn merge(&self, pr_number: u64, ignore_non_fatal: bool) -> Result<MergeResult> {
        match self.attempt(pr_number, ignore_non_fatal).await {
            Ok(result) => Ok(result),
            Err(e) => classify(e),
        }
    }

    async fn attempt(&self, pr_number: u64, ignore_non_fatal: bool) -> Result<MergeResult> {
        if self.git.has_uncommitted_changes().await? {
            return Ok(MergeResult::DirtyWorkingDir);
        }

        let pr = match load_and_validate_pull_request(
            self.platform,
            self.config,
            pr_number,
            ignore_non_fatal,
        )
        .await?
        {
            Ok(pr) => pr,
            Err(failure) => return Ok(MergeResult::Failed(failure)),
        };

        if self.flags.branch_prompt && !self.prompt.confirm(&branch_prompt_message(&pr))? {
            return Ok(MergeResult::UserAborted);
        }

        let strategy = pr.strategy.build(self.context())?;
        let previous = self.git.current_branch_or_revision().await?;
        debug!(pr_number, strategy = %pr.strategy, %previous, "running merge strategy");

        let outcome = Self::run_strategy(strategy.as_ref(), &pr).await;
        self.restore(strategy.as_ref(), &pr, &previous).await;

        Ok(outcome?.map_or(MergeResult::Success, MergeResult::Failed))
    }

    async fn run_strategy(
        strategy: &dyn MergeStrategy,
        pr: &PullRequest,
    ) -> Result<Option<Failure>> {
        strategy.prepare(pr).await?;
        strategy.merge(pr).await
    }

    /// Return to `previous` and delete temporary branches
    ///
    /// Failures are logged rather than returned: the merge outcome is
    /// already decided at this point.
    async fn restore(&self, strategy: &dyn MergeStrategy, pr: &PullRequest, previous: &str) {
        if let Err(e) = self.git.checkout(previous, true).await {
            warn!(error = %e, %previous, "failed to restore the previously checked out revision");
        }
        if let Err(e) = strategy.cleanup(pr).await {
            warn!(error = %e, "failed to delete temporary merge branches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_errors_are_classified() {
        let result = classify(Error::Git {
            args: "push".into(),
            stderr: "rejected".into(),
        })
        .unwrap();
        assert_eq!(result, MergeResult::UnknownGitError);
    }

    #[test]
    fn test_unauthorized_propagates() {
        let err = classify(Error::Unauthorized("Bad credentials".into())).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_local_failures_are_unknown_git_errors() {
        let spawn = std::io::Error::new(std::io::ErrorKind::NotFound, "git not found");
        for err in [
            Error::Io(spawn),
            Error::Config("bad strategy".into()),
            Error::Internal("prompt failed".into()),
            Error::InvalidConfig(vec!["No label configuration.".into()]),
        ] {
            assert_eq!(classify(err).unwrap(), MergeResult::UnknownGitError);
        }
    }

    #[test]
    fn test_timeout_becomes_github_error() {
        let result = classify(Error::Timeout(60, "fetch pull request".into())).unwrap();
        assert!(matches!(result, MergeResult::GithubError { .. }));
    }

    #[test]
    fn test_github_status_becomes_github_error() {
        let result = classify(Error::from_status(500, "boom")).unwrap();
        assert!(matches!(result, MergeResult::GithubError { .. }));
    }
}
