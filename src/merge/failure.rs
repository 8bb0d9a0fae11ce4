//! Merge failures and their fatal/non-fatal classification

use thiserror::Error;

/// Why a pull request could not be merged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The PR does not exist on the remote
    #[error("Pull request could not be found upstream.")]
    NotFound,
    /// The PR was already merged
    #[error("Pull request has already been merged.")]
    AlreadyMerged,
    /// The PR was closed without merging
    #[error("Pull request is closed.")]
    Closed,
    /// The PR is still a draft
    #[error("Pull request is still a draft.")]
    Draft,
    /// The merge-ready label is missing
    #[error("Pull request is not marked as merge ready (missing \"{0}\" label).")]
    NotMergeReady(String),
    /// The CLA label is missing
    #[error("CLA has not been signed. Please make sure the PR author has signed the CLA.")]
    ClaUnsigned,
    /// A blocking label is present
    #[error("Pull request has the blocking label \"{0}\".")]
    BlockingLabel(String),
    /// No configured target label is present
    #[error("Pull request does not have a target label.")]
    NoTargetLabel,
    /// The target label resolved to an unusable branch set
    #[error("Invalid target branch: {0}")]
    InvalidTargetBranch(String),
    /// CI is failing
    #[error("Failing CI jobs.")]
    FailingCiJobs,
    /// CI is still running
    #[error("Pending CI jobs.")]
    PendingCiJobs,
    /// The PR targets a branch outside its target label's branches
    #[error("Pull request is set to the wrong base branch. Please update the PR in the GitHub UI to one of the following branches: {}.", .0.join(", "))]
    MismatchingTargetBranch(Vec<String>),
    /// The PR does not contain the required base commit
    #[error("Pull request has not been rebased recently and could be bypassing CI checks. Please rebase the PR.")]
    UnsatisfiedBaseSha,
    /// The PR does not apply cleanly to some target branches
    #[error("Could not merge pull request into the following branches due to merge conflicts: {}. Please rebase the PR or update the target label.", .0.join(", "))]
    MergeConflicts(Vec<String>),
    /// Commit message fixups require squash merging
    #[error("Unable to fixup commit message of pull request. Commit message can only be modified if the PR is merged using squash.")]
    UnableToFixupCommitMessageSquashOnly,
    /// The token lacks permission to merge
    #[error("Insufficient GitHub API permissions to merge pull request. Please ensure that your auth token has write access.")]
    InsufficientPermissions,
}

impl FailureCause {
    /// Whether an operator may explicitly override this failure
    ///
    /// Only policy gates are non-fatal. Anything describing the PR's actual
    /// state or the mechanics of merging is fatal.
    pub const fn is_non_fatal(&self) -> bool {
        match self {
            Self::NotMergeReady(_)
            | Self::BlockingLabel(_)
            | Self::FailingCiJobs
            | Self::PendingCiJobs => true,
            Self::NotFound
            | Self::AlreadyMerged
            | Self::Closed
            | Self::Draft
            | Self::ClaUnsigned
            | Self::NoTargetLabel
            | Self::InvalidTargetBranch(_)
            | Self::MismatchingTargetBranch(_)
            | Self::UnsatisfiedBaseSha
            | Self::MergeConflicts(_)
            | Self::UnableToFixupCommitMessageSquashOnly
            | Self::InsufficientPermissions => false,
        }
    }
}

/// A merge failure with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What went wrong
    pub cause: FailureCause,
    /// Message shown to the operator
    pub message: String,
    /// Whether the failure may be forcibly ignored
    pub non_fatal: bool,
}

impl Failure {
    /// Create a failure from its cause
    pub fn new(cause: FailureCause) -> Self {
        Self {
            message: cause.to_string(),
            non_fatal: cause.is_non_fatal(),
            cause,
        }
    }
}

impl From<FailureCause> for Failure {
    fn from(cause: FailureCause) -> Self {
        Self::new(cause)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
