//! Interactive merge session with a single forced retry

use crate::error::Result;
use crate::merge::failure::Failure;
use crate::merge::task::{MergeResult, PullRequestMergeTask};
use crate::prompt::Prompt;
use tracing::debug;

/// Question asked before retrying with non-fatal failures ignored
pub const FORCE_PROMPT: &str = "Do you want to forcibly proceed with merging?";

/// Final outcome of a merge session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The pull request was merged
    Merged,
    /// The operator aborted
    Aborted,
    /// The pull request was not merged
    Failed,
}

impl SessionOutcome {
    /// Process exit code for this outcome
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Merged | Self::Aborted => 0,
            Self::Failed => 1,
        }
    }
}

/// What follows a merge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The session is over
    Finish(SessionOutcome),
    /// Offer a forced retry
    OfferForce,
}

/// Decide the next step after an attempt (PURE)
///
/// A forced retry is offered at most once: only for a non-fatal failure
/// of an attempt that was not already forced.
pub const fn transition(result: &MergeResult, forced: bool) -> Transition {
    match result {
        MergeResult::Success => Transition::Finish(SessionOutcome::Merged),
        MergeResult::UserAborted => Transition::Finish(SessionOutcome::Aborted),
        MergeResult::Failed(failure) if failure.non_fatal && !forced => Transition::OfferForce,
        MergeResult::Failed(_)
        | MergeResult::DirtyWorkingDir
        | MergeResult::UnknownGitError
        | MergeResult::GithubError { .. } => Transition::Finish(SessionOutcome::Failed),
    }
}

/// Receives the results of a merge session
pub trait MergeReporter {
    /// Called after every attempt
    fn attempt_finished(&self, pr_number: u64, result: &MergeResult);

    /// Called before the operator is asked whether to force the merge
    fn force_available(&self, failure: &Failure);
}

/// Merge `pr_number`, offering one forced retry on non-fatal failures
pub async fn run_merge_session(
    task: &PullRequestMergeTask<'_>,
    pr_number: u64,
    prompt: &dyn Prompt,
    reporter: &dyn MergeReporter,
) -> Result<SessionOutcome> {
    let mut forced = false;
    loop {
        let result = task.merge(pr_number, forced).await?;
        reporter.attempt_finished(pr_number, &result);

        match transition(&result, forced) {
            Transition::Finish(outcome) => return Ok(outcome),
            Transition::OfferForce => {
                if let Some(failure) = result.failure() {
                    reporter.force_available(failure);
                }
                if !prompt.confirm(FORCE_PROMPT)? {
                    return Ok(SessionOutcome::Failed);
                }
                debug!(pr_number, "retrying with non-fatal failures ignored");
                forced = true;
            }
        }
    }
}
