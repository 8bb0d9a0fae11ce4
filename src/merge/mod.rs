//! Pull request merge engine
//!
//! Layered bottom-up:
//! 1. Validate - fetch the PR and check it against the policy (`pull_request`)
//! 2. Merge - land it with the strategy its target label selects (`strategy`)
//! 3. Task - one attempt with rollback, classified into a [`MergeResult`]
//! 4. Driver - reporting and the one-shot forced retry

mod driver;
mod failure;
mod pull_request;
mod strategy;
mod task;

pub use driver::{
    FORCE_PROMPT, MergeReporter, SessionOutcome, Transition, run_merge_session, transition,
};
pub use failure::{Failure, FailureCause};
pub use pull_request::{PullRequest, load_and_validate_pull_request, validate_pull_request};
pub use strategy::{
    AutosquashMergeStrategy, GithubApiMergeStrategy, MergeStrategy, StrategyContext,
    StrategyKind, TEMP_PR_HEAD_BRANCH, temp_target_branch,
};
pub use task::{MergeResult, PullRequestMergeTask, TaskFlags, branch_prompt_message};
