//! Loading a pull request and checking it against the merge policy

use crate::config::MergeConfig;
use crate::error::Result;
use crate::merge::failure::{Failure, FailureCause};
use crate::merge::strategy::StrategyKind;
use crate::platform::PlatformService;
use crate::types::{CiStatus, PrState, RemotePullRequest};
use tracing::{debug, warn};

/// A pull request that passed eligibility validation
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub url: String,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
    /// Login of the PR author
    pub author: String,
    /// Label names attached to the PR
    pub labels: Vec<String>,
    /// Branch the PR targets on GitHub
    pub github_target_branch: String,
    /// Head commit SHA at validation time
    pub head_sha: String,
    /// Number of commits in the PR
    pub commit_count: u64,
    /// Branches the PR merges into
    pub target_branches: Vec<String>,
    /// Strategy selected by the target label
    pub strategy: StrategyKind,
    /// Commit the PR must contain, if the target branch requires one
    pub required_base_sha: Option<String>,
    /// Whether the operator asked for a commit message fixup
    pub needs_commit_message_fixup: bool,
}

/// Fail with `cause` unless it is non-fatal and non-fatal failures are ignored
fn gate(cause: FailureCause, ignore_non_fatal: bool) -> std::result::Result<(), Failure> {
    let failure = Failure::new(cause);
    if failure.non_fatal && ignore_non_fatal {
        warn!(reason = %failure.message, "ignoring non-fatal failure");
        return Ok(());
    }
    Err(failure)
}

/// Validate a fetched pull request against the merge policy (PURE)
///
/// Checks run in a fixed order so the first reported failure is stable
/// between attempts. Non-fatal failures are skipped when
/// `ignore_non_fatal` is set; fatal ones always stop validation.
pub fn validate_pull_request(
    remote: Option<RemotePullRequest>,
    config: &MergeConfig,
    ignore_non_fatal: bool,
) -> std::result::Result<PullRequest, Failure> {
    let Some(pr) = remote else {
        return Err(FailureCause::NotFound.into());
    };

    match pr.state {
        PrState::Merged => return Err(FailureCause::AlreadyMerged.into()),
        PrState::Closed => return Err(FailureCause::Closed.into()),
        PrState::Open => {}
    }
    if pr.is_draft {
        return Err(FailureCause::Draft.into());
    }

    if config.merge_ready_label.find(&pr.labels).is_none() {
        gate(
            FailureCause::NotMergeReady(config.merge_ready_label.to_string()),
            ignore_non_fatal,
        )?;
    }

    if let Some(ref cla) = config.cla_signed_label
        && cla.find(&pr.labels).is_none()
    {
        gate(FailureCause::ClaUnsigned, ignore_non_fatal)?;
    }

    for blocking in &config.blocking_labels {
        if let Some(label) = blocking.find(&pr.labels) {
            gate(FailureCause::BlockingLabel(label.to_string()), ignore_non_fatal)?;
        }
    }

    let matching: Vec<_> = config
        .labels
        .iter()
        .filter(|t| t.pattern.find(&pr.labels).is_some())
        .collect();
    let target = match matching.as_slice() {
        [] => return Err(FailureCause::NoTargetLabel.into()),
        [target] => *target,
        several => {
            let names: Vec<_> = several
                .iter()
                .filter_map(|t| t.pattern.find(&pr.labels))
                .collect();
            return Err(FailureCause::InvalidTargetBranch(format!(
                "pull request has multiple target labels ({})",
                names.join(", ")
            ))
            .into());
        }
    };
    let target_branches = target.resolve_branches(&pr.base_ref);

    if config.require_passing_checks {
        match pr.ci_status {
            CiStatus::Failure => gate(FailureCause::FailingCiJobs, ignore_non_fatal)?,
            CiStatus::Pending => gate(FailureCause::PendingCiJobs, ignore_non_fatal)?,
            CiStatus::Success | CiStatus::None => {}
        }
    }

    let needs_commit_message_fixup = config
        .commit_message_fixup_label
        .as_ref()
        .is_some_and(|p| p.find(&pr.labels).is_some());

    Ok(PullRequest {
        number: pr.number,
        url: pr.html_url,
        title: pr.title,
        body: pr.body,
        author: pr.author,
        labels: pr.labels,
        required_base_sha: config.required_base_commits.get(&pr.base_ref).cloned(),
        github_target_branch: pr.base_ref,
        head_sha: pr.head_sha,
        commit_count: pr.commit_count,
        target_branches,
        strategy: target.strategy,
        needs_commit_message_fixup,
    })
}

/// Fetch a pull request and validate it against the merge policy
///
/// The remote state is fetched on every call. The outer `Result` carries
/// transport errors; the inner one carries policy failures.
pub async fn load_and_validate_pull_request(
    platform: &dyn PlatformService,
    config: &MergeConfig,
    pr_number: u64,
    ignore_non_fatal: bool,
) -> Result<std::result::Result<PullRequest, Failure>> {
    let remote = platform.get_pull_request(pr_number).await?;
    let validated = validate_pull_request(remote, config, ignore_non_fatal);
    match &validated {
        Ok(pr) => debug!(
            pr_number,
            targets = ?pr.target_branches,
            strategy = %pr.strategy,
            "pull request is eligible for merging"
        ),
        Err(failure) => debug!(
            pr_number,
            non_fatal = failure.non_fatal,
            reason = %failure.message,
            "pull request failed validation"
        ),
    }
    Ok(validated)
}
