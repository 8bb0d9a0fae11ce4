//! Core types for devinfra

/// Owner/name pair identifying the hosted repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescriptor {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Custom GitHub Enterprise host (None for github.com)
    pub host: Option<String>,
}

impl RemoteDescriptor {
    /// Create a descriptor for a github.com repository
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            host: None,
        }
    }

    /// Host serving the repository web UI and git endpoint
    pub fn web_host(&self) -> &str {
        self.host.as_deref().unwrap_or("github.com")
    }
}

impl std::fmt::Display for RemoteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    /// PR is open and can be merged
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Combined CI status of a PR head commit
///
/// Combines legacy commit statuses and check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiStatus {
    /// All statuses and checks passed
    Success,
    /// At least one status or check is still running
    Pending,
    /// At least one status or check failed
    Failure,
    /// No statuses or checks configured
    None,
}

impl CiStatus {
    /// Combine the outcome of two CI systems
    ///
    /// A failure anywhere wins, then anything still pending. Unconfigured
    /// systems do not affect the other side.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failure, _) | (_, Self::Failure) => Self::Failure,
            (Self::Pending, _) | (_, Self::Pending) => Self::Pending,
            (Self::Success, _) | (_, Self::Success) => Self::Success,
            (Self::None, Self::None) => Self::None,
        }
    }
}

/// Pull request as fetched from the remote, before any policy is applied
#[derive(Debug, Clone)]
pub struct RemotePullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
    /// Login of the PR author
    pub author: String,
    /// Label names attached to the PR
    pub labels: Vec<String>,
    /// Current state of the PR
    pub state: PrState,
    /// Whether PR is a draft
    pub is_draft: bool,
    /// Branch the PR targets on GitHub
    pub base_ref: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Number of commits in the PR
    pub commit_count: u64,
    /// CI status of the head commit
    pub ci_status: CiStatus,
}

/// Repository metadata used to validate the merge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RepositoryInfo {
    /// Default branch (e.g. "main")
    pub default_branch: String,
    /// Whether merge commits are allowed
    pub allow_merge_commit: bool,
    /// Whether squash merging is allowed
    pub allow_squash_merge: bool,
    /// Whether rebase merging is allowed
    pub allow_rebase_merge: bool,
}

impl RepositoryInfo {
    /// Check if the repository settings allow a merge method
    pub const fn allows(&self, method: MergeMethod) -> bool {
        match method {
            MergeMethod::Merge => self.allow_merge_commit,
            MergeMethod::Squash => self.allow_squash_merge,
            MergeMethod::Rebase => self.allow_rebase_merge,
        }
    }
}

/// Merge method used by the GitHub merge endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// Options passed to the GitHub merge endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// Merge method
    pub method: MergeMethod,
    /// Commit title (squash only)
    pub commit_title: Option<String>,
    /// Commit message (squash only)
    pub commit_message: Option<String>,
    /// Head SHA the merge must match
    pub sha: Option<String>,
}

/// Result of a merge call accepted by GitHub
#[derive(Debug, Clone)]
pub struct MergeApiResult {
    /// Whether the merge was performed
    pub merged: bool,
    /// The SHA of the merge commit
    pub sha: Option<String>,
    /// Message from GitHub
    pub message: Option<String>,
}
