//! Remote platform services
//!
//! Provides the narrow slice of the GitHub API the merge tooling needs.

mod github;

pub use github::{DEFAULT_TIMEOUT_SECS, GitHubService};

use crate::error::Result;
use crate::types::{MergeApiResult, MergeRequest, RemoteDescriptor, RemotePullRequest, RepositoryInfo};
use async_trait::async_trait;

/// Platform service trait for pull request operations
///
/// Implementations translate HTTP-level failures into typed errors. A 401
/// must surface as [`Error::Unauthorized`](crate::error::Error::Unauthorized)
/// so callers can tell an invalid token apart from a rejected request.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Fetch the current state of a pull request, including labels and CI status
    ///
    /// Returns `Ok(None)` when the pull request does not exist.
    async fn get_pull_request(&self, pr_number: u64) -> Result<Option<RemotePullRequest>>;

    /// Fetch repository metadata (default branch, allowed merge methods)
    async fn get_repository_info(&self) -> Result<RepositoryInfo>;

    /// Merge a pull request through the merge endpoint
    async fn merge_pull_request(&self, pr_number: u64, request: &MergeRequest)
    -> Result<MergeApiResult>;

    /// Create a comment on a pull request
    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Close a pull request without merging it
    async fn close_pull_request(&self, pr_number: u64) -> Result<()>;

    /// Get the remote this service talks to
    fn remote(&self) -> &RemoteDescriptor;
}
