//! Mock platform service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use devinfra::error::{Error, Result};
use devinfra::platform::PlatformService;
use devinfra::types::{
    MergeApiResult, MergeRequest, RemoteDescriptor, RemotePullRequest, RepositoryInfo,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub pr_number: u64,
    pub request: MergeRequest,
}

/// Call record for `create_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Simple mock platform service for testing
///
/// Hand-written rather than generated so call tracking and error injection
/// stay easy to read in assertions.
///
/// Features:
/// - Configurable pull requests and repository settings
/// - Call tracking for verification
/// - Error injection by HTTP status
pub struct MockPlatformService {
    remote: RemoteDescriptor,
    pull_requests: Mutex<HashMap<u64, RemotePullRequest>>,
    repo_info: Mutex<RepositoryInfo>,
    merge_response: Mutex<MergeApiResult>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    repo_info_calls: Mutex<u32>,
    merge_calls: Mutex<Vec<MergeCall>>,
    comment_calls: Mutex<Vec<CommentCall>>,
    close_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_get_pr: Mutex<Option<(u16, String)>>,
    error_on_merge: Mutex<Option<(u16, String)>>,
    error_on_repo_info: Mutex<Option<(u16, String)>>,
    get_pr_times_out: Mutex<bool>,
}

impl MockPlatformService {
    /// Create a mock for `angular/angular` with permissive repository settings
    pub fn new() -> Self {
        Self {
            remote: RemoteDescriptor::new("angular", "angular"),
            pull_requests: Mutex::new(HashMap::new()),
            repo_info: Mutex::new(RepositoryInfo {
                default_branch: "main".to_string(),
                allow_merge_commit: true,
                allow_squash_merge: true,
                allow_rebase_merge: true,
            }),
            merge_response: Mutex::new(MergeApiResult {
                merged: true,
                sha: Some("merged_sha".to_string()),
                message: None,
            }),
            get_pr_calls: Mutex::new(Vec::new()),
            repo_info_calls: Mutex::new(0),
            merge_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            error_on_get_pr: Mutex::new(None),
            error_on_merge: Mutex::new(None),
            error_on_repo_info: Mutex::new(None),
            get_pr_times_out: Mutex::new(false),
        }
    }

    // === Setup ===

    /// Register a pull request
    pub fn add_pr(&self, pr: RemotePullRequest) {
        self.pull_requests.lock().unwrap().insert(pr.number, pr);
    }

    /// Replace the repository settings
    pub fn set_repo_info(&self, info: RepositoryInfo) {
        *self.repo_info.lock().unwrap() = info;
    }

    /// Replace the response of the merge endpoint
    pub fn set_merge_response(&self, result: MergeApiResult) {
        *self.merge_response.lock().unwrap() = result;
    }

    // === Error injection methods ===

    /// Make `get_pull_request` fail with an HTTP status
    pub fn fail_get_pr(&self, status: u16, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some((status, msg.to_string()));
    }

    /// Make `get_pull_request` exceed its time budget
    pub fn time_out_get_pr(&self) {
        *self.get_pr_times_out.lock().unwrap() = true;
    }

    /// Make `merge_pull_request` fail with an HTTP status
    pub fn fail_merge(&self, status: u16, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some((status, msg.to_string()));
    }

    /// Make `get_repository_info` fail with an HTTP status
    pub fn fail_repo_info(&self, status: u16, msg: &str) {
        *self.error_on_repo_info.lock().unwrap() = Some((status, msg.to_string()));
    }

    // === Call inspection ===

    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn comment_calls(&self) -> Vec<CommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> Vec<u64> {
        self.close_calls.lock().unwrap().clone()
    }

    /// Number of calls of any kind
    pub fn total_calls(&self) -> usize {
        self.get_pr_calls.lock().unwrap().len()
            + *self.repo_info_calls.lock().unwrap() as usize
            + self.merge_calls.lock().unwrap().len()
            + self.comment_calls.lock().unwrap().len()
            + self.close_calls.lock().unwrap().len()
    }

    fn injected(slot: &Mutex<Option<(u16, String)>>) -> Result<()> {
        match slot.lock().unwrap().clone() {
            Some((status, msg)) => Err(Error::from_status(status, msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<Option<RemotePullRequest>> {
        self.get_pr_calls.lock().unwrap().push(pr_number);
        Self::injected(&self.error_on_get_pr)?;
        if *self.get_pr_times_out.lock().unwrap() {
            return Err(Error::Timeout(60, "fetch pull request".to_string()));
        }
        Ok(self.pull_requests.lock().unwrap().get(&pr_number).cloned())
    }

    async fn get_repository_info(&self) -> Result<RepositoryInfo> {
        *self.repo_info_calls.lock().unwrap() += 1;
        Self::injected(&self.error_on_repo_info)?;
        Ok(self.repo_info.lock().unwrap().clone())
    }

    async fn merge_pull_request(
        &self,
        pr_number: u64,
        request: &MergeRequest,
    ) -> Result<MergeApiResult> {
        self.merge_calls.lock().unwrap().push(MergeCall {
            pr_number,
            request: request.clone(),
        });
        Self::injected(&self.error_on_merge)?;
        Ok(self.merge_response.lock().unwrap().clone())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.comment_calls.lock().unwrap().push(CommentCall {
            pr_number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn close_pull_request(&self, pr_number: u64) -> Result<()> {
        self.close_calls.lock().unwrap().push(pr_number);
        Ok(())
    }

    fn remote(&self) -> &RemoteDescriptor {
        &self.remote
    }
}
