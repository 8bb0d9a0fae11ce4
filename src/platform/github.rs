//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CiStatus, MergeApiResult, MergeMethod, MergeRequest, PrState, RemoteDescriptor,
    RemotePullRequest, RepositoryInfo,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default time budget for a single GitHub request
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Largest page size the check runs endpoint accepts
const CHECK_RUNS_PER_PAGE: usize = 100;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    remote: RemoteDescriptor,
    /// Token for raw HTTP requests (CI status checking)
    token: String,
    /// HTTP client for raw requests (CI status checking)
    http_client: Client,
    /// API base URL for raw requests
    api_base: String,
    timeout: Duration,
}

impl GitHubService {
    /// Create a new GitHub service for the given remote
    ///
    /// Talks to `api.github.com`, or to `https://{host}/api/v3` when the
    /// remote names a GitHub Enterprise host.
    pub fn new(token: &str, remote: RemoteDescriptor, timeout: Duration) -> Result<Self> {
        let api_base = remote.host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_base(token, remote, &api_base, timeout)
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(
        token: &str,
        remote: RemoteDescriptor,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("devinfra")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            remote,
            token: token.to_string(),
            http_client,
            api_base,
            timeout,
        })
    }

    /// Run a GitHub request under the configured time budget
    async fn timed<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(self.timeout.as_secs(), what.to_string())))
    }

    /// Check CI status by querying both commit statuses and check runs
    ///
    /// GitHub has two CI systems:
    /// 1. Commit Status API (legacy) - used by external CI services
    /// 2. Check Runs API (modern) - used by GitHub Actions
    ///
    /// A commit GitHub does not know reports `CiStatus::None`; any other
    /// non-success response is an error.
    pub async fn ci_status(&self, sha: &str) -> Result<CiStatus> {
        let statuses = self.check_commit_statuses(sha).await?;
        let check_runs = self.check_check_runs(sha).await?;
        Ok(statuses.combine(check_runs))
    }

    async fn get_json(&self, url: &str) -> Result<Option<reqwest::Response>> {
        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout.as_secs(), url.to_string())
                } else {
                    Error::GitHubApi(format!("Failed to fetch {url}: {e}"))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(url, "status endpoint returned 404, assuming nothing configured");
            return Ok(None);
        }
        if !status.is_success() {
            #[derive(Deserialize)]
            struct ErrorBody {
                message: String,
            }

            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(Error::from_status(status.as_u16(), message));
        }
        Ok(Some(response))
    }

    /// Check legacy commit statuses via combined status API
    async fn check_commit_statuses(&self, sha: &str) -> Result<CiStatus> {
        #[derive(Deserialize)]
        struct CombinedStatus {
            state: String,
            total_count: u32,
        }

        let url = format!(
            "{}/repos/{}/{}/commits/{}/status",
            self.api_base, self.remote.owner, self.remote.name, sha
        );

        let Some(response) = self.get_json(&url).await? else {
            return Ok(CiStatus::None);
        };

        let status: CombinedStatus = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse commit status: {e}")))?;

        if status.total_count == 0 {
            debug!("No commit statuses configured");
            return Ok(CiStatus::None);
        }

        debug!(state = %status.state, count = status.total_count, "Commit status result");
        Ok(match status.state.as_str() {
            "success" => CiStatus::Success,
            "pending" => CiStatus::Pending,
            _ => CiStatus::Failure,
        })
    }

    /// Check GitHub Actions check runs
    async fn check_check_runs(&self, sha: &str) -> Result<CiStatus> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: u32,
            check_runs: Vec<CheckRun>,
        }

        #[derive(Deserialize)]
        struct CheckRun {
            status: String,
            conclusion: Option<String>,
        }

        let mut runs = Vec::new();
        let mut total_count = 0;
        for page in 1.. {
            let url = format!(
                "{}/repos/{}/{}/commits/{}/check-runs?per_page={CHECK_RUNS_PER_PAGE}&page={page}",
                self.api_base, self.remote.owner, self.remote.name, sha
            );

            let Some(response) = self.get_json(&url).await? else {
                return Ok(CiStatus::None);
            };

            let batch: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            total_count = batch.total_count;
            let fetched = batch.check_runs.len();
            runs.extend(batch.check_runs);
            if fetched == 0 || runs.len() >= total_count as usize {
                break;
            }
        }

        if total_count == 0 {
            debug!("No check runs configured");
            return Ok(CiStatus::None);
        }

        let mut result = CiStatus::Success;
        for run in &runs {
            if run.status != "completed" {
                debug!(status = %run.status, "Check run still in progress");
                result = result.combine(CiStatus::Pending);
                continue;
            }

            match run.conclusion.as_deref() {
                Some("success" | "neutral" | "skipped") => {}
                Some(conclusion) => {
                    debug!(conclusion = %conclusion, "Check run failed");
                    return Ok(CiStatus::Failure);
                }
                None => {
                    // Completed but no conclusion? Treat as failure
                    debug!("Check run completed but no conclusion");
                    return Ok(CiStatus::Failure);
                }
            }
        }

        debug!(count = total_count, ?result, "Check runs evaluated");
        Ok(result)
    }
}

const fn octocrab_method(method: MergeMethod) -> octocrab::params::pulls::MergeMethod {
    match method {
        MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
        MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
        MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<Option<RemotePullRequest>> {
        debug!(pr_number, remote = %self.remote, "fetching pull request");

        let fetched = self
            .timed("fetch pull request", async {
                self.client
                    .pulls(&self.remote.owner, &self.remote.name)
                    .get(pr_number)
                    .await
                    .map_err(Error::from)
            })
            .await;

        let pr = match fetched {
            Ok(pr) => pr,
            Err(e) if e.status() == Some(404) => {
                debug!(pr_number, "pull request not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        // Determine PR state from GitHub's state field and merged_at
        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
            // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
            Some(_) | None => PrState::Closed,
        };

        let head_sha = pr.head.sha.clone();
        let ci_status = self
            .timed("fetch CI status", self.ci_status(&head_sha))
            .await?;

        let details = RemotePullRequest {
            number: pr.number,
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            title: pr.title.clone().unwrap_or_default(),
            body: pr.body.clone(),
            author: pr.user.as_ref().map(|u| u.login.clone()).unwrap_or_default(),
            labels: pr
                .labels
                .as_ref()
                .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
                .unwrap_or_default(),
            state,
            is_draft: pr.draft.unwrap_or(false),
            base_ref: pr.base.ref_field.clone(),
            head_sha,
            commit_count: pr.commits.unwrap_or(0),
            ci_status,
        };

        debug!(
            pr_number,
            state = %details.state,
            ci = ?details.ci_status,
            labels = ?details.labels,
            "fetched pull request"
        );
        Ok(Some(details))
    }

    async fn get_repository_info(&self) -> Result<RepositoryInfo> {
        debug!(remote = %self.remote, "fetching repository info");
        let repo = self
            .timed("fetch repository", async {
                self.client
                    .repos(&self.remote.owner, &self.remote.name)
                    .get()
                    .await
                    .map_err(Error::from)
            })
            .await?;

        // Merge settings are only returned to users with push access; treat
        // missing values as allowed and let the merge call decide.
        Ok(RepositoryInfo {
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            allow_merge_commit: repo.allow_merge_commit.unwrap_or(true),
            allow_squash_merge: repo.allow_squash_merge.unwrap_or(true),
            allow_rebase_merge: repo.allow_rebase_merge.unwrap_or(true),
        })
    }

    async fn merge_pull_request(
        &self,
        pr_number: u64,
        request: &MergeRequest,
    ) -> Result<MergeApiResult> {
        debug!(pr_number, method = %request.method, "merging PR");

        let result = self
            .timed("merge pull request", async {
                let pulls = self.client.pulls(&self.remote.owner, &self.remote.name);
                let mut builder = pulls
                    .merge(pr_number)
                    .method(octocrab_method(request.method));
                if let Some(ref title) = request.commit_title {
                    builder = builder.title(title);
                }
                if let Some(ref message) = request.commit_message {
                    builder = builder.message(message);
                }
                if let Some(ref sha) = request.sha {
                    builder = builder.sha(sha);
                }
                builder.send().await.map_err(Error::from)
            })
            .await?;

        let merge_result = MergeApiResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.timed("create comment", async {
            self.client
                .issues(&self.remote.owner, &self.remote.name)
                .create_comment(pr_number, body)
                .await
                .map_err(Error::from)
        })
        .await?;
        Ok(())
    }

    async fn close_pull_request(&self, pr_number: u64) -> Result<()> {
        debug!(pr_number, "closing PR");
        self.timed("close pull request", async {
            self.client
                .issues(&self.remote.owner, &self.remote.name)
                .update(pr_number)
                .state(octocrab::models::IssueState::Closed)
                .send()
                .await
                .map_err(Error::from)
        })
        .await?;
        Ok(())
    }

    fn remote(&self) -> &RemoteDescriptor {
        &self.remote
    }
}
