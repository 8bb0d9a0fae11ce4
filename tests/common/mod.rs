//! Shared test utilities

#![allow(dead_code)]

mod mock_git;
mod mock_platform;

pub use mock_git::{GitCall, MockGitRepo};
pub use mock_platform::{CommentCall, MergeCall, MockPlatformService};

use devinfra::config::{MergeConfig, parse_config, validate_common_config, validate_merge_config};
use devinfra::error::{Error, Result};
use devinfra::merge::{Failure, MergeReporter, MergeResult};
use devinfra::prompt::Prompt;
use devinfra::types::{CiStatus, PrState, RemotePullRequest, RepositoryInfo};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Merge policy used by most tests
///
/// - `target: major` merges into `main` with autosquash
/// - `target: patch` merges into `main` and `11.0.x` with autosquash
/// - `target: api` merges into the PR's base through the GitHub API
/// - `target: api-patch` merges into `main` and `11.0.x` through the API
pub const TEST_CONFIG: &str = r#"
[github]
owner = "angular"
name = "angular"

[merge]
merge_ready_label = "action: merge"
cla_signed_label = "cla: yes"
commit_message_fixup_label = "commit message fixup"
blocking_labels = ["blocked"]
strategy = "autosquash"

[merge.github_api_merge]
default = "squash"
labels = [{ pattern = "merge: preserve commits", method = "rebase" }]

[[merge.labels]]
pattern = "target: major"
branches = ["main"]

[[merge.labels]]
pattern = "target: patch"
branches = ["main", "11.0.x"]

[[merge.labels]]
pattern = "target: api"
branches = ["{base}"]
strategy = "github-api"

[[merge.labels]]
pattern = "target: api-patch"
branches = ["main", "11.0.x"]
strategy = "github-api"
"#;

/// Repository settings allowing every merge method
pub fn repo_info() -> RepositoryInfo {
    RepositoryInfo {
        default_branch: "main".to_string(),
        allow_merge_commit: true,
        allow_squash_merge: true,
        allow_rebase_merge: true,
    }
}

/// Validated merge policy from TOML text
pub fn merge_config_from(toml: &str) -> MergeConfig {
    let common = validate_common_config(parse_config(toml).unwrap()).unwrap();
    validate_merge_config(common.merge.as_ref(), &common.github, &repo_info()).unwrap()
}

/// Validated [`TEST_CONFIG`]
pub fn test_merge_config() -> MergeConfig {
    merge_config_from(TEST_CONFIG)
}

/// An open, green, merge-ready PR targeting `main`
pub fn make_pr(number: u64, labels: &[&str]) -> RemotePullRequest {
    RemotePullRequest {
        number,
        html_url: format!("https://github.com/angular/angular/pull/{number}"),
        title: format!("fix: change number {number}"),
        body: Some("PR body".to_string()),
        author: "contributor".to_string(),
        labels: labels.iter().map(ToString::to_string).collect(),
        state: PrState::Open,
        is_draft: false,
        base_ref: "main".to_string(),
        head_sha: format!("head_sha_{number}"),
        commit_count: 2,
        ci_status: CiStatus::Success,
    }
}

/// Labels of a PR that passes every policy gate, plus `extra`
pub fn ready_labels<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut labels = vec!["action: merge", "cla: yes"];
    labels.extend_from_slice(extra);
    labels
}

/// Prompt answering from a script
///
/// Confirmations not covered by the script are answered with "no".
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    edited: Option<String>,
    asked: Mutex<Vec<String>>,
    edits: Mutex<Vec<String>>,
    terminal_closed: bool,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            edited: None,
            asked: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            terminal_closed: false,
        }
    }

    /// Fail every confirmation, as a closed terminal would
    pub fn closed_terminal() -> Self {
        Self {
            terminal_closed: true,
            ..Self::new(&[])
        }
    }

    /// Always answer "yes"
    pub fn yes() -> Self {
        Self::new(&[true; 8])
    }

    /// Return `text` from every edit
    pub fn with_edit(mut self, text: &str) -> Self {
        self.edited = Some(text.to_string());
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<String> {
        self.edits.lock().unwrap().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(message.to_string());
        if self.terminal_closed {
            return Err(Error::Internal("failed to read confirmation: EOF".to_string()));
        }
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }

    fn edit(&self, text: &str) -> Result<Option<String>> {
        self.edits.lock().unwrap().push(text.to_string());
        Ok(self.edited.clone())
    }
}

/// Reporter recording everything it is told
#[derive(Default)]
pub struct RecordingReporter {
    results: Mutex<Vec<MergeResult>>,
    force_offers: Mutex<Vec<Failure>>,
}

impl RecordingReporter {
    pub fn results(&self) -> Vec<MergeResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn force_offers(&self) -> Vec<Failure> {
        self.force_offers.lock().unwrap().clone()
    }
}

impl MergeReporter for RecordingReporter {
    fn attempt_finished(&self, _pr_number: u64, result: &MergeResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    fn force_available(&self, failure: &Failure) {
        self.force_offers.lock().unwrap().push(failure.clone());
    }
}
