//! Mock git repository for testing

#![allow(dead_code)]

use async_trait::async_trait;
use devinfra::error::{Error, Result};
use devinfra::git::GitRepo;
use std::collections::HashSet;
use std::sync::Mutex;

/// A recorded git operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    HasUncommittedChanges,
    CurrentBranch,
    Fetch(Vec<String>),
    Checkout { rev: String, force: bool },
    RevParse(String),
    HasCommit { branch: String, sha: String },
    Rebase { base: String, branch: String, edit_messages: bool },
    AppendMessage { range: String, line: String },
    CherryPick { onto: String, range: String, dry_run: bool },
    Push(Vec<String>),
    DeleteBranches(Vec<String>),
}

/// In-memory stand-in for a working copy
///
/// Tracks the checked out branch so cherry-pick conflicts can be injected
/// per target branch.
pub struct MockGitRepo {
    dirty: Mutex<bool>,
    head: Mutex<String>,
    contains_base_commit: Mutex<bool>,
    conflicting: Mutex<HashSet<String>>,
    calls: Mutex<Vec<GitCall>>,
    fail_push: Mutex<Option<String>>,
    fail_fetch: Mutex<Option<String>>,
    git_missing: Mutex<bool>,
}

impl MockGitRepo {
    /// A clean working copy on `main`
    pub fn new() -> Self {
        Self {
            dirty: Mutex::new(false),
            head: Mutex::new("main".to_string()),
            contains_base_commit: Mutex::new(true),
            conflicting: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            fail_push: Mutex::new(None),
            fail_fetch: Mutex::new(None),
            git_missing: Mutex::new(false),
        }
    }

    // === Setup ===

    pub fn set_dirty(&self, dirty: bool) {
        *self.dirty.lock().unwrap() = dirty;
    }

    pub fn set_head(&self, branch: &str) {
        *self.head.lock().unwrap() = branch.to_string();
    }

    pub fn set_contains_base_commit(&self, contains: bool) {
        *self.contains_base_commit.lock().unwrap() = contains;
    }

    /// Make cherry-picks onto the temporary branch of `branch` conflict
    pub fn conflict_on(&self, branch: &str) {
        self.conflicting
            .lock()
            .unwrap()
            .insert(format!("merge_pr_target_{branch}"));
    }

    // === Error injection methods ===

    pub fn fail_push(&self, stderr: &str) {
        *self.fail_push.lock().unwrap() = Some(stderr.to_string());
    }

    pub fn fail_fetch(&self, stderr: &str) {
        *self.fail_fetch.lock().unwrap() = Some(stderr.to_string());
    }

    /// Behave as if the `git` executable could not be spawned
    pub fn remove_git_binary(&self) {
        *self.git_missing.lock().unwrap() = true;
    }

    // === Call inspection ===

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn head(&self) -> String {
        self.head.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::Push(refspecs) => Some(refspecs),
                _ => None,
            })
            .collect()
    }

    pub fn cherry_picks(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GitCall::CherryPick { onto, dry_run, .. } => Some((onto, dry_run)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GitCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn injected(slot: &Mutex<Option<String>>, args: &str) -> Result<()> {
        match slot.lock().unwrap().clone() {
            Some(stderr) => Err(Error::Git {
                args: args.to_string(),
                stderr,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GitRepo for MockGitRepo {
    async fn has_uncommitted_changes(&self) -> Result<bool> {
        self.record(GitCall::HasUncommittedChanges);
        if *self.git_missing.lock().unwrap() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "git: command not found",
            )));
        }
        Ok(*self.dirty.lock().unwrap())
    }

    async fn current_branch(&self) -> Result<Option<String>> {
        self.record(GitCall::CurrentBranch);
        Ok(Some(self.head()))
    }

    async fn fetch(&self, refspecs: &[String]) -> Result<()> {
        self.record(GitCall::Fetch(refspecs.to_vec()));
        Self::injected(&self.fail_fetch, "fetch")
    }

    async fn checkout(&self, rev: &str, force: bool) -> Result<()> {
        self.record(GitCall::Checkout {
            rev: rev.to_string(),
            force,
        });
        self.set_head(rev);
        Ok(())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String> {
        self.record(GitCall::RevParse(rev.to_string()));
        Ok(format!("sha({rev})"))
    }

    async fn has_commit(&self, branch: &str, sha: &str) -> Result<bool> {
        self.record(GitCall::HasCommit {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        Ok(*self.contains_base_commit.lock().unwrap())
    }

    async fn rebase_autosquash(&self, base: &str, branch: &str, edit_messages: bool) -> Result<()> {
        self.record(GitCall::Rebase {
            base: base.to_string(),
            branch: branch.to_string(),
            edit_messages,
        });
        self.set_head(branch);
        Ok(())
    }

    async fn append_to_commit_messages(&self, range: &str, line: &str) -> Result<()> {
        self.record(GitCall::AppendMessage {
            range: range.to_string(),
            line: line.to_string(),
        });
        Ok(())
    }

    async fn cherry_pick(&self, range: &str, dry_run: bool) -> Result<bool> {
        let onto = self.head();
        let ok = !self.conflicting.lock().unwrap().contains(&onto);
        self.record(GitCall::CherryPick {
            onto,
            range: range.to_string(),
            dry_run,
        });
        Ok(ok)
    }

    async fn push(&self, refspecs: &[String]) -> Result<()> {
        self.record(GitCall::Push(refspecs.to_vec()));
        Self::injected(&self.fail_push, "push --atomic")
    }

    async fn delete_branches(&self, branches: &[String]) -> Result<()> {
        self.record(GitCall::DeleteBranches(branches.to_vec()));
        Ok(())
    }
}
