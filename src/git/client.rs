//! `git` command-line client

use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::types::RemoteDescriptor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

/// Environment variable that disables husky-managed commit hooks
///
/// `--no-verify` does not cover every hook (notably `prepare-commit-msg`), so
/// every spawned git process gets this instead.
pub const HOOKS_DISABLE_ENV: &str = "HUSKY";

const REDACTED: &str = "<TOKEN>";

/// Build the HTTPS remote URL carrying the token as basic-auth password
pub fn authenticated_remote_url(remote: &RemoteDescriptor, token: &str) -> Result<String> {
    let mut url = Url::parse(&format!(
        "https://{}/{}/{}.git",
        remote.web_host(),
        remote.owner,
        remote.name
    ))
    .map_err(|e| Error::Config(format!("invalid remote {remote}: {e}")))?;

    url.set_username("x-access-token")
        .map_err(|()| Error::Config(format!("cannot set credentials on {remote}")))?;
    url.set_password(Some(token))
        .map_err(|()| Error::Config(format!("cannot set credentials on {remote}")))?;

    Ok(url.to_string())
}

/// Replace every occurrence of `secret` in `text`
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

fn shell_single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Git client that shells out to the `git` binary
pub struct GitClient {
    root: PathBuf,
    remote_url: String,
    token: String,
}

impl GitClient {
    /// Create a client for the repository at `root`
    pub fn new(root: impl Into<PathBuf>, remote: &RemoteDescriptor, token: &str) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            remote_url: authenticated_remote_url(remote, token)?,
            token: token.to_string(),
        })
    }

    /// Resolve the top-level directory of the repository containing `path`
    pub async fn find_root(path: &Path) -> Result<PathBuf> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Config(format!(
                "Unable to find the path to the base directory of the repository. \
                 Was the command run from inside of the repo?\n{}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(PathBuf::from(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    /// Repository root this client operates on
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.root)
            .env(HOOKS_DISABLE_ENV, "0")
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        redact(&args.join(" "), &self.token)
    }

    /// Run git and return its raw output, whatever the exit status
    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(args = %self.describe(args), "running git");
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok(output)
    }

    /// Run git, failing on a non-zero exit status
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        self.check(args, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn check(&self, args: &[&str], output: &Output) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        let stderr = redact(
            String::from_utf8_lossy(&output.stderr).trim(),
            &self.token,
        );
        warn!(args = %self.describe(args), %stderr, "git command failed");
        Err(Error::Git {
            args: self.describe(args),
            stderr,
        })
    }
}

#[async_trait]
impl GitRepo for GitClient {
    async fn has_uncommitted_changes(&self) -> Result<bool> {
        let status = self.run(&["status", "--porcelain"]).await?;
        Ok(!status.is_empty())
    }

    async fn current_branch(&self) -> Result<Option<String>> {
        let output = self.output(&["symbolic-ref", "--short", "-q", "HEAD"]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!branch.is_empty()).then_some(branch))
    }

    async fn fetch(&self, refspecs: &[String]) -> Result<()> {
        let mut args = vec!["fetch", "-q", "-f", self.remote_url.as_str()];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn checkout(&self, rev: &str, force: bool) -> Result<()> {
        let mut args = vec!["checkout", "-q"];
        if force {
            args.push("-f");
        }
        args.push(rev);
        self.run(&args).await?;
        Ok(())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", rev]).await
    }

    async fn has_commit(&self, branch: &str, sha: &str) -> Result<bool> {
        let output = self.output(&["branch", branch, "--contains", sha]).await?;
        Ok(output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    async fn rebase_autosquash(&self, base: &str, branch: &str, edit_messages: bool) -> Result<()> {
        let args = ["rebase", "--interactive", "--autosquash", base, branch];
        let mut cmd = self.command(&args);
        if edit_messages {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            // Accept the generated todo list as-is.
            cmd.env("GIT_SEQUENCE_EDITOR", "true")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }

        debug!(args = %self.describe(&args), edit_messages, "running git");
        let output = cmd.output().await?;
        if let Err(e) = self.check(&args, &output) {
            let _ = self.output(&["rebase", "--abort"]).await;
            return Err(e);
        }
        Ok(())
    }

    async fn append_to_commit_messages(&self, range: &str, line: &str) -> Result<()> {
        let filter = format!("cat; echo; echo {}", shell_single_quote(line));
        let args = ["filter-branch", "-f", "--msg-filter", filter.as_str(), range];
        let output = self
            .command(&args)
            .env("FILTER_BRANCH_SQUELCH_WARNING", "1")
            .stdin(Stdio::null())
            .output()
            .await?;
        self.check(&args, &output)
    }

    async fn cherry_pick(&self, range: &str, dry_run: bool) -> Result<bool> {
        let mut args = vec!["cherry-pick"];
        if dry_run {
            args.push("--no-commit");
        }
        args.push(range);

        let output = self.output(&args).await?;
        if !output.status.success() {
            debug!(range, dry_run, "cherry-pick failed, aborting");
            let _ = self.output(&["cherry-pick", "--abort"]).await;
            if dry_run {
                let _ = self.output(&["reset", "--hard", "HEAD"]).await;
            }
            return Ok(false);
        }

        if dry_run {
            self.run(&["reset", "--hard", "HEAD"]).await?;
        }
        Ok(true)
    }

    async fn push(&self, refspecs: &[String]) -> Result<()> {
        let mut args = vec!["push", "--atomic", self.remote_url.as_str()];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn delete_branches(&self, branches: &[String]) -> Result<()> {
        if branches.is_empty() {
            return Ok(());
        }
        let mut args = vec!["branch", "-D"];
        args.extend(branches.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }
}
