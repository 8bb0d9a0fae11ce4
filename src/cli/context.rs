//! Shared command context for CLI commands
//!
//! Extracts the setup shared by commands that talk to GitHub.

use devinfra::auth::get_github_auth;
use devinfra::config::{CommonConfig, load_config};
use devinfra::error::Result;
use devinfra::git::GitClient;
use devinfra::platform::GitHubService;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Repository root and its validated common configuration
pub struct RepoContext {
    /// Top-level directory of the repository
    pub repo_root: PathBuf,
    /// Validated common configuration
    pub config: CommonConfig,
}

impl RepoContext {
    /// Locate the repository containing `path` and load its configuration
    pub async fn new(path: &Path) -> Result<Self> {
        let repo_root = GitClient::find_root(path).await?;
        let config = load_config(&repo_root)?;
        debug!(root = %repo_root.display(), remote = %config.github, "loaded configuration");
        Ok(Self { repo_root, config })
    }
}

/// Shared context for CLI commands that interact with GitHub
///
/// Bundles the repository, its configuration, an authenticated GitHub
/// client and a git client pushing with the same token.
pub struct CommandContext {
    /// Repository and configuration
    pub repo: RepoContext,
    /// GitHub client
    pub platform: GitHubService,
    /// Local git client
    pub git: GitClient,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// The token comes from `token_flag`, the environment or the gh CLI.
    pub async fn new(path: &Path, token_flag: Option<&str>) -> Result<Self> {
        let repo = RepoContext::new(path).await?;
        let auth = get_github_auth(token_flag).await?;
        debug!(source = ?auth.source, "resolved GitHub token");

        let remote = repo.config.github.clone();
        let platform = GitHubService::new(&auth.token, remote.clone(), repo.config.timeout)?;
        let git = GitClient::new(&repo.repo_root, &remote, &auth.token)?;

        Ok(Self {
            repo,
            platform,
            git,
        })
    }
}
