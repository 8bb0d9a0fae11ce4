//! Authentication for GitHub
//!
//! Supports an explicit token, environment variables and the gh CLI.

mod github;

pub use github::{
    GITHUB_TOKEN_GENERATE_URL, GitHubAuthConfig, TOKEN_ENV_VARS, UnauthorizedReport,
    get_github_auth, token_from_sources,
};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token passed on the command line
    Flag,
    /// Token from CLI tool (gh)
    Cli,
    /// Token from environment variable
    EnvVar,
}
