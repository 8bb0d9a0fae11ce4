//! GitHub token resolution

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Where operators can create a new token
pub const GITHUB_TOKEN_GENERATE_URL: &str = "https://github.com/settings/tokens";

/// Environment variables checked for a token, in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "TOKEN"];

/// Resolved GitHub credentials
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a token from an explicit flag or the environment
///
/// `lookup` reads an environment variable; callers pass `std::env::var`
/// wrapped in `.ok()`, tests pass a map.
pub fn token_from_sources(
    flag: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<GitHubAuthConfig> {
    if let Some(token) = non_empty(flag.map(str::to_string)) {
        return Some(GitHubAuthConfig {
            token,
            source: AuthSource::Flag,
        });
    }
    TOKEN_ENV_VARS.iter().find_map(|name| {
        non_empty(lookup(name)).map(|token| {
            debug!(var = name, "using GitHub token from environment");
            GitHubAuthConfig {
                token,
                source: AuthSource::EnvVar,
            }
        })
    })
}

async fn token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    non_empty(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// Resolve GitHub credentials: flag, then environment, then `gh auth token`
pub async fn get_github_auth(flag: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(auth) = token_from_sources(flag, |name| std::env::var(name).ok()) {
        return Ok(auth);
    }

    if let Some(token) = token_from_gh_cli().await {
        debug!("using GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    Err(Error::Auth(format!(
        "No GitHub token found. Pass --github-token, set {} or run `gh auth login`. \
         You can generate a token here: {GITHUB_TOKEN_GENERATE_URL}",
        TOKEN_ENV_VARS.join(" or ")
    )))
}

/// What to tell the operator when GitHub rejects the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnauthorizedReport {
    /// Failure as reported by GitHub
    pub failure: String,
    /// What the operator should check
    pub remedy: &'static str,
    /// Where a new token can be generated
    pub token_url: &'static str,
}

impl UnauthorizedReport {
    /// Build the report for `err`, if it is an authentication failure
    pub fn for_error(err: &Error) -> Option<Self> {
        match err {
            Error::Unauthorized(message) => Some(Self {
                failure: format!("Github API request failed. {message}"),
                remedy: "Please ensure that your provided token is valid.",
                token_url: GITHUB_TOKEN_GENERATE_URL,
            }),
            _ => None,
        }
    }
}
