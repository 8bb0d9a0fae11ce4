//! Configuration loading and validation
//!
//! The project configuration lives in `.devinfra.toml` at the repository root.
//! [`load_config`] reads it and validates the common `[github]` section; the
//! merge policy is validated separately by [`load_and_validate_merge_config`]
//! because it needs live repository metadata.

mod merge;

pub use merge::{
    GithubApiMergeConfig, LabelPattern, MergeConfig, MethodLabel, RawGithubApiMergeConfig,
    RawMergeConfig, RawMethodLabel, RawTargetLabel, TargetLabel, BASE_BRANCH_PLACEHOLDER,
    load_and_validate_merge_config, validate_merge_config,
};

use crate::error::{Error, Result};
use crate::platform::DEFAULT_TIMEOUT_SECS;
use crate::types::RemoteDescriptor;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filename of the project configuration, relative to the repository root
pub const CONFIG_FILE_NAME: &str = ".devinfra.toml";

/// Default location of the bot configuration checked by `ngbot verify`
pub const DEFAULT_NGBOT_CONFIG_PATH: &str = ".github/angular-robot.yml";

/// `[github]` section as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGithubConfig {
    /// Repository owner
    pub owner: Option<String>,
    /// Repository name
    pub name: Option<String>,
    /// GitHub Enterprise host
    pub host: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[release]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseConfig {
    /// npm package whose dist tags describe the LTS branches
    pub npm_package: Option<String>,
}

/// `[ngbot]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NgbotConfig {
    /// Path of the bot YAML config, relative to the repository root
    pub config_path: Option<PathBuf>,
}

/// The configuration file as parsed, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// `[github]`
    pub github: Option<RawGithubConfig>,
    /// `[merge]`
    pub merge: Option<RawMergeConfig>,
    /// `[release]`
    #[serde(default)]
    pub release: ReleaseConfig,
    /// `[ngbot]`
    #[serde(default)]
    pub ngbot: NgbotConfig,
}

/// Configuration with the common section validated
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Repository the tooling operates against
    pub github: RemoteDescriptor,
    /// Time budget for each GitHub request
    pub timeout: Duration,
    /// Merge section, validated on demand by the merge tooling
    pub merge: Option<RawMergeConfig>,
    /// Release tooling settings
    pub release: ReleaseConfig,
    /// Bot config verification settings
    pub ngbot: NgbotConfig,
}

/// Get path to the configuration file for a repository root
pub fn config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(CONFIG_FILE_NAME)
}

/// Parse configuration text without validating it
pub fn parse_config(content: &str) -> Result<RawConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
}

/// Validate the common section, collecting every problem found
pub fn validate_common_config(raw: RawConfig) -> Result<CommonConfig> {
    let mut errors = Vec::new();

    let github = match raw.github {
        None => {
            errors.push(r#"Github repository not configured. Set the "github" option."#.to_string());
            None
        }
        Some(gh) => {
            let name = gh.name.filter(|n| !n.trim().is_empty());
            let owner = gh.owner.filter(|o| !o.trim().is_empty());
            if name.is_none() {
                errors.push(r#""github.name" is not defined"#.to_string());
            }
            if owner.is_none() {
                errors.push(r#""github.owner" is not defined"#.to_string());
            }
            if gh.timeout_secs == Some(0) {
                errors.push(r#""github.timeout_secs" must be greater than zero"#.to_string());
            }
            match (owner, name) {
                (Some(owner), Some(name)) => Some((
                    RemoteDescriptor {
                        owner,
                        name,
                        host: gh.host,
                    },
                    gh.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                )),
                _ => None,
            }
        }
    };

    match github {
        Some((github, timeout_secs)) if errors.is_empty() => Ok(CommonConfig {
            github,
            timeout: Duration::from_secs(timeout_secs),
            merge: raw.merge,
            release: raw.release,
            ngbot: raw.ngbot,
        }),
        _ => Err(Error::InvalidConfig(errors)),
    }
}

/// Load and validate the configuration of the repository at `repo_root`
pub fn load_config(repo_root: &Path) -> Result<CommonConfig> {
    let path = config_path(repo_root);

    if !path.exists() {
        return Err(Error::Config(format!(
            "no configuration found at {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    validate_common_config(parse_config(&content)?)
}
