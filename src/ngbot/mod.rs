//! Bot configuration verification

use crate::config::{CommonConfig, DEFAULT_NGBOT_CONFIG_PATH};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of checking the bot config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NgbotVerification {
    /// The file parses as YAML
    Valid,
    /// The file does not parse
    Invalid {
        /// Parser error
        error: String,
    },
}

impl NgbotVerification {
    /// Whether the config is usable
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Path of the bot config for a repository
pub fn ngbot_config_path(repo_root: &Path, config: Option<&CommonConfig>) -> PathBuf {
    let relative = config
        .and_then(|c| c.ngbot.config_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_NGBOT_CONFIG_PATH));
    repo_root.join(relative)
}

/// Check that `content` is well-formed YAML
pub fn verify_yaml(content: &str) -> NgbotVerification {
    match serde_yaml::from_str::<serde_yaml::Value>(content) {
        Ok(_) => NgbotVerification::Valid,
        Err(e) => NgbotVerification::Invalid {
            error: e.to_string(),
        },
    }
}

/// Read and check the bot config at `path`
///
/// A missing or unreadable file is an error, not an invalid config.
pub fn verify_file(path: &Path) -> Result<NgbotVerification> {
    debug!(path = %path.display(), "verifying bot config");
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    Ok(verify_yaml(&content))
}
