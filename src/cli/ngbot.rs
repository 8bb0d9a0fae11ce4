//! `ngbot verify` command

use crate::cli::context::RepoContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use devinfra::config;
use devinfra::error::Result;
use devinfra::git::GitClient;
use devinfra::ngbot::{NgbotVerification, ngbot_config_path, verify_file};
use std::path::Path;
use tracing::debug;

/// Verify the bot YAML config, returning the process exit code
///
/// A repository without `.devinfra.toml` still gets the default location.
/// A configuration file that exists but cannot be loaded is an error.
pub async fn run_verify(path: &Path) -> Result<i32> {
    let root = GitClient::find_root(path).await?;
    let config_path = if config::config_path(&root).exists() {
        let repo = RepoContext::new(&root).await?;
        ngbot_config_path(&repo.repo_root, Some(&repo.config))
    } else {
        debug!(root = %root.display(), "no configuration file, using default bot config path");
        ngbot_config_path(&root, None)
    };

    match verify_file(&config_path)? {
        NgbotVerification::Valid => {
            println!("{}  Valid NgBot YAML config", check().success());
            Ok(0)
        }
        NgbotVerification::Invalid { error } => {
            eprintln!("{} Invalid NgBot YAML config", cross().error());
            eprintln!("{}", error.muted());
            Ok(1)
        }
    }
}
