//! `config validate` command

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use anstream::println;
use devinfra::config::load_and_validate_merge_config;
use devinfra::error::Result;
use std::path::Path;

/// Validate the common config and, when present, the merge policy against
/// the live repository settings
pub async fn run_validate(path: &Path, github_token: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(path, github_token).await?;
    println!(
        "{} Common configuration is valid ({})",
        check().success(),
        ctx.repo.config.github.to_string().accent()
    );

    if ctx.repo.config.merge.is_none() {
        println!("{}", "No merge configuration to validate.".muted());
        return Ok(());
    }

    let merge = load_and_validate_merge_config(&ctx.repo.config, &ctx.platform).await?;
    println!(
        "{} Merge configuration is valid ({} target label(s), default branch {})",
        check().success(),
        merge.labels.len(),
        merge.default_branch.accent()
    );
    Ok(())
}
