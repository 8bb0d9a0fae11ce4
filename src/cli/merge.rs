//! `pr merge` command - merge a pull request according to the merge policy

use crate::cli::context::CommandContext;
use crate::cli::prompt::TerminalPrompt;
use crate::cli::style::{Stylize, check, cross, spinner_style};
use anstream::eprintln;
use devinfra::config::load_and_validate_merge_config;
use devinfra::error::Result;
use devinfra::merge::{
    Failure, MergeReporter, MergeResult, PullRequestMergeTask, TaskFlags, run_merge_session,
};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Options for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Pull request to merge
    pub pr_number: u64,
    /// Token passed on the command line
    pub github_token: Option<String>,
    /// Skip the target branch confirmation
    pub no_branch_prompt: bool,
}

/// Prints merge outcomes to stderr
struct CliReporter;

impl MergeReporter for CliReporter {
    fn attempt_finished(&self, pr_number: u64, result: &MergeResult) {
        match result {
            MergeResult::Success => eprintln!(
                "{} Successfully merged the pull request: {}",
                check().success(),
                format!("#{pr_number}").accent()
            ),
            MergeResult::DirtyWorkingDir => eprintln!(
                "{} Local working repository not clean. Please make sure there are no \
                 uncommitted changes.",
                cross().error()
            ),
            MergeResult::UnknownGitError => eprintln!(
                "{} An unknown Git error has been thrown. Please check the output above for \
                 details.",
                cross().error()
            ),
            MergeResult::GithubError { message } => {
                eprintln!(
                    "{} An error related to interacting with Github has been discovered.",
                    cross().error()
                );
                eprintln!("{}", message.error());
            }
            MergeResult::UserAborted => eprintln!(
                "Merge of pull request has been aborted manually: {}",
                format!("#{pr_number}").accent()
            ),
            MergeResult::Failed(failure) => {
                eprintln!(
                    "{} Could not merge the specified pull request.",
                    cross().error()
                );
                eprintln!("{}", failure.message.error());
            }
        }
    }

    fn force_available(&self, _failure: &Failure) {
        eprintln!(
            "{}",
            "The pull request above failed due to non-critical errors. This error can be \
             forcibly ignored if desired."
                .warn()
        );
    }
}

/// Run the merge command, returning the process exit code
pub async fn run_merge(path: &Path, options: MergeOptions) -> Result<i32> {
    let ctx = CommandContext::new(path, options.github_token.as_deref()).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Validating merge configuration...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let merge_config = load_and_validate_merge_config(&ctx.repo.config, &ctx.platform).await;
    spinner.finish_and_clear();
    let merge_config = merge_config?;

    let prompt = TerminalPrompt;
    let task = PullRequestMergeTask::new(
        &merge_config,
        &ctx.platform,
        &ctx.git,
        &prompt,
        TaskFlags {
            branch_prompt: !options.no_branch_prompt,
        },
    );

    let outcome = run_merge_session(&task, options.pr_number, &prompt, &CliReporter).await?;
    Ok(outcome.exit_code())
}
