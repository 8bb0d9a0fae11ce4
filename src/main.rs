//! devinfra CLI

mod cli;

use anstream::eprintln;
use clap::{Parser, Subcommand};
use cli::style::{Stylize, hyperlink};
use devinfra::auth::UnauthorizedReport;
use devinfra::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Repository maintenance tooling
#[derive(Parser)]
#[command(name = "devinfra", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the repository (default: current directory)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull request tooling
    Pr {
        #[command(subcommand)]
        command: PrCommands,
    },
    /// Configuration tooling
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Release tooling
    Release {
        #[command(subcommand)]
        command: ReleaseCommands,
    },
    /// NgBot tooling
    Ngbot {
        #[command(subcommand)]
        command: NgbotCommands,
    },
}

#[derive(Subcommand)]
enum PrCommands {
    /// Merge a pull request according to the merge policy
    Merge {
        /// Pull request number
        pr: u64,

        /// Do not ask for confirmation of the target branches
        #[arg(long)]
        no_branch_prompt: bool,

        /// GitHub token (also read from GITHUB_TOKEN, TOKEN or `gh auth token`)
        #[arg(long)]
        github_token: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate the repository configuration, including the merge policy
    Validate {
        /// GitHub token (also read from GITHUB_TOKEN, TOKEN or `gh auth token`)
        #[arg(long)]
        github_token: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReleaseCommands {
    /// List active and inactive LTS branches from the npm registry
    Lts {
        /// npm package (default: `release.npm_package` from the config)
        package: Option<String>,
    },
    /// Print the LTS end date of a major released on the given date
    LtsEnd {
        /// Release date of the major, as YYYY-MM-DD
        date: String,
    },
}

#[derive(Subcommand)]
enum NgbotCommands {
    /// Check that the NgBot YAML config parses
    Verify,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("devinfra=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Pr {
            command:
                PrCommands::Merge {
                    pr,
                    no_branch_prompt,
                    github_token,
                },
        } => {
            let options = cli::merge::MergeOptions {
                pr_number: pr,
                github_token,
                no_branch_prompt,
            };
            Ok(cli::merge::run_merge(&path, options).await?)
        }
        Commands::Config {
            command: ConfigCommands::Validate { github_token },
        } => {
            cli::config::run_validate(&path, github_token.as_deref()).await?;
            Ok(0)
        }
        Commands::Release {
            command: ReleaseCommands::Lts { package },
        } => {
            cli::release::run_lts(&path, package).await?;
            Ok(0)
        }
        Commands::Release {
            command: ReleaseCommands::LtsEnd { date },
        } => {
            cli::release::run_lts_end(&date)?;
            Ok(0)
        }
        Commands::Ngbot {
            command: NgbotCommands::Verify,
        } => Ok(cli::ngbot::run_verify(&path).await?),
    }
}

fn report_error(err: &anyhow::Error) {
    let Some(err) = err.downcast_ref::<Error>() else {
        eprintln!("{} {err:#}", "Error:".error());
        return;
    };
    if let Some(report) = UnauthorizedReport::for_error(err) {
        eprintln!("{}", report.failure.error());
        eprintln!("{}", report.remedy.warn());
        eprintln!(
            "{}",
            format!(
                "You can generate a token here: {}",
                hyperlink(report.token_url, report.token_url)
            )
            .warn()
        );
        return;
    }
    match err {
        Error::InvalidConfig(errors) => {
            eprintln!("{}", "Invalid configuration:".error());
            for e in errors {
                eprintln!("  - {e}");
            }
        }
        other => eprintln!("{} {other}", "Error:".error()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
