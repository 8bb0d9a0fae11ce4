//! `release` commands

use crate::cli::context::RepoContext;
use crate::cli::style::{Stylize, spinner_style};
use anstream::println;
use chrono::{NaiveDate, TimeZone, Utc};
use devinfra::error::{Error, Result};
use devinfra::platform::DEFAULT_TIMEOUT_SECS;
use devinfra::release::{LtsBranch, NpmRegistry, compute_lts_end_date};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

fn print_branches(title: &str, branches: &[LtsBranch]) {
    println!("{}:", title.emphasis());
    if branches.is_empty() {
        println!("  {}", "none".muted());
        return;
    }
    for branch in branches {
        let end = branch
            .lts_end
            .map_or_else(|| "unknown".to_string(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "  {} {} {}",
            branch.name.accent(),
            format!("({}, {})", branch.version, branch.npm_dist_tag).muted(),
            format!("LTS ends {end}").muted()
        );
    }
}

/// List active and inactive LTS branches of an npm package
///
/// Without `package`, the `[release]` section of the repository config
/// names it.
pub async fn run_lts(path: &Path, package: Option<String>) -> Result<()> {
    let (package, timeout) = match package {
        Some(p) => (p, Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        None => {
            let repo = RepoContext::new(path).await?;
            let package = repo.config.release.npm_package.clone().ok_or_else(|| {
                Error::Config(
                    "No npm package given and \"release.npm_package\" is not configured".into(),
                )
            })?;
            (package, repo.config.timeout)
        }
    };

    let registry = NpmRegistry::new(timeout)?;
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Fetching {package} from the npm registry..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let branches = registry.fetch_lts_branches(&package).await;
    spinner.finish_and_clear();
    let branches = branches?;

    print_branches("Active LTS branches", &branches.active);
    println!();
    print_branches("Inactive LTS branches", &branches.inactive);
    Ok(())
}

/// Print the LTS end date for a major released on `date` (`YYYY-MM-DD`)
pub fn run_lts_end(date: &str) -> Result<()> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("invalid release date \"{date}\": {e}")))?;
    let release = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
    let end = compute_lts_end_date(release)
        .ok_or_else(|| Error::Internal(format!("LTS end date for {date} is out of range")))?;
    println!("{}", end.format("%Y-%m-%d"));
    Ok(())
}
