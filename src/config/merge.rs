//! Merge policy configuration

use crate::config::CommonConfig;
use crate::error::{Error, Result};
use crate::merge::StrategyKind;
use crate::platform::PlatformService;
use crate::types::{MergeMethod, RemoteDescriptor, RepositoryInfo};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Target branch entry replaced by the branch the PR targets on GitHub
pub const BASE_BRANCH_PLACEHOLDER: &str = "{base}";

/// `[merge]` section as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMergeConfig {
    /// Label signalling the PR is approved for merging
    pub merge_ready_label: Option<String>,
    /// Label signalling the CLA is signed
    pub cla_signed_label: Option<String>,
    /// Label requesting a commit message fixup while merging
    pub commit_message_fixup_label: Option<String>,
    /// Labels that block merging
    #[serde(default)]
    pub blocking_labels: Vec<String>,
    /// Whether CI must pass
    pub require_passing_checks: Option<bool>,
    /// Commit each target branch's PRs must contain
    #[serde(default)]
    pub required_base_commits: BTreeMap<String, String>,
    /// Default strategy identifier
    pub strategy: Option<String>,
    /// Settings for the GitHub API merge strategy
    pub github_api_merge: Option<RawGithubApiMergeConfig>,
    /// Target labels
    #[serde(default)]
    pub labels: Vec<RawTargetLabel>,
}

/// `[[merge.labels]]` entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTargetLabel {
    /// Label pattern
    pub pattern: String,
    /// Branches the PR merges into
    #[serde(default)]
    pub branches: Vec<String>,
    /// Strategy override for this label
    pub strategy: Option<String>,
}

/// `[merge.github_api_merge]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGithubApiMergeConfig {
    /// Default merge method
    pub default: Option<String>,
    /// Per-label merge method overrides
    #[serde(default)]
    pub labels: Vec<RawMethodLabel>,
}

/// Per-label merge method override as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMethodLabel {
    /// Label pattern
    pub pattern: String,
    /// Merge method identifier
    pub method: String,
}

/// Prefix marking a label pattern as a regular expression
pub const REGEX_LABEL_PREFIX: &str = "regex:";

/// A label pattern, matched against the whole label name
///
/// Plain patterns match the label literally. Patterns starting with
/// [`REGEX_LABEL_PREFIX`] are regular expressions anchored at both ends.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    source: String,
    regex: Regex,
}

impl LabelPattern {
    /// Compile a pattern
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let expr = source
            .strip_prefix(REGEX_LABEL_PREFIX)
            .map_or_else(|| regex::escape(source), str::to_string);
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(&format!("^(?:{expr})$"))?,
        })
    }

    /// Pattern as written in the configuration
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `label` matches this pattern
    pub fn matches(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// First label in `labels` matching this pattern
    pub fn find<'a>(&self, labels: &'a [String]) -> Option<&'a str> {
        labels.iter().map(String::as_str).find(|l| self.matches(l))
    }
}

impl std::fmt::Display for LabelPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// A target label: which branches a PR merges into, and how
#[derive(Debug, Clone)]
pub struct TargetLabel {
    /// Label pattern
    pub pattern: LabelPattern,
    /// Target branches; may contain [`BASE_BRANCH_PLACEHOLDER`]
    pub branches: Vec<String>,
    /// Strategy used for PRs carrying this label
    pub strategy: StrategyKind,
}

impl TargetLabel {
    /// Resolve the target branches for a PR targeting `base` on GitHub
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn resolve_branches(&self, base: &str) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            let branch = if branch == BASE_BRANCH_PLACEHOLDER {
                base
            } else {
                branch.as_str()
            };
            if !resolved.iter().any(|b| b == branch) {
                resolved.push(branch.to_string());
            }
        }
        resolved
    }
}

/// Per-label merge method override
#[derive(Debug, Clone)]
pub struct MethodLabel {
    /// Label pattern
    pub pattern: LabelPattern,
    /// Method to use when the label is present
    pub method: MergeMethod,
}

/// Settings for the GitHub API merge strategy
#[derive(Debug, Clone)]
pub struct GithubApiMergeConfig {
    /// Method used when no label override matches
    pub default: MergeMethod,
    /// Per-label overrides, first match wins
    pub labels: Vec<MethodLabel>,
}

impl GithubApiMergeConfig {
    /// Merge method for a PR with the given labels
    pub fn method_for(&self, labels: &[String]) -> MergeMethod {
        self.labels
            .iter()
            .find(|m| m.pattern.find(labels).is_some())
            .map_or(self.default, |m| m.method)
    }
}

/// Validated merge policy
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Repository the merge tooling writes to
    pub remote: RemoteDescriptor,
    /// Default branch of the remote repository
    pub default_branch: String,
    /// Label required for merging
    pub merge_ready_label: LabelPattern,
    /// Label required to show the CLA is signed
    pub cla_signed_label: Option<LabelPattern>,
    /// Label requesting a commit message fixup
    pub commit_message_fixup_label: Option<LabelPattern>,
    /// Labels that block merging
    pub blocking_labels: Vec<LabelPattern>,
    /// Whether CI must pass
    pub require_passing_checks: bool,
    /// Commit each target branch's PRs must contain
    pub required_base_commits: BTreeMap<String, String>,
    /// Settings for the GitHub API merge strategy
    pub github_api_merge: Option<GithubApiMergeConfig>,
    /// Target labels, first match wins
    pub labels: Vec<TargetLabel>,
}

fn compile(pattern: &str, what: &str, errors: &mut Vec<String>) -> Option<LabelPattern> {
    match LabelPattern::new(pattern) {
        Ok(p) => Some(p),
        Err(e) => {
            errors.push(format!("Invalid {what} pattern \"{pattern}\": {e}"));
            None
        }
    }
}

fn parse_method(method: &str, errors: &mut Vec<String>) -> Option<MergeMethod> {
    match method {
        "squash" => Some(MergeMethod::Squash),
        "merge" => Some(MergeMethod::Merge),
        "rebase" => Some(MergeMethod::Rebase),
        other => {
            errors.push(format!(
                "Unknown merge method \"{other}\". Expected one of: squash, merge, rebase."
            ));
            None
        }
    }
}

fn parse_strategy(strategy: &str, errors: &mut Vec<String>) -> Option<StrategyKind> {
    match strategy.parse::<StrategyKind>() {
        Ok(kind) => Some(kind),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Validate the merge section against repository metadata
///
/// Every problem is collected; the config is only returned when the list is
/// empty.
pub fn validate_merge_config(
    raw: Option<&RawMergeConfig>,
    remote: &RemoteDescriptor,
    repo: &RepositoryInfo,
) -> std::result::Result<MergeConfig, Vec<String>> {
    let Some(raw) = raw else {
        return Err(vec![
            "No merge configuration found. Set the \"merge\" configuration.".to_string(),
        ]);
    };

    let mut errors = Vec::new();

    let merge_ready_label = match raw.merge_ready_label.as_deref() {
        Some(p) => compile(p, "merge ready label", &mut errors),
        None => {
            errors.push("No merge ready label configured.".to_string());
            None
        }
    };
    let cla_signed_label = raw
        .cla_signed_label
        .as_deref()
        .and_then(|p| compile(p, "CLA signed label", &mut errors));
    let commit_message_fixup_label = raw
        .commit_message_fixup_label
        .as_deref()
        .and_then(|p| compile(p, "commit message fixup label", &mut errors));
    let blocking_labels: Vec<LabelPattern> = raw
        .blocking_labels
        .iter()
        .filter_map(|p| compile(p, "blocking label", &mut errors))
        .collect();

    let default_strategy = match raw.strategy.as_deref() {
        Some(s) => parse_strategy(s, &mut errors),
        None => {
            errors.push(
                "No explicit choice of merge strategy. Set \"merge.strategy\" to \"github-api\" or \"autosquash\"."
                    .to_string(),
            );
            None
        }
    };

    let github_api_merge = raw.github_api_merge.as_ref().and_then(|api| {
        let default = match api.default.as_deref() {
            Some(m) => parse_method(m, &mut errors),
            None => {
                errors.push("No default merge method set in \"merge.github_api_merge\".".to_string());
                None
            }
        };
        let labels: Vec<MethodLabel> = api
            .labels
            .iter()
            .filter_map(|l| {
                let pattern = compile(&l.pattern, "merge method label", &mut errors)?;
                let method = parse_method(&l.method, &mut errors)?;
                Some(MethodLabel { pattern, method })
            })
            .collect();

        for method in default.iter().copied().chain(labels.iter().map(|l| l.method)) {
            if !repo.allows(method) {
                errors.push(format!(
                    "Merge method \"{method}\" is not allowed by the settings of {remote}."
                ));
            }
        }

        default.map(|default| GithubApiMergeConfig { default, labels })
    });

    if raw.labels.is_empty() {
        errors.push("No label configuration.".to_string());
    }

    let mut labels = Vec::with_capacity(raw.labels.len());
    for label in &raw.labels {
        let pattern = compile(&label.pattern, "target label", &mut errors);
        if label.branches.is_empty() || label.branches.iter().any(|b| b.trim().is_empty()) {
            errors.push(format!(
                "Target label \"{}\" must map to at least one non-empty branch.",
                label.pattern
            ));
        }
        let strategy = match label.strategy.as_deref() {
            Some(s) => parse_strategy(s, &mut errors),
            None => default_strategy,
        };
        if strategy == Some(StrategyKind::GithubApi) && raw.github_api_merge.is_none() {
            errors.push(format!(
                "Target label \"{}\" uses the github-api strategy but \"merge.github_api_merge\" is not configured.",
                label.pattern
            ));
        }
        if let (Some(pattern), Some(strategy)) = (pattern, strategy) {
            labels.push(TargetLabel {
                pattern,
                branches: label.branches.clone(),
                strategy,
            });
        }
    }

    match merge_ready_label {
        Some(merge_ready_label) if errors.is_empty() => Ok(MergeConfig {
            remote: remote.clone(),
            default_branch: repo.default_branch.clone(),
            merge_ready_label,
            cla_signed_label,
            commit_message_fixup_label,
            blocking_labels,
            require_passing_checks: raw.require_passing_checks.unwrap_or(true),
            required_base_commits: raw.required_base_commits.clone(),
            github_api_merge,
            labels,
        }),
        _ => Err(errors),
    }
}

/// Load the merge policy and validate it against the live repository
///
/// Validation problems are returned as [`Error::InvalidConfig`]; remote
/// failures (including an invalid token) keep their own error variants.
pub async fn load_and_validate_merge_config(
    common: &CommonConfig,
    platform: &dyn PlatformService,
) -> Result<MergeConfig> {
    let repo = platform.get_repository_info().await?;
    debug!(
        remote = %common.github,
        default_branch = %repo.default_branch,
        "validating merge config against repository"
    );
    validate_merge_config(common.merge.as_ref(), &common.github, &repo)
        .map_err(Error::InvalidConfig)
}
