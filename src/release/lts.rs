//! Long-term support windows and LTS branch discovery

use chrono::{DateTime, Months, Utc};
use regex::Regex;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Months a major is actively supported
pub const MAJOR_ACTIVE_SUPPORT_MONTHS: u32 = 6;

/// Months of long-term support following active support
pub const MAJOR_LTS_MONTHS: u32 = 12;

static LTS_DIST_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)-lts$").expect("static regex"));

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?(?:\+[0-9A-Za-z.-]+)?$")
        .expect("static regex")
});

/// Date long-term support ends for a major released at `release`
///
/// Month arithmetic clamps to the end of the month, so a major released on
/// August 31st loses LTS on the last day of February.
pub fn compute_lts_end_date(release: DateTime<Utc>) -> Option<DateTime<Utc>> {
    release.checked_add_months(Months::new(MAJOR_ACTIVE_SUPPORT_MONTHS + MAJOR_LTS_MONTHS))
}

/// npm dist tag under which the LTS releases of `major` are published
pub fn lts_dist_tag(major: u64) -> String {
    format!("v{major}-lts")
}

/// Whether `tag` names an LTS dist tag
pub fn is_lts_dist_tag(tag: &str) -> bool {
    LTS_DIST_TAG.is_match(tag)
}

/// A semantic version as published on npm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// Major
    pub major: u64,
    /// Minor
    pub minor: u64,
    /// Patch
    pub patch: u64,
    /// Prerelease identifier, e.g. `next.1`
    pub prerelease: Option<String>,
}

impl Version {
    /// Parse `1.2.3` or `1.2.3-next.0`; build metadata is ignored
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION.captures(input.trim())?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Name of the patch branch this version lives on
    pub fn branch_name(&self) -> String {
        format!("{}.{}.x", self.major, self.minor)
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// Package document from the npm registry, reduced to what LTS needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpmPackageInfo {
    /// Dist tag name to version
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
    /// Version (and `created`/`modified`) to publish time
    #[serde(default)]
    pub time: BTreeMap<String, String>,
}

/// An LTS release train
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtsBranch {
    /// Patch branch, e.g. `10.2.x`
    pub name: String,
    /// Most recent version published under the dist tag
    pub version: Version,
    /// npm dist tag, e.g. `v10-lts`
    pub npm_dist_tag: String,
    /// End of long-term support, if the major's release date is known
    pub lts_end: Option<DateTime<Utc>>,
}

/// LTS branches split by whether support has ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LtsBranches {
    /// Still supported, newest first
    pub active: Vec<LtsBranch>,
    /// Support ended, newest first
    pub inactive: Vec<LtsBranch>,
}

/// Classify the LTS dist tags of a package as of `today` (PURE)
///
/// Tags pointing at an unparsable version are skipped. A major whose
/// `X.0.0` release time is unknown is treated as inactive.
pub fn classify_lts_branches(info: &NpmPackageInfo, today: DateTime<Utc>) -> LtsBranches {
    let mut branches = LtsBranches::default();

    for (tag, raw_version) in &info.dist_tags {
        if !is_lts_dist_tag(tag) {
            continue;
        }
        let Some(version) = Version::parse(raw_version) else {
            tracing::warn!(tag, version = raw_version, "skipping unparsable LTS version");
            continue;
        };

        let lts_end = info
            .time
            .get(&format!("{}.0.0", version.major))
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .and_then(compute_lts_end_date);

        let branch = LtsBranch {
            name: version.branch_name(),
            version,
            npm_dist_tag: tag.clone(),
            lts_end,
        };
        if lts_end.is_some_and(|end| today <= end) {
            branches.active.push(branch);
        } else {
            branches.inactive.push(branch);
        }
    }

    branches.active.sort_by(|a, b| b.version.cmp(&a.version));
    branches.inactive.sort_by(|a, b| b.version.cmp(&a.version));
    branches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lts_end_is_eighteen_months_later() {
        let release = Utc.with_ymd_and_hms(2020, 6, 24, 12, 0, 0).unwrap();
        assert_eq!(
            compute_lts_end_date(release).unwrap(),
            Utc.with_ymd_and_hms(2021, 12, 24, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_lts_end_clamps_to_month_end() {
        let release = Utc.with_ymd_and_hms(2019, 8, 31, 0, 0, 0).unwrap();
        assert_eq!(
            compute_lts_end_date(release).unwrap(),
            Utc.with_ymd_and_hms(2021, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_dist_tag_format() {
        assert_eq!(lts_dist_tag(10), "v10-lts");
        assert!(is_lts_dist_tag("v10-lts"));
        assert!(!is_lts_dist_tag("latest"));
        assert!(!is_lts_dist_tag("v10-lts-old"));
    }

    #[test]
    fn test_version_ordering() {
        let stable = Version::parse("10.2.3").unwrap();
        let pre = Version::parse("10.2.3-rc.1").unwrap();
        let older = Version::parse("9.9.9").unwrap();
        assert!(stable > pre);
        assert!(pre > older);
        assert!(Version::parse("1.0.0-next.10").unwrap() > Version::parse("1.0.0-next.2").unwrap());
        assert!(Version::parse("not-a-version").is_none());
    }
}
