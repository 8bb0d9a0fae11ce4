//! Release tooling
//!
//! Long-term support calculations and LTS branch discovery from the npm
//! registry.

mod lts;

pub use lts::{
    LtsBranch, LtsBranches, MAJOR_ACTIVE_SUPPORT_MONTHS, MAJOR_LTS_MONTHS, NpmPackageInfo,
    Version, classify_lts_branches, compute_lts_end_date, is_lts_dist_tag, lts_dist_tag,
};

use crate::error::{Error, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Public npm registry
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Read-only npm registry client
pub struct NpmRegistry {
    http_client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Client for the public registry
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(NPM_REGISTRY_URL, timeout)
    }

    /// Client for a registry at `base_url`
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent("devinfra")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the registry document of `package`
    pub async fn package_info(&self, package: &str) -> Result<NpmPackageInfo> {
        // Scoped names keep their `@` but the slash must be escaped.
        let url = format!("{}/{}", self.base_url, package.replace('/', "%2F"));
        debug!(%url, "fetching npm package info");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Registry(format!(
                "npm registry returned {status} for {package}"
            )));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::Registry(format!("invalid npm registry response for {package}: {e}")))
    }

    /// Active and inactive LTS branches of `package` as of now
    pub async fn fetch_lts_branches(&self, package: &str) -> Result<LtsBranches> {
        let info = self.package_info(package).await?;
        Ok(classify_lts_branches(&info, Utc::now()))
    }
}
