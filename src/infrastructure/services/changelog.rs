//! Changelog detection for a package version
//!
//! GitHub releases win over a changelog file shipped in the tarball.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::{DomainError, PackageSpec};

use super::registry::RegistryService;

pub const GITHUB_SERVICE: &str = "github";
pub const JSDELIVR_DATA_SERVICE: &str = "jsdelivr-data";

const CHANGELOG_FILES: &[&str] = &["changelog.md", "changes.md", "history.md", "releases.md"];

static GITHUB_REPO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com[/:]([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+?)(?:\.git)?/?$")
        .expect("valid github repository regex")
});

static SHORTHAND_REPO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:github:)?([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+)$")
        .expect("valid shorthand repository regex")
});

/// Where a package's changelog lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangelogInfo {
    Release { provider: String, repo: String },
    Md { path: String, url: String },
}

#[derive(Debug, Clone)]
pub struct ChangelogServiceConfig {
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub jsdelivr_data_url: String,
    pub cdn_url: String,
}

#[derive(Debug, Clone)]
pub struct ChangelogService {
    upstream: Arc<dyn UpstreamClient>,
    registry: RegistryService,
    config: ChangelogServiceConfig,
}

impl ChangelogService {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        registry: RegistryService,
        config: ChangelogServiceConfig,
    ) -> Self {
        Self {
            upstream,
            registry,
            config,
        }
    }

    pub async fn info(&self, spec: &PackageSpec) -> Result<Option<ChangelogInfo>, DomainError> {
        let manifest = self.registry.manifest(spec).await?;
        let version = manifest
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_else(|| spec.version_str().unwrap_or("latest"))
            .to_string();

        if let Some(repo) = manifest.get("repository").and_then(github_repo) {
            if self.has_github_releases(&repo).await? {
                return Ok(Some(ChangelogInfo::Release {
                    provider: "github".to_string(),
                    repo,
                }));
            }
        }

        self.changelog_file(spec, &version).await
    }

    /// A missing repository means no releases. Other failures propagate
    /// so an outage is never stored as an answer.
    async fn has_github_releases(&self, repo: &str) -> Result<bool, DomainError> {
        let url = format!(
            "{}/repos/{}/releases",
            self.config.github_api_url.trim_end_matches('/'),
            repo
        );
        let mut request = FetchRequest::json(GITHUB_SERVICE, url)
            .with_query("per_page", "1")
            .with_header("accept", "application/vnd.github+json");

        if let Some(token) = &self.config.github_token {
            request = request.with_header("authorization", format!("Bearer {}", token));
        }

        match self.upstream.fetch(&request).await {
            Ok(Value::Array(releases)) => Ok(!releases.is_empty()),
            Ok(_) => Ok(false),
            Err(DomainError::NotFound { .. }) => {
                debug!(repo, "GitHub repository not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn changelog_file(
        &self,
        spec: &PackageSpec,
        version: &str,
    ) -> Result<Option<ChangelogInfo>, DomainError> {
        let url = format!(
            "{}/v1/packages/npm/{}@{}",
            self.config.jsdelivr_data_url.trim_end_matches('/'),
            spec.name,
            version
        );
        let request = FetchRequest::json(JSDELIVR_DATA_SERVICE, url).with_query("structure", "flat");

        let listing = match self.upstream.fetch(&request).await {
            Ok(listing) => listing,
            Err(DomainError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let path = listing
            .get("files")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|file| file.get("name").and_then(Value::as_str))
            .find(|name| is_root_changelog(name));

        Ok(path.map(|path| {
            let path = path.trim_start_matches('/').to_string();
            let url = format!(
                "{}/npm/{}@{}/{}",
                self.config.cdn_url.trim_end_matches('/'),
                spec.name,
                version,
                path
            );
            ChangelogInfo::Md { path, url }
        }))
    }
}

fn is_root_changelog(name: &str) -> bool {
    let name = name.trim_start_matches('/');
    !name.contains('/') && CHANGELOG_FILES.contains(&name.to_ascii_lowercase().as_str())
}

/// `owner/repo` from a manifest `repository` field, if hosted on GitHub
pub fn github_repo(repository: &Value) -> Option<String> {
    let raw = match repository {
        Value::String(url) => url.as_str(),
        Value::Object(fields) => fields.get("url")?.as_str()?,
        _ => return None,
    };
    let raw = raw.trim();

    let captures = GITHUB_REPO_PATTERN
        .captures(raw)
        .or_else(|| SHORTHAND_REPO_PATTERN.captures(raw))?;

    Some(format!("{}/{}", &captures[1], &captures[2]))
}
