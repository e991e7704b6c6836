//! Package README lookup

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::{DomainError, PackageSpec};

use super::registry::{RegistryService, resolve_version};

pub const JSDELIVR_SERVICE: &str = "jsdelivr";

/// File names tried on the CDN, in order
const README_FILES: &[&str] = &["README.md", "readme.md", "Readme.md"];

/// Placeholder the registry stores when a package has no README
const MISSING_README: &str = "ERROR: No README data found!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadmeSource {
    Jsdelivr,
    Registry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readme {
    pub package: String,
    pub version: Option<String>,
    pub markdown: String,
    pub source: ReadmeSource,
}

#[derive(Debug, Clone)]
pub struct ReadmeService {
    upstream: Arc<dyn UpstreamClient>,
    registry: RegistryService,
    cdn_url: String,
}

impl ReadmeService {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        registry: RegistryService,
        cdn_url: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            registry,
            cdn_url: cdn_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// README for a package version.
    ///
    /// Versioned requests read the published file from the CDN first; the
    /// packument's `readme` field (which tracks `latest`) is the fallback.
    pub async fn readme(&self, spec: &PackageSpec) -> Result<Readme, DomainError> {
        let packument = self.registry.packument(&spec.name).await?;
        let version = spec
            .version_str()
            .and_then(|requested| resolve_version(&packument, requested));

        if let Some(version) = &version {
            if let Some(markdown) = self.from_cdn(spec, version).await? {
                return Ok(Readme {
                    package: spec.name.to_string(),
                    version: Some(version.clone()),
                    markdown,
                    source: ReadmeSource::Jsdelivr,
                });
            }
        }

        let markdown = packument
            .get("readme")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|readme| !readme.is_empty() && *readme != MISSING_README)
            .ok_or_else(|| DomainError::not_found(format!("No README found for {}", spec)))?;

        Ok(Readme {
            package: spec.name.to_string(),
            version,
            markdown: markdown.to_string(),
            source: ReadmeSource::Registry,
        })
    }

    async fn from_cdn(&self, spec: &PackageSpec, version: &str) -> Result<Option<String>, DomainError> {
        for file in README_FILES {
            let url = format!("{}/npm/{}@{}/{}", self.cdn_url, spec.name, version, file);
            let request = FetchRequest::text(JSDELIVR_SERVICE, url);

            match self.upstream.fetch(&request).await {
                Ok(Value::String(markdown)) if !markdown.trim().is_empty() => {
                    return Ok(Some(markdown));
                }
                Ok(_) => {}
                Err(DomainError::NotFound { .. }) => {
                    debug!(package = %spec, file, "README variant not on CDN");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }
}
