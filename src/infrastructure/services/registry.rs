//! npm registry access

use std::sync::Arc;

use serde_json::Value;

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::{DomainError, PackageName, PackageSpec};

pub const NPM_SERVICE: &str = "npm";

/// Reads packuments and version manifests from the npm registry
#[derive(Debug, Clone)]
pub struct RegistryService {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl RegistryService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            upstream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn packument_url(&self, name: &PackageName) -> String {
        format!("{}/{}", self.base_url, name.registry_path())
    }

    /// Full packument (all versions, dist-tags, readme)
    pub async fn packument(&self, name: &PackageName) -> Result<Value, DomainError> {
        let request = FetchRequest::json(NPM_SERVICE, self.packument_url(name))
            .with_header("accept", "application/json");

        self.upstream.fetch(&request).await
    }

    /// Manifest of the requested version, `latest` when none is given
    pub async fn manifest(&self, spec: &PackageSpec) -> Result<Value, DomainError> {
        let packument = self.packument(&spec.name).await?;
        let version = resolve_version(&packument, spec.version_str().unwrap_or("latest"))
            .ok_or_else(|| DomainError::not_found(format!("Version not found: {}", spec)))?;

        packument
            .get("versions")
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Version not found: {}", spec)))
    }
}

/// Resolves a dist-tag or exact version against a packument
pub fn resolve_version(packument: &Value, requested: &str) -> Option<String> {
    if let Some(tagged) = packument
        .get("dist-tags")
        .and_then(|tags| tags.get(requested))
        .and_then(Value::as_str)
    {
        return Some(tagged.to_string());
    }

    packument
        .get("versions")
        .and_then(|versions| versions.get(requested))
        .map(|_| requested.to_string())
}
