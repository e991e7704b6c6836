//! JSR (jsr.io) publication lookup

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::{DomainError, PackageName};

pub const JSR_SERVICE: &str = "jsr";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsrPackageInfo {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

impl JsrPackageInfo {
    pub fn missing() -> Self {
        Self {
            exists: false,
            url: None,
            latest_version: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsrService {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl JsrService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            upstream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Whether the npm package is also published on JSR under the same name.
    ///
    /// JSR only hosts scoped packages, so unscoped names are answered
    /// without a request.
    pub async fn info(&self, name: &PackageName) -> Result<JsrPackageInfo, DomainError> {
        let Some(scope) = name.scope() else {
            return Ok(JsrPackageInfo::missing());
        };

        let package_url = format!("{}/@{}/{}", self.base_url, scope, name.bare_name());
        let request = FetchRequest::json(JSR_SERVICE, format!("{}/meta.json", package_url));

        match self.upstream.fetch(&request).await {
            Ok(meta) => Ok(JsrPackageInfo {
                exists: true,
                url: Some(package_url),
                latest_version: meta.get("latest").and_then(Value::as_str).map(str::to_string),
            }),
            Err(DomainError::NotFound { .. }) => Ok(JsrPackageInfo::missing()),
            Err(e) => Err(e),
        }
    }
}
