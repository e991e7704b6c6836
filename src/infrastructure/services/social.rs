//! Package likes from the AT Protocol backlink index

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::{DomainError, PackageName};

pub const CONSTELLATION_SERVICE: &str = "constellation";

/// Record collection of package likes
pub const LIKE_COLLECTION: &str = "dev.npmx.feed.like";

/// Record field holding the liked subject
const LIKE_SUBJECT_PATH: &str = ".subject.uri";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLikes {
    pub package: String,
    pub total_likes: u64,
}

#[derive(Debug, Clone)]
pub struct LikesService {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl LikesService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            upstream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn likes(&self, name: &PackageName) -> Result<PackageLikes, DomainError> {
        let request = FetchRequest::json(
            CONSTELLATION_SERVICE,
            format!("{}/links/count", self.base_url),
        )
        .with_query("target", subject_uri(name))
        .with_query("collection", LIKE_COLLECTION)
        .with_query("path", LIKE_SUBJECT_PATH);

        let response = self.upstream.fetch(&request).await?;
        let total_likes = response.get("total").and_then(Value::as_u64).unwrap_or(0);

        Ok(PackageLikes {
            package: name.to_string(),
            total_likes,
        })
    }
}

/// Subject URI a like record points at
pub fn subject_uri(name: &PackageName) -> String {
    format!("https://npmx.dev/package/{}", name)
}
