//! Outbound fetch request description

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::cache::CacheKeyParams;

/// How the upstream response body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFormat {
    /// Parse the body as JSON
    #[default]
    Json,
    /// Keep the body as text, wrapped in a JSON string
    Text,
    /// Only check that the resource exists; yields a JSON boolean
    Exists,
}

/// An outbound HTTP GET against an external service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Service label used in errors, logs and metrics (e.g. "npm")
    pub service: String,
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub format: FetchFormat,
}

impl FetchRequest {
    pub fn new(service: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            url: url.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            format: FetchFormat::Json,
        }
    }

    pub fn json(service: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(service, url)
    }

    pub fn text(service: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(service, url).with_format(FetchFormat::Text)
    }

    pub fn exists(service: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(service, url).with_format(FetchFormat::Exists)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_format(mut self, format: FetchFormat) -> Self {
        self.format = format;
        self
    }

    /// Key parameters for this request: URL plus query, tagged with format
    ///
    /// Headers are not part of the key.
    pub fn key_params(&self) -> CacheKeyParams {
        let params = CacheKeyParams::from_url(&self.url, &self.query);

        match self.format {
            FetchFormat::Json => params,
            FetchFormat::Text => params.with_component("~format", "text"),
            FetchFormat::Exists => params.with_component("~format", "exists"),
        }
    }
}
