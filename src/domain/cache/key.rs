//! Cache key generation strategies

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Version tag embedded in every generated key.
///
/// Bump when the shape of cached payloads changes so old entries are
/// never deserialized into the new shape.
pub const CACHE_VERSION: &str = "v1";

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + std::fmt::Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;

    /// Generates a versioned key with a namespace prefix
    fn generate_with_namespace(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}:{}", namespace, CACHE_VERSION, self.generate(params))
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeyParams {
    /// Primary identifier (e.g., resolved URL, package name)
    pub primary: String,
    /// Secondary components (sorted for consistency)
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    /// Creates new cache key parameters with a normalized primary identifier
    pub fn new(primary: impl AsRef<str>) -> Self {
        Self {
            primary: normalize_segment(primary.as_ref()),
            components: BTreeMap::new(),
        }
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.components
            .insert(key.into(), normalize_segment(value.as_ref()));
        self
    }

    /// Adds a component only when a value is present
    pub fn with_optional_component(
        self,
        key: impl Into<String>,
        value: Option<impl AsRef<str>>,
    ) -> Self {
        match value {
            Some(value) => self.with_component(key, value),
            None => self,
        }
    }

    /// Builds parameters for a URL plus explicit query parameters.
    ///
    /// Query parameters embedded in the URL and the explicit ones are merged
    /// and sorted, so `?b=2&a=1` and `?a=1&b=2` produce the same key.
    pub fn from_url<'a, I>(url: &str, query: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let url = url.trim();
        let (base, inline_query) = match url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (url, None),
        };

        let mut params = Self::new(base);

        if let Some(inline_query) = inline_query {
            for pair in inline_query.split('&').filter(|p| !p.is_empty()) {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                params = params.with_component(k, v);
            }
        }

        for (k, v) in query {
            params = params.with_component(k.clone(), v);
        }

        params
    }
}

/// Trims whitespace and strips trailing slashes.
///
/// A lone `/` is kept so the root path still produces a non-empty key.
pub fn normalize_segment(value: &str) -> String {
    let trimmed = value.trim();
    let stripped = trimmed.trim_end_matches('/');

    if stripped.is_empty() && !trimmed.is_empty() {
        "/".to_string()
    } else {
        stripped.to_string()
    }
}

/// Default cache key generator
///
/// Hashes use SHA-256 so keys are identical across processes sharing a
/// remote cache.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyGenerator {
    /// Whether to use short hash keys (16 chars) or full keys
    use_short_hash: bool,
}

impl DefaultKeyGenerator {
    /// Creates a new default key generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that produces short hash keys
    pub fn with_short_hash(mut self) -> Self {
        self.use_short_hash = true;
        self
    }

    fn hash_string(input: &str) -> String {
        let digest = Sha256::digest(input.as_bytes());
        hex::encode(&digest[..8])
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let mut parts = vec![params.primary.clone()];

        for (k, v) in &params.components {
            parts.push(format!("{}={}", k, v));
        }

        let combined = parts.join(":");

        if self.use_short_hash {
            Self::hash_string(&combined)
        } else {
            combined
        }
    }
}
