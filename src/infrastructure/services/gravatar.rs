//! Gravatar avatar lookup

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::fetch::{FetchRequest, UpstreamClient};
use crate::domain::DomainError;

pub const GRAVATAR_SERVICE: &str = "gravatar";

const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gravatar {
    pub hash: String,
    pub url: String,
    pub exists: bool,
}

/// Trims and lowercases an email, rejecting obviously malformed input
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();

    let valid = email.len() <= MAX_EMAIL_LENGTH
        && !email.chars().any(char::is_whitespace)
        && matches!(email.split_once('@'), Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@'));

    if !valid {
        return Err(DomainError::validation("A valid email address is required"));
    }

    Ok(email)
}

/// SHA-256 hex digest of the normalized email
pub fn gravatar_hash(email: &str) -> Result<String, DomainError> {
    let email = normalize_email(email)?;
    Ok(hex::encode(Sha256::digest(email.as_bytes())))
}

#[derive(Debug, Clone)]
pub struct GravatarService {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl GravatarService {
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            upstream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Avatar URL for an email and whether a custom avatar exists
    pub async fn lookup(&self, email: &str) -> Result<Gravatar, DomainError> {
        let hash = gravatar_hash(email)?;
        let url = format!("{}/avatar/{}", self.base_url, hash);

        let request = FetchRequest::exists(GRAVATAR_SERVICE, url.clone()).with_query("d", "404");
        let exists = matches!(self.upstream.fetch(&request).await?, Value::Bool(true));

        Ok(Gravatar { hash, url, exists })
    }
}
