//! AT Protocol session domain
//!
//! Sessions are created by the OAuth sign-in flow and only stored here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Decentralized identifier of an AT Protocol account (`did:plc:...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    pub fn new(did: impl AsRef<str>) -> Result<Self, DomainError> {
        let did = did.as_ref().trim();
        let mut parts = did.splitn(3, ':');

        let valid = parts.next() == Some("did")
            && parts
                .next()
                .is_some_and(|method| !method.is_empty() && method.chars().all(|c| c.is_ascii_lowercase()))
            && parts.next().is_some_and(|id| {
                !id.is_empty()
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-'))
            });

        if !valid {
            return Err(DomainError::validation(format!("Invalid DID: '{}'", did)));
        }

        Ok(Self(did.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(value: Did) -> Self {
        value.0
    }
}

/// Signed-in user session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub did: Did,
    /// Handle, lowercased (handles are case-insensitive)
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, did: Did, handle: impl AsRef<str>) -> Self {
        Self {
            id: id.into(),
            did,
            handle: handle.as_ref().trim().to_lowercase(),
            created_at: Utc::now(),
        }
    }
}

/// Storage for sessions, keyed by session id
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: &str) -> Result<Option<Session>, DomainError>;

    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
}
