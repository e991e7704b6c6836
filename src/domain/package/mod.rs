//! npm package identifiers

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const MAX_NAME_LENGTH: usize = 214;
const MAX_VERSION_LENGTH: usize = 256;

// Mixed case is accepted for packages published before the lowercase rule.
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@[A-Za-z0-9\-~][A-Za-z0-9\-._~]*/)?[A-Za-z0-9\-~][A-Za-z0-9\-._~]*$")
        .expect("valid package name regex")
});

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.+\-_]*$").expect("valid version regex"));

/// Validated npm package name (scoped or unscoped)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Creates a package name, trimming whitespace and trailing slashes
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainError> {
        let name = name.as_ref().trim().trim_matches('/');

        if name.is_empty() {
            return Err(DomainError::validation("Package name cannot be empty"));
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Package name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }

        if !NAME_PATTERN.is_match(name) {
            return Err(DomainError::validation(format!(
                "Invalid package name: '{}'",
                name
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scope without the leading `@`, if any
    pub fn scope(&self) -> Option<&str> {
        self.0
            .strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
            .map(|(scope, _)| scope)
    }

    /// Name without its scope
    pub fn bare_name(&self) -> &str {
        match self.0.split_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scope().is_some()
    }

    /// Path segment for the npm registry (`@scope%2Fname` for scoped packages)
    pub fn registry_path(&self) -> String {
        self.0.replace('/', "%2F")
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(value: PackageName) -> Self {
        value.0
    }
}

/// Validated version or dist-tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageVersion(String);

impl PackageVersion {
    pub fn new(version: impl AsRef<str>) -> Result<Self, DomainError> {
        let version = version.as_ref().trim().trim_matches('/');

        if version.is_empty() {
            return Err(DomainError::validation("Version cannot be empty"));
        }

        if version.len() > MAX_VERSION_LENGTH || !VERSION_PATTERN.is_match(version) {
            return Err(DomainError::validation(format!(
                "Invalid version: '{}'",
                version
            )));
        }

        Ok(Self(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dist-tags are anything that does not start with a digit
    pub fn is_dist_tag(&self) -> bool {
        !self.0.starts_with(|c: char| c.is_ascii_digit())
    }
}

impl std::fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Package name with an optional version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub name: PackageName,
    pub version: Option<PackageVersion>,
}

impl PackageSpec {
    pub fn new(name: PackageName, version: Option<PackageVersion>) -> Self {
        Self { name, version }
    }

    /// Parses a route tail of the form `name[/v/version]`
    ///
    /// Both `@scope/name/v/1.0.0` and `name/v/1.0.0/` are accepted.
    pub fn parse_path(path: &str) -> Result<Self, DomainError> {
        let path = path.trim().trim_matches('/');

        match path.rsplit_once("/v/") {
            Some((name, version)) => Ok(Self {
                name: PackageName::new(name)?,
                version: Some(PackageVersion::new(version)?),
            }),
            None => Ok(Self {
                name: PackageName::new(path)?,
                version: None,
            }),
        }
    }

    pub fn version_str(&self) -> Option<&str> {
        self.version.as_ref().map(PackageVersion::as_str)
    }
}

impl std::fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
