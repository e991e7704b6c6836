//! Upstream services and cache-backed stores

mod changelog;
mod gravatar;
mod jsr;
mod preferences;
mod readme;
mod registry;
mod sessions;
mod social;

pub use changelog::{ChangelogInfo, ChangelogService, ChangelogServiceConfig, github_repo};
pub use gravatar::{Gravatar, GravatarService, gravatar_hash, normalize_email};
pub use jsr::{JsrPackageInfo, JsrService};
pub use preferences::CachePreferencesStore;
pub use readme::{Readme, ReadmeService, ReadmeSource};
pub use registry::{RegistryService, resolve_version};
pub use sessions::CacheSessionStore;
pub use social::{LikesService, PackageLikes, subject_uri};
