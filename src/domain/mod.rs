//! Domain layer - Core types, traits and rules

pub mod cache;
pub mod error;
pub mod fetch;
pub mod package;
pub mod preferences;
pub mod session;

pub use cache::{Cache, CacheEntry, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use error::DomainError;
pub use fetch::{
    AbortController, AbortSignal, CacheStatus, FetchFormat, FetchPolicy, FetchRequest,
    FetchResult, UpstreamClient,
};
pub use package::{PackageName, PackageSpec, PackageVersion};
pub use preferences::{PreferencesStore, UserPreferences};
pub use session::{Did, Session, SessionStore};
