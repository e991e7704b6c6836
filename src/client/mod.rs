//! Client data layer - API client and reactive composables

mod api_client;
mod async_data;
mod composables;

pub use api_client::{API_SERVICE, ApiClient};
pub use async_data::{AsyncData, AsyncState};
pub use composables::{use_changelog_info, use_jsr_info, use_likes, use_package, use_readme};
