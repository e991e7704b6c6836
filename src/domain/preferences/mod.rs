//! User preferences domain

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::session::Did;

/// Accent colors offered by the UI palette
pub const ACCENT_COLORS: &[&str] = &["coral", "amber", "emerald", "sky", "violet", "magenta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
    Deno,
    Vlt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Npm,
    Algolia,
}

/// Per-user settings synced across devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub color_mode: ColorMode,
    pub accent_color_id: Option<String>,
    pub relative_dates: bool,
    pub include_types_in_install: bool,
    pub hide_platform_packages: bool,
    pub code_wrap: bool,
    pub package_manager: PackageManager,
    pub search_provider: SearchProvider,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::System,
            accent_color_id: None,
            relative_dates: false,
            include_types_in_install: true,
            hide_platform_packages: true,
            code_wrap: false,
            package_manager: PackageManager::Npm,
            search_provider: SearchProvider::Npm,
            updated_at: None,
        }
    }
}

impl UserPreferences {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(accent) = &self.accent_color_id {
            if !ACCENT_COLORS.contains(&accent.as_str()) {
                return Err(DomainError::validation(format!(
                    "Unknown accent color '{}'. Valid colors: {}",
                    accent,
                    ACCENT_COLORS.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Returns a copy stamped with the given update time
    pub fn touched(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// Storage for user preferences, keyed by the user's DID
#[async_trait]
pub trait PreferencesStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, did: &Did) -> Result<Option<UserPreferences>, DomainError>;

    async fn save(&self, did: &Did, preferences: &UserPreferences) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"colorMode":"dark","packageManager":"pnpm"}"#).unwrap();

        assert_eq!(prefs.color_mode, ColorMode::Dark);
        assert_eq!(prefs.package_manager, PackageManager::Pnpm);
        assert!(prefs.include_types_in_install);
        assert!(prefs.accent_color_id.is_none());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: Result<UserPreferences, _> =
            serde_json::from_str(r#"{"packageManager":"cargo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accent_color() {
        let mut prefs = UserPreferences {
            accent_color_id: Some("sky".to_string()),
            ..Default::default()
        };
        assert!(prefs.validate().is_ok());

        prefs.accent_color_id = Some("chartreuse".to_string());
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn test_serialization_is_camel_case() {
        let json = serde_json::to_value(UserPreferences::default()).unwrap();

        assert_eq!(json["colorMode"], "system");
        assert_eq!(json["includeTypesInInstall"], true);
        assert_eq!(json["searchProvider"], "npm");
    }
}
