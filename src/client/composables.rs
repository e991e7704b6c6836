//! Typed data composables over [`ApiClient`]

use serde_json::Value;

use super::api_client::ApiClient;
use super::async_data::AsyncData;
use crate::domain::{PackageName, PackageSpec};
use crate::infrastructure::services::{ChangelogInfo, JsrPackageInfo, PackageLikes, Readme};

pub fn use_package(client: ApiClient, name: PackageName) -> AsyncData<PackageName, Value> {
    AsyncData::new(
        name,
        |name: &PackageName| format!("package:{}", name),
        move |name: PackageName| {
            let client = client.clone();
            async move { client.packument(&name).await }
        },
    )
}

pub fn use_readme(client: ApiClient, spec: PackageSpec) -> AsyncData<PackageSpec, Readme> {
    AsyncData::new(
        spec,
        |spec: &PackageSpec| format!("readme:{}", spec),
        move |spec: PackageSpec| {
            let client = client.clone();
            async move { client.readme(&spec).await }
        },
    )
}

pub fn use_changelog_info(
    client: ApiClient,
    spec: PackageSpec,
) -> AsyncData<PackageSpec, Option<ChangelogInfo>> {
    AsyncData::new(
        spec,
        |spec: &PackageSpec| format!("changelog:{}", spec),
        move |spec: PackageSpec| {
            let client = client.clone();
            async move { client.changelog_info(&spec).await }
        },
    )
}

pub fn use_jsr_info(client: ApiClient, name: PackageName) -> AsyncData<PackageName, JsrPackageInfo> {
    AsyncData::new(
        name,
        |name: &PackageName| format!("jsr:{}", name),
        move |name: PackageName| {
            let client = client.clone();
            async move { client.jsr_info(&name).await }
        },
    )
}

pub fn use_likes(client: ApiClient, name: PackageName) -> AsyncData<PackageName, PackageLikes> {
    AsyncData::new(
        name,
        |name: &PackageName| format!("likes:{}", name),
        move |name: PackageName| {
            let client = client.clone();
            async move { client.likes(&name).await }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_use_likes_follows_package() {
        let server = MockServer::start().await;

        for (pkg, total) in [("vue", 3), ("react", 7)] {
            Mock::given(path(format!("/api/social/likes/{}", pkg)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"package": pkg, "totalLikes": total})),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let likes = use_likes(client, PackageName::new("vue").unwrap());

        likes.refresh().await;
        assert_eq!(likes.state().data.map(|l| l.total_likes), Some(3));

        assert!(!likes.set_input(PackageName::new("vue").unwrap()).await);
        assert!(likes.set_input(PackageName::new("react").unwrap()).await);
        assert_eq!(likes.state().data.map(|l| l.total_likes), Some(7));
    }

    #[tokio::test]
    async fn test_use_readme_stale_hydration() {
        let server = MockServer::start().await;

        Mock::given(path("/api/registry/readme/vue/v/3.5.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-cache", "HIT")
                    .set_body_json(json!({
                        "package": "vue",
                        "version": "3.5.0",
                        "markdown": "# Fresh",
                        "source": "jsdelivr"
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let spec = PackageSpec::parse_path("vue/v/3.5.0").unwrap();
        let readme = use_readme(client, spec.clone());

        let hydrated = Readme {
            package: "vue".to_string(),
            version: Some("3.5.0".to_string()),
            markdown: "# Old".to_string(),
            source: crate::infrastructure::services::ReadmeSource::Jsdelivr,
        };
        readme.hydrate(spec, hydrated, true);

        assert!(readme.mounted().await);
        assert!(!readme.mounted().await);

        let state = readme.state();
        assert_eq!(state.data.map(|r| r.markdown).as_deref(), Some("# Fresh"));
        assert!(!state.is_stale);
    }

    #[test]
    fn test_keys_include_version() {
        let client = ApiClient::from_client(reqwest::Client::new(), "http://localhost");

        let latest = use_changelog_info(client.clone(), PackageSpec::parse_path("vue").unwrap());
        let pinned = use_changelog_info(client, PackageSpec::parse_path("vue/v/3.5.0").unwrap());

        assert_eq!(latest.key(), "changelog:vue");
        assert_eq!(pinned.key(), "changelog:vue@3.5.0");
    }
}
