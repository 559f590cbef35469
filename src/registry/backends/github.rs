//! GitHub REST API

use serde_json::Value;

use super::{parse, Forge, TagArchive};
use crate::core::NccResult;
use crate::registry::types::{Release, ReleaseInfo, TagEntry};

pub struct Github;

impl Forge for Github {
    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", "2022-11-28"),
        ]
    }

    fn token_header(&self, token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }

    fn tags_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!("{}/repos/{}/{}/tags", base, vendor, project)
    }

    fn releases_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!("{}/repos/{}/{}/releases", base, vendor, project)
    }

    fn release_url(&self, base: &str, vendor: &str, project: &str, tag: &str) -> String {
        format!("{}/repos/{}/{}/releases/tags/{}", base, vendor, project, tag)
    }

    fn tag_archive(&self, base: &str, vendor: &str, project: &str, tag: &str) -> TagArchive {
        TagArchive::Redirect(format!(
            "{}/repos/{}/{}/zipball/refs/tags/{}",
            base, vendor, project, tag
        ))
    }

    fn tag_names(&self, body: Value) -> NccResult<Vec<String>> {
        let tags: Vec<TagEntry> = parse(body)?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    fn release_names(&self, body: Value) -> NccResult<Vec<String>> {
        let releases: Vec<Release> = parse(body)?;
        Ok(releases.into_iter().map(|r| r.tag_name).collect())
    }

    fn release(&self, body: Value) -> NccResult<ReleaseInfo> {
        parse::<Release>(body).map(ReleaseInfo::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::core::NccError;
    use crate::registry::client::tests::{mock_client, MockTransport};
    use crate::registry::{
        Authentication, FetchOptions, RepositoryConfiguration, RepositoryType, ResultKind,
    };

    const API: &str = "https://api.github.com/repos/nosial/libs";

    fn github() -> RepositoryConfiguration {
        RepositoryConfiguration::new("github", RepositoryType::Github, "api.github.com", true)
    }

    #[tokio::test]
    async fn test_unreachable_host_is_tried_three_times() {
        let transport = Arc::new(MockTransport::default());
        let client = mock_client(&transport);

        let result = client
            .fetch_package(&github(), "nosial", "libs", "latest", None, &FetchOptions::default())
            .await;

        assert!(matches!(result, Err(NccError::Network(_))));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_latest_source_archive_falls_back_to_tags() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(&format!("{}/releases", API), 404, json!({"message": "Not Found"}));
        transport.respond(
            &format!("{}/tags", API),
            200,
            json!([{"name": "v2.0.0"}, {"name": "v1.0.0"}]),
        );
        transport.redirect(
            &format!("{}/zipball/refs/tags/v2.0.0", API),
            "https://codeload.github.com/nosial/libs/legacy.zip/refs/tags/v2.0.0",
        );
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&github(), "nosial", "libs", "latest", None, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.version, "v2.0.0");
        assert_eq!(result.kind, ResultKind::SourceArchive);
        assert_eq!(
            result.url,
            "https://codeload.github.com/nosial/libs/legacy.zip/refs/tags/v2.0.0"
        );
    }

    #[tokio::test]
    async fn test_release_archive_is_preferred() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases/tags/v1.0.0", API),
            200,
            json!({"tag_name": "v1.0.0", "zipball_url": "https://api.github.com/zip/v1.0.0", "assets": []}),
        );
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&github(), "nosial", "libs", "v1.0.0", None, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.url, "https://api.github.com/zip/v1.0.0");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_package_with_token() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases", API),
            200,
            json!([{"tag_name": "v1.1.0"}, {"tag_name": "v1.0.0"}]),
        );
        transport.respond(
            &format!("{}/releases/tags/v1.1.0", API),
            200,
            json!({
                "tag_name": "v1.1.0",
                "assets": [
                    {"name": "libs.ncc", "browser_download_url": "https://dl/libs.ncc"},
                    {"name": "libs_static.ncc", "browser_download_url": "https://dl/libs_static.ncc"}
                ]
            }),
        );
        let client = mock_client(&transport);
        let auth = Authentication::access_token("ghp_secret");

        let result = client
            .fetch_package(
                &github(),
                "nosial",
                "libs",
                "latest",
                Some(&auth),
                &FetchOptions { prefer_static: true },
            )
            .await
            .unwrap();

        assert_eq!(result.kind, ResultKind::NccPackage);
        assert_eq!(result.url, "https://dl/libs_static.ncc");
        assert_eq!(result.version, "v1.1.0");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].header_value("Authorization"), Some("Bearer ghp_secret"));
        assert_eq!(requests[0].header_value("Accept"), Some("application/vnd.github+json"));
        assert_eq!(requests[0].header_value("X-GitHub-Api-Version"), Some("2022-11-28"));
    }

    #[tokio::test]
    async fn test_release_without_package_asset() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases/tags/v1.0.0", API),
            200,
            json!({"tag_name": "v1.0.0", "assets": [{"name": "notes.txt", "browser_download_url": "https://dl/notes.txt"}]}),
        );
        let client = mock_client(&transport);

        let result = client
            .fetch_package(&github(), "nosial", "libs", "v1.0.0", None, &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(NccError::Network(_))));
    }
}
