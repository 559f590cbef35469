//! GitLab REST API (v4)

use serde_json::Value;

use super::{parse, Forge, TagArchive};
use crate::core::NccResult;
use crate::registry::types::{GitlabRelease, GitlabTag, ReleaseInfo};

pub struct Gitlab;

/// URL-encoded `vendor/project` id; dots in the project name become path separators
pub fn project_id(vendor: &str, project: &str) -> String {
    format!("{}%2F{}", vendor, urlencoding::encode(&project.replace('.', "/")))
}

fn project_url(base: &str, vendor: &str, project: &str) -> String {
    format!("{}/api/v4/projects/{}", base, project_id(vendor, project))
}

impl Forge for Gitlab {
    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[("Accept", "application/json")]
    }

    fn token_header(&self, token: &str) -> (&'static str, String) {
        ("Private-Token", token.to_string())
    }

    fn tags_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!(
            "{}/repository/tags?order_by=updated&sort=desc",
            project_url(base, vendor, project)
        )
    }

    fn releases_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!(
            "{}/releases?order_by=released_at&sort=desc",
            project_url(base, vendor, project)
        )
    }

    fn release_url(&self, base: &str, vendor: &str, project: &str, tag: &str) -> String {
        format!(
            "{}/releases/{}",
            project_url(base, vendor, project),
            urlencoding::encode(tag)
        )
    }

    fn tag_archive(&self, base: &str, vendor: &str, project: &str, tag: &str) -> TagArchive {
        TagArchive::Redirect(format!(
            "{}/repository/archive.zip?sha={}",
            project_url(base, vendor, project),
            urlencoding::encode(tag)
        ))
    }

    /// Only tags with a release are listed
    fn tag_names(&self, body: Value) -> NccResult<Vec<String>> {
        let tags: Vec<GitlabTag> = parse(body)?;
        Ok(tags
            .into_iter()
            .filter_map(|t| t.release.map(|r| r.tag_name))
            .collect())
    }

    fn release_names(&self, body: Value) -> NccResult<Vec<String>> {
        let releases: Vec<GitlabRelease> = parse(body)?;
        Ok(releases.into_iter().map(|r| r.tag_name).collect())
    }

    fn release(&self, body: Value) -> NccResult<ReleaseInfo> {
        parse::<GitlabRelease>(body).map(ReleaseInfo::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::core::NccError;
    use crate::registry::client::tests::{mock_client, MockTransport};
    use crate::registry::{
        Authentication, FetchOptions, RepositoryConfiguration, RepositoryType, ResultKind,
    };

    const API: &str = "https://gitlab.com/api/v4/projects/nosial%2Flibs%2Fconfig";

    fn gitlab() -> RepositoryConfiguration {
        RepositoryConfiguration::new("gitlab", RepositoryType::Gitlab, "gitlab.com", true)
    }

    #[test]
    fn test_project_id() {
        assert_eq!(project_id("nosial", "libs.config"), "nosial%2Flibs%2Fconfig");
        assert_eq!(project_id("nosial", "ncc"), "nosial%2Fncc");
    }

    #[tokio::test]
    async fn test_release_archive_prefers_zip() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases?order_by=released_at&sort=desc", API),
            200,
            json!([{"tag_name": "v1.2.0"}]),
        );
        transport.respond(
            &format!("{}/releases/v1.2.0", API),
            200,
            json!({
                "tag_name": "v1.2.0",
                "assets": {
                    "sources": [
                        {"format": "tar", "url": "https://gitlab.com/a.tar"},
                        {"format": "zip", "url": "https://gitlab.com/a.zip"}
                    ],
                    "links": []
                }
            }),
        );
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&gitlab(), "nosial", "libs.config", "latest", None, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.url, "https://gitlab.com/a.zip");
        assert_eq!(result.version, "v1.2.0");
    }

    #[tokio::test]
    async fn test_tag_archive_uses_released_tags() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases?order_by=released_at&sort=desc", API),
            200,
            json!([]),
        );
        transport.respond(
            &format!("{}/repository/tags?order_by=updated&sort=desc", API),
            200,
            json!([
                {"name": "wip", "release": null},
                {"name": "v1.0.0", "release": {"tag_name": "v1.0.0"}}
            ]),
        );
        transport.redirect(
            &format!("{}/repository/archive.zip?sha=v1.0.0", API),
            "https://gitlab.com/nosial/libs/config/-/archive/v1.0.0/config-v1.0.0.zip",
        );
        let client = mock_client(&transport);
        let auth = Authentication::access_token("glpat");

        let result = client
            .fetch_source_archive(&gitlab(), "nosial", "libs.config", "latest", Some(&auth), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.kind, ResultKind::SourceArchive);
        assert_eq!(result.version, "v1.0.0");
        assert!(result.url.ends_with("config-v1.0.0.zip"));

        let requests = transport.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.header_value("Private-Token") == Some("glpat")));
    }

    #[tokio::test]
    async fn test_package_from_asset_links() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases/v2.0.0", API),
            200,
            json!({
                "tag_name": "v2.0.0",
                "assets": {
                    "links": [{"name": "config.ncc", "url": "https://gitlab.com/l", "direct_asset_url": "https://gitlab.com/d"}]
                }
            }),
        );
        let client = mock_client(&transport);

        let result = client
            .fetch_package(&gitlab(), "nosial", "libs.config", "v2.0.0", None, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.url, "https://gitlab.com/d");
        assert_eq!(result.kind, ResultKind::NccPackage);
    }

    #[tokio::test]
    async fn test_forbidden_is_an_authentication_error() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(&format!("{}/releases/v2.0.0", API), 403, json!({}));
        let client = mock_client(&transport);

        let result = client
            .fetch_package(&gitlab(), "nosial", "libs.config", "v2.0.0", None, &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(NccError::Authentication(_))));
    }
}
