//! Gitea REST API (v1)

use serde_json::Value;

use super::{parse, Forge, TagArchive};
use crate::core::NccResult;
use crate::registry::types::{Release, ReleaseInfo, TagEntry};

pub struct Gitea;

fn repo_url(base: &str, vendor: &str, project: &str) -> String {
    format!(
        "{}/api/v1/repos/{}/{}",
        base,
        urlencoding::encode(vendor),
        urlencoding::encode(project)
    )
}

impl Forge for Gitea {
    fn headers(&self) -> &'static [(&'static str, &'static str)] {
        &[("Accept", "application/json")]
    }

    fn token_header(&self, token: &str) -> (&'static str, String) {
        ("Authorization", format!("token {}", token))
    }

    fn tags_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!("{}/tags", repo_url(base, vendor, project))
    }

    fn releases_url(&self, base: &str, vendor: &str, project: &str) -> String {
        format!("{}/releases", repo_url(base, vendor, project))
    }

    fn release_url(&self, base: &str, vendor: &str, project: &str, tag: &str) -> String {
        format!(
            "{}/releases/tags/{}",
            repo_url(base, vendor, project),
            urlencoding::encode(tag)
        )
    }

    fn tag_archive(&self, base: &str, vendor: &str, project: &str, tag: &str) -> TagArchive {
        TagArchive::Json(format!(
            "{}/tags/{}",
            repo_url(base, vendor, project),
            urlencoding::encode(tag)
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

    fn archive_from_tag(&self, body: Value) -> NccResult<Option<String>> {
        let tag: TagEntry = parse(body)?;
        Ok(tag.zipball_url.or(tag.tarball_url))
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

    const API: &str = "https://gitea.com/api/v1/repos/nosial/net%20utils";

    fn gitea() -> RepositoryConfiguration {
        RepositoryConfiguration::new("gitea", RepositoryType::Gitea, "gitea.com", true)
    }

    #[tokio::test]
    async fn test_tag_archive_reads_tag_document() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/tags", API),
            200,
            json!([{"name": "1.0.1"}, {"name": "1.0.0"}]),
        );
        transport.respond(
            &format!("{}/tags/1.0.1", API),
            200,
            json!({"name": "1.0.1", "tarball_url": "https://gitea.com/archive/1.0.1.tar.gz"}),
        );
        let client = mock_client(&transport);
        let auth = Authentication::username_password("user", "pass");

        let result = client
            .fetch_source_archive(&gitea(), "nosial", "net utils", "latest", Some(&auth), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.url, "https://gitea.com/archive/1.0.1.tar.gz");
        assert_eq!(result.version, "1.0.1");
        assert_eq!(result.kind, ResultKind::SourceArchive);

        let requests = transport.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.basic_auth, Some(("user".to_string(), "pass".to_string())));
    }

    #[tokio::test]
    async fn test_token_header() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(
            &format!("{}/releases/tags/1.0.0", API),
            200,
            json!({"tag_name": "1.0.0", "assets": [{"name": "net.ncc", "browser_download_url": "https://gitea.com/net.ncc"}]}),
        );
        let client = mock_client(&transport);
        let auth = Authentication::access_token("abc");

        let result = client
            .fetch_package(&gitea(), "nosial", "net utils", "1.0.0", Some(&auth), &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.url, "https://gitea.com/net.ncc");
        assert_eq!(
            transport.requests.lock().unwrap()[0].header_value("Authorization"),
            Some("token abc")
        );
    }

    #[tokio::test]
    async fn test_empty_tag_list_is_a_network_error() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(&format!("{}/releases", API), 200, json!([]));
        transport.respond(&format!("{}/tags", API), 200, json!([]));
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&gitea(), "nosial", "net utils", "latest", None, &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(NccError::Network(msg)) if msg.contains("No tags")));
    }
}
