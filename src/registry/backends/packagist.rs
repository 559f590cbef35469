//! Packagist package index

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::{NccError, NccResult};
use crate::registry::client::RepositoryClient;
use crate::registry::transport::HttpRequest;
use crate::registry::types::PackagistResponse;
use crate::registry::{is_latest, RepositoryConfiguration, RepositoryResult, ResultKind};
use crate::resolver::{parse_loose, satisfies};

static UNSTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-alpha|-beta|-rc|dev").expect("unstable version pattern is valid"));

/// Newest first: parseable versions by semver, then the rest in reverse lexical order
fn descending<S: AsRef<str>>(versions: &[S]) -> Vec<&str> {
    let mut keyed: Vec<(Option<semver::Version>, &str)> = versions
        .iter()
        .map(|v| (parse_loose(v.as_ref()), v.as_ref()))
        .collect();
    keyed.sort_by(|(left_version, left), (right_version, right)| {
        match (left_version, right_version) {
            (Some(l), Some(r)) => r.cmp(l).then_with(|| right.cmp(left)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => right.cmp(left),
        }
    });
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// Newest version that is not a pre-release or dev build
pub fn latest_stable<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    descending(versions)
        .into_iter()
        .find(|v| !UNSTABLE.is_match(v))
}

/// Newest version satisfying `constraint`; dev versions only when asked for
pub fn resolve_version<'a, S: AsRef<str>>(versions: &'a [S], constraint: &str) -> Option<&'a str> {
    let wants_dev = constraint.to_ascii_lowercase().contains("-dev");
    descending(versions).into_iter().find(|v| {
        if !wants_dev && v.to_ascii_lowercase().contains("-dev") {
            return false;
        }
        *v == constraint || satisfies(v, constraint)
    })
}

pub(crate) async fn fetch_source_archive(
    client: &RepositoryClient,
    repository: &RepositoryConfiguration,
    vendor: &str,
    project: &str,
    version: &str,
) -> NccResult<RepositoryResult> {
    let url = format!(
        "{}/packages/{}/{}.json",
        repository.base_url(),
        urlencoding::encode(vendor),
        urlencoding::encode(project)
    );
    let request = HttpRequest::get(url).header("Accept", "application/json");
    let response: PackagistResponse = client.get(&request).await?;

    let available: Vec<&str> = response
        .package
        .versions
        .keys()
        .map(String::as_str)
        .collect();

    let resolved = if is_latest(version) {
        latest_stable(&available[..]).ok_or_else(|| {
            NccError::network(format!("No stable version found for {}/{}", vendor, project))
        })?
    } else {
        resolve_version(&available[..], version).ok_or_else(|| {
            NccError::invalid_argument(format!(
                "Version {} for {}/{} does not exist",
                version, vendor, project
            ))
        })?
    };
    debug!("Resolved {}/{}={} to {}", vendor, project, version, resolved);

    let dist = response
        .package
        .versions
        .get(resolved)
        .and_then(|v| v.dist.as_ref())
        .ok_or_else(|| {
            NccError::network(format!(
                "Version {} of {}/{} has no dist URL",
                resolved, vendor, project
            ))
        })?;

    Ok(RepositoryResult::new(
        dist.url.clone(),
        ResultKind::SourceArchive,
        resolved,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::registry::client::tests::{mock_client, MockTransport};
    use crate::registry::{FetchOptions, RepositoryType};

    const INDEX: &str = "https://packagist.org/packages/monolog/monolog.json";

    fn packagist() -> RepositoryConfiguration {
        RepositoryConfiguration::new("packagist", RepositoryType::Packagist, "packagist.org", true)
    }

    fn index() -> serde_json::Value {
        json!({
            "package": {
                "name": "monolog/monolog",
                "versions": {
                    "1.0.0": {"dist": {"url": "https://dist/1.0.0.zip", "type": "zip"}},
                    "1.2.0": {"dist": {"url": "https://dist/1.2.0.zip", "type": "zip"}},
                    "2.0.0-rc1": {"dist": {"url": "https://dist/2.0.0-rc1.zip", "type": "zip"}},
                    "2.1.0-dev": {"dist": {"url": "https://dist/2.1.0-dev.zip", "type": "zip"}},
                    "dev-main": {"dist": {"url": "https://dist/main.zip", "type": "zip"}}
                }
            }
        })
    }

    #[test]
    fn test_latest_stable() {
        let versions = ["1.0.0", "1.1.0-beta", "1.2.0", "2.0.0-rc1"];
        assert_eq!(latest_stable(&versions), Some("1.2.0"));
        assert_eq!(latest_stable(&["dev-main", "1.0.0-ALPHA"]), None);
    }

    #[test]
    fn test_descending_is_consistent_for_mixed_versions() {
        let versions = ["1.0.0_b", "1.0.0-beta", "1.0.0", "dev-main", "v1.0.0"];
        assert_eq!(
            descending(&versions),
            vec!["v1.0.0", "1.0.0", "1.0.0-beta", "dev-main", "1.0.0_b"]
        );

        let mut many: Vec<String> = (0..200)
            .flat_map(|i| {
                vec![
                    format!("1.{}.0", i % 7),
                    format!("1.{}.0-beta", i % 5),
                    format!("1.{}.0_b{}", i % 3, i),
                ]
            })
            .collect();
        let forward = descending(&many).into_iter().map(str::to_string).collect::<Vec<_>>();
        many.reverse();
        let backward = descending(&many).into_iter().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(forward, backward);
        assert_eq!(forward[0], "1.6.0");
    }

    #[test]
    fn test_resolve_version_skips_dev() {
        let versions = ["1.0.0", "1.2.0", "2.1.0-dev"];
        assert_eq!(resolve_version(&versions, "^1.0"), Some("1.2.0"));
        assert_eq!(resolve_version(&versions, ">=1.0"), Some("1.2.0"));
        assert_eq!(resolve_version(&versions, "2.1.0-dev"), Some("2.1.0-dev"));
        assert_eq!(resolve_version(&versions, "^3.0"), None);
    }

    #[tokio::test]
    async fn test_latest_source_archive() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(INDEX, 200, index());
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&packagist(), "monolog", "monolog", "latest", None, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.version, "1.2.0");
        assert_eq!(result.url, "https://dist/1.2.0.zip");
        assert_eq!(result.kind, ResultKind::SourceArchive);
    }

    #[tokio::test]
    async fn test_unknown_constraint_is_invalid_argument() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(INDEX, 200, index());
        let client = mock_client(&transport);

        let result = client
            .fetch_source_archive(&packagist(), "monolog", "monolog", "^9.0", None, &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(NccError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_packages_are_not_supported() {
        let transport = Arc::new(MockTransport::default());
        let client = mock_client(&transport);

        let result = client
            .fetch_package(&packagist(), "monolog", "monolog", "latest", None, &FetchOptions::default())
            .await;
        assert!(matches!(result, Err(NccError::NotSupported(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_index_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/packages/monolog/monolog.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(index().to_string())
            .create_async()
            .await;

        let host = server.host_with_port();
        let repository = RepositoryConfiguration::new("local", RepositoryType::Packagist, &host, false);
        let transport = Arc::new(
            crate::registry::ReqwestTransport::new(std::time::Duration::from_secs(5), "ncc-test").unwrap(),
        );
        let client = RepositoryClient::new(transport, Arc::new(crate::cache::RuntimeCache::new()));

        let result = client
            .fetch_source_archive(&repository, "monolog", "monolog", "1.0.0", None, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.url, "https://dist/1.0.0.zip");
    }
}
