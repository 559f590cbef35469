//! Backend policies
//!
//! GitHub, GitLab and Gitea share one release/tag flow and differ only in
//! URL shapes, headers and response layout, captured by [`Forge`].
//! Packagist resolves versions from its package index instead.

pub mod gitea;
pub mod github;
pub mod gitlab;
pub mod packagist;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::auth::{Authentication, Credential};
use super::client::RepositoryClient;
use super::transport::HttpRequest;
use super::types::{Asset, ReleaseInfo};
use super::{is_latest, FetchOptions, RepositoryConfiguration, RepositoryResult, RepositoryType, ResultKind};
use crate::core::{NccError, NccResult};

static STATIC_ASSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(_static|-static)\.ncc$").expect("static asset pattern is valid"));

static PACKAGE_ASSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.ncc$").expect("package asset pattern is valid"));

/// How a tag archive URL is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagArchive {
    /// HEAD the URL and follow redirects; the final URL is the archive
    Redirect(String),
    /// GET the URL and read the archive link from the JSON body
    Json(String),
}

/// Per-forge request and response conventions
pub trait Forge: Send + Sync {
    /// Headers sent with every request
    fn headers(&self) -> &'static [(&'static str, &'static str)];

    /// Header carrying an access token
    fn token_header(&self, token: &str) -> (&'static str, String);

    fn tags_url(&self, base: &str, vendor: &str, project: &str) -> String;
    fn releases_url(&self, base: &str, vendor: &str, project: &str) -> String;
    fn release_url(&self, base: &str, vendor: &str, project: &str, tag: &str) -> String;
    fn tag_archive(&self, base: &str, vendor: &str, project: &str, tag: &str) -> TagArchive;

    /// Tag names, newest first
    fn tag_names(&self, body: Value) -> NccResult<Vec<String>>;

    /// Release tag names, newest first
    fn release_names(&self, body: Value) -> NccResult<Vec<String>>;

    fn release(&self, body: Value) -> NccResult<ReleaseInfo>;

    /// Archive link from a tag document, for [`TagArchive::Json`]
    fn archive_from_tag(&self, _body: Value) -> NccResult<Option<String>> {
        Ok(None)
    }
}

fn forge(repo_type: RepositoryType) -> Option<&'static dyn Forge> {
    let forge: &'static dyn Forge = match repo_type {
        RepositoryType::Github => &github::Github,
        RepositoryType::Gitlab => &gitlab::Gitlab,
        RepositoryType::Gitea => &gitea::Gitea,
        RepositoryType::Packagist => return None,
    };
    Some(forge)
}

pub(crate) async fn fetch_source_archive(
    client: &RepositoryClient,
    repository: &RepositoryConfiguration,
    vendor: &str,
    project: &str,
    version: &str,
    auth: Option<&Authentication>,
    _options: &FetchOptions,
) -> NccResult<RepositoryResult> {
    let Some(forge) = forge(repository.repo_type()) else {
        return packagist::fetch_source_archive(client, repository, vendor, project, version).await;
    };

    let flow = ForgeFlow {
        client,
        forge,
        base: repository.base_url(),
        vendor,
        project,
        auth,
    };

    match flow.release_archive(version).await {
        Ok(result) => Ok(result),
        Err(e) => {
            debug!(
                "No release archive for {}/{}={} ({}), trying tag archive",
                vendor, project, version, e
            );
            flow.tag_archive(version).await
        }
    }
}

pub(crate) async fn fetch_package(
    client: &RepositoryClient,
    repository: &RepositoryConfiguration,
    vendor: &str,
    project: &str,
    version: &str,
    auth: Option<&Authentication>,
    options: &FetchOptions,
) -> NccResult<RepositoryResult> {
    let Some(forge) = forge(repository.repo_type()) else {
        return Err(NccError::not_supported(format!(
            "{} repositories do not host ncc packages",
            repository.repo_type()
        )));
    };

    ForgeFlow {
        client,
        forge,
        base: repository.base_url(),
        vendor,
        project,
        auth,
    }
    .release_package(version, options.prefer_static)
    .await
}

/// Pick the package asset of a release
pub fn select_asset(assets: &[Asset], prefer_static: bool) -> Option<&Asset> {
    if prefer_static {
        if let Some(asset) = assets.iter().find(|a| STATIC_ASSET.is_match(&a.name)) {
            return Some(asset);
        }
    }
    assets.iter().find(|a| PACKAGE_ASSET.is_match(&a.name))
}

pub(crate) fn parse<T: DeserializeOwned>(body: Value) -> NccResult<T> {
    serde_json::from_value(body).map_err(|e| NccError::parse(format!("Unexpected response: {}", e)))
}

struct ForgeFlow<'a> {
    client: &'a RepositoryClient,
    forge: &'a dyn Forge,
    base: String,
    vendor: &'a str,
    project: &'a str,
    auth: Option<&'a Authentication>,
}

impl ForgeFlow<'_> {
    fn request(&self, request: HttpRequest) -> NccResult<HttpRequest> {
        let mut request = self
            .forge
            .headers()
            .iter()
            .fold(request, |r, (name, value)| r.header(*name, *value));

        if let Some(auth) = self.auth {
            request = match auth.credential()? {
                Credential::AccessToken(token) => {
                    let (name, value) = self.forge.token_header(token);
                    request.header(name, value)
                }
                Credential::UsernamePassword { username, password } => {
                    request.basic_auth(username, password)
                }
            };
        }
        Ok(request)
    }

    async fn get(&self, url: String) -> NccResult<Value> {
        let request = self.request(HttpRequest::get(url))?;
        self.client.get_json(&request).await
    }

    async fn latest_tag(&self) -> NccResult<String> {
        let body = self
            .get(self.forge.tags_url(&self.base, self.vendor, self.project))
            .await?;
        self.forge
            .tag_names(body)?
            .into_iter()
            .next()
            .ok_or_else(|| NccError::network(format!("No tags found for {}/{}", self.vendor, self.project)))
    }

    async fn latest_release(&self) -> NccResult<String> {
        let body = self
            .get(self.forge.releases_url(&self.base, self.vendor, self.project))
            .await?;
        self.forge
            .release_names(body)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NccError::network(format!("No releases found for {}/{}", self.vendor, self.project))
            })
    }

    async fn release(&self, version: &str) -> NccResult<ReleaseInfo> {
        let tag = if is_latest(version) {
            self.latest_release().await?
        } else {
            version.to_string()
        };
        let body = self
            .get(self.forge.release_url(&self.base, self.vendor, self.project, &tag))
            .await?;
        self.forge.release(body)
    }

    async fn release_archive(&self, version: &str) -> NccResult<RepositoryResult> {
        let release = self.release(version).await?;
        let url = release.archive_url.ok_or_else(|| {
            NccError::network(format!(
                "Release {} of {}/{} has no source archive",
                release.tag_name, self.vendor, self.project
            ))
        })?;
        Ok(RepositoryResult::new(url, ResultKind::SourceArchive, release.tag_name))
    }

    async fn release_package(&self, version: &str, prefer_static: bool) -> NccResult<RepositoryResult> {
        let release = self.release(version).await?;
        let asset = select_asset(&release.assets, prefer_static).ok_or_else(|| {
            NccError::network(format!(
                "Release {} of {}/{} has no ncc package asset",
                release.tag_name, self.vendor, self.project
            ))
        })?;
        Ok(RepositoryResult::new(
            asset.url.clone(),
            ResultKind::NccPackage,
            release.tag_name.clone(),
        ))
    }

    async fn tag_archive(&self, version: &str) -> NccResult<RepositoryResult> {
        let tag = if is_latest(version) {
            self.latest_tag().await?
        } else {
            version.to_string()
        };

        let url = match self
            .forge
            .tag_archive(&self.base, self.vendor, self.project, &tag)
        {
            TagArchive::Redirect(url) => {
                let request = self.request(HttpRequest::head(url))?;
                self.client.resolve_redirect(&request).await?
            }
            TagArchive::Json(url) => {
                let body = self.get(url).await?;
                self.forge.archive_from_tag(body)?.ok_or_else(|| {
                    NccError::network(format!(
                        "Tag {} of {}/{} has no source archive",
                        tag, self.vendor, self.project
                    ))
                })?
            }
        };

        Ok(RepositoryResult::new(url, ResultKind::SourceArchive, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(names: &[&str]) -> Vec<Asset> {
        names
            .iter()
            .map(|n| Asset {
                name: n.to_string(),
                url: format!("https://dl.example/{}", n),
            })
            .collect()
    }

    #[test]
    fn test_select_asset() {
        let list = assets(&["README.md", "lib.ncc", "lib_static.ncc"]);
        assert_eq!(select_asset(&list, false).unwrap().name, "lib.ncc");
        assert_eq!(select_asset(&list, true).unwrap().name, "lib_static.ncc");

        let dynamic_only = assets(&["lib.ncc"]);
        assert_eq!(select_asset(&dynamic_only, true).unwrap().name, "lib.ncc");

        assert!(select_asset(&assets(&["lib.zip"]), false).is_none());
        assert_eq!(
            select_asset(&assets(&["lib-static.ncc"]), true).unwrap().name,
            "lib-static.ncc"
        );
    }
}
