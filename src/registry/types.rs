//! Repository API response types

use std::collections::BTreeMap;

use serde::Deserialize;

/// GitHub/Gitea tag list entry
#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,

    #[serde(default)]
    pub zipball_url: Option<String>,

    #[serde(default)]
    pub tarball_url: Option<String>,
}

/// GitHub/Gitea release
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,

    #[serde(default)]
    pub zipball_url: Option<String>,

    #[serde(default)]
    pub tarball_url: Option<String>,

    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// GitLab tag list entry; only tags with a release carry `release.tag_name`
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabTag {
    pub name: String,

    #[serde(default)]
    pub release: Option<GitlabTagRelease>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabTagRelease {
    pub tag_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabRelease {
    pub tag_name: String,

    #[serde(default)]
    pub assets: GitlabAssets,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitlabAssets {
    #[serde(default)]
    pub links: Vec<GitlabLink>,

    #[serde(default)]
    pub sources: Vec<GitlabSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabLink {
    pub name: String,
    pub url: String,

    #[serde(default)]
    pub direct_asset_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitlabSource {
    pub format: String,
    pub url: String,
}

/// `/packages/{vendor}/{project}.json`
#[derive(Debug, Clone, Deserialize)]
pub struct PackagistResponse {
    pub package: PackagistPackage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackagistPackage {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub versions: BTreeMap<String, PackagistVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackagistVersion {
    #[serde(default)]
    pub dist: Option<PackagistDist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackagistDist {
    pub url: String,

    #[serde(default, rename = "type")]
    pub dist_type: Option<String>,
}

/// Release normalized across forges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub assets: Vec<Asset>,
    pub archive_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub url: String,
}

impl From<Release> for ReleaseInfo {
    fn from(release: Release) -> Self {
        Self {
            tag_name: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| Asset {
                    name: a.name,
                    url: a.browser_download_url,
                })
                .collect(),
            archive_url: release.zipball_url.or(release.tarball_url),
        }
    }
}

impl From<GitlabRelease> for ReleaseInfo {
    fn from(release: GitlabRelease) -> Self {
        let sources = &release.assets.sources;
        let archive_url = sources
            .iter()
            .find(|s| s.format == "zip")
            .or_else(|| sources.iter().find(|s| s.format == "tar"))
            .map(|s| s.url.clone());

        Self {
            tag_name: release.tag_name,
            assets: release
                .assets
                .links
                .into_iter()
                .map(|l| Asset {
                    name: l.name,
                    url: l.direct_asset_url.unwrap_or(l.url),
                })
                .collect(),
            archive_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_github_release_prefers_zipball() {
        let release: Release = serde_json::from_value(json!({
            "tag_name": "v1.0.0",
            "zipball_url": "https://example.com/zip",
            "tarball_url": "https://example.com/tar",
            "assets": [{"name": "lib.ncc", "browser_download_url": "https://example.com/lib.ncc"}]
        }))
        .unwrap();

        let info = ReleaseInfo::from(release);
        assert_eq!(info.archive_url.as_deref(), Some("https://example.com/zip"));
        assert_eq!(info.assets[0].url, "https://example.com/lib.ncc");
    }

    #[test]
    fn test_gitlab_release_normalization() {
        let release: GitlabRelease = serde_json::from_value(json!({
            "tag_name": "v2.0.0",
            "assets": {
                "sources": [
                    {"format": "tar.gz", "url": "https://gitlab.example/a.tar.gz"},
                    {"format": "tar", "url": "https://gitlab.example/a.tar"}
                ],
                "links": [
                    {"name": "lib.ncc", "url": "https://gitlab.example/l", "direct_asset_url": "https://gitlab.example/d"},
                    {"name": "other.ncc", "url": "https://gitlab.example/o"}
                ]
            }
        }))
        .unwrap();

        let info = ReleaseInfo::from(release);
        assert_eq!(info.archive_url.as_deref(), Some("https://gitlab.example/a.tar"));
        assert_eq!(info.assets[0].url, "https://gitlab.example/d");
        assert_eq!(info.assets[1].url, "https://gitlab.example/o");
    }
}
