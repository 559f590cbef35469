//! Remote repositories: configuration, credentials and backend adapters

pub mod auth;
pub mod backends;
pub mod client;
pub mod transport;
pub mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{NccError, NccResult};

pub use auth::{Authentication, AuthenticationType, Credential, CredentialStore};
pub use client::RepositoryClient;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

/// Version keyword resolving to the newest release
pub const LATEST: &str = "latest";

/// True if `version` asks for the newest release
pub fn is_latest(version: &str) -> bool {
    version.is_empty() || version.eq_ignore_ascii_case(LATEST)
}

/// Kind of service behind a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    Github,
    Gitlab,
    Gitea,
    Packagist,
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepositoryType::Github => "github",
            RepositoryType::Gitlab => "gitlab",
            RepositoryType::Gitea => "gitea",
            RepositoryType::Packagist => "packagist",
        };
        f.write_str(name)
    }
}

impl FromStr for RepositoryType {
    type Err = NccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(RepositoryType::Github),
            "gitlab" => Ok(RepositoryType::Gitlab),
            "gitea" => Ok(RepositoryType::Gitea),
            "packagist" => Ok(RepositoryType::Packagist),
            other => Err(NccError::invalid_argument(format!(
                "Unknown repository type: {}",
                other
            ))),
        }
    }
}

fn default_ssl() -> bool {
    true
}

/// A named remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfiguration {
    name: String,

    #[serde(rename = "type")]
    repo_type: RepositoryType,

    host: String,

    #[serde(default = "default_ssl")]
    ssl: bool,
}

impl RepositoryConfiguration {
    pub fn new(name: &str, repo_type: RepositoryType, host: &str, ssl: bool) -> Self {
        Self {
            name: name.to_lowercase(),
            repo_type,
            host: host.to_string(),
            ssl,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo_type(&self) -> RepositoryType {
        self.repo_type
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ssl(&self) -> bool {
        self.ssl
    }

    /// `scheme://host`
    pub fn base_url(&self) -> String {
        format!("{}://{}", if self.ssl { "https" } else { "http" }, self.host)
    }
}

/// What a repository result points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    SourceArchive,
    NccPackage,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::SourceArchive => f.write_str("source archive"),
            ResultKind::NccPackage => f.write_str("ncc package"),
        }
    }
}

/// A resolved download location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryResult {
    pub url: String,
    pub kind: ResultKind,
    pub version: String,
}

impl RepositoryResult {
    pub fn new(url: impl Into<String>, kind: ResultKind, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            version: version.into(),
        }
    }
}

/// Options for fetch operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Prefer `*_static.ncc` / `*-static.ncc` release assets
    pub prefer_static: bool,
}

/// Named set of repository configurations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRegistry {
    repositories: Vec<RepositoryConfiguration>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The public repositories known out of the box
    pub fn defaults() -> Self {
        Self {
            repositories: vec![
                RepositoryConfiguration::new("github", RepositoryType::Github, "api.github.com", true),
                RepositoryConfiguration::new("gitlab", RepositoryType::Gitlab, "gitlab.com", true),
                RepositoryConfiguration::new("gitea", RepositoryType::Gitea, "gitea.com", true),
                RepositoryConfiguration::new("packagist", RepositoryType::Packagist, "packagist.org", true),
            ],
        }
    }

    pub fn from_configurations(configurations: impl IntoIterator<Item = RepositoryConfiguration>) -> NccResult<Self> {
        let mut registry = Self::new();
        for configuration in configurations {
            registry.add(configuration)?;
        }
        Ok(registry)
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&RepositoryConfiguration> {
        self.repositories
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn add(&mut self, mut configuration: RepositoryConfiguration) -> NccResult<()> {
        configuration.name = configuration.name.to_lowercase();
        if self.exists(&configuration.name) {
            return Err(NccError::invalid_argument(format!(
                "Repository already exists: {}",
                configuration.name
            )));
        }
        self.repositories.push(configuration);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> NccResult<RepositoryConfiguration> {
        let index = self
            .repositories
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| NccError::invalid_argument(format!("Repository not found: {}", name)))?;
        Ok(self.repositories.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryConfiguration> {
        self.repositories.iter()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
