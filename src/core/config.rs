//! Configuration handling for ncc
//!
//! Reads `ncc.toml` from the data directory and applies `NCC_*` environment
//! overrides on top of the defaults.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::{NccError, NccResult};
use crate::registry::{Authentication, CredentialStore, RepositoryConfiguration, RepositoryRegistry};

/// Configuration file name inside the data directory
pub const CONFIG_FILE: &str = "ncc.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,

    pub network: NetworkConfig,

    /// Known repositories; entries from the file replace defaults of the same name
    pub repositories: Vec<RepositoryConfiguration>,

    /// Credentials keyed by repository name
    pub credentials: HashMap<String, Authentication>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for installed packages and the lock file
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    pub timeout: u64,

    /// Attempts per request (at most 3)
    pub retries: u32,

    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            network: NetworkConfig::default(),
            repositories: RepositoryRegistry::defaults().iter().cloned().collect(),
            credentials: HashMap::new(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            retries: 3,
            user_agent: None,
        }
    }
}

impl NetworkConfig {
    /// `User-Agent` sent with every request
    pub fn user_agent_header(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("ncc/{}", env!("CARGO_PKG_VERSION")))
    }
}

impl Config {
    /// Load configuration from the default data directory
    pub fn load() -> NccResult<Self> {
        let dir = match env::var("NCC_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir()?,
        };
        Self::load_from(&dir)
    }

    /// Load `ncc.toml` from `dir` (if present) and merge with defaults
    pub fn load_from(dir: &Path) -> NccResult<Self> {
        let mut config = Config::default();

        let toml_path = dir.join(CONFIG_FILE);
        if toml_path.exists() {
            let content = std::fs::read_to_string(&toml_path)?;
            let file_config: Config = toml::from_str(&content)?;
            config = config.merge(file_config);
        }

        if config.paths.data_dir.is_none() {
            config.paths.data_dir = Some(dir.to_path_buf());
        }

        Ok(config.apply_overrides(|key| env::var(key).ok()))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(self, other: Config) -> Self {
        let mut repositories = self.repositories;
        for repo in other.repositories {
            match repositories
                .iter_mut()
                .find(|r| r.name().eq_ignore_ascii_case(repo.name()))
            {
                Some(existing) => *existing = repo,
                None => repositories.push(repo),
            }
        }

        let mut credentials = self.credentials;
        credentials.extend(other.credentials);

        Self {
            paths: PathsConfig {
                data_dir: other.paths.data_dir.or(self.paths.data_dir),
            },
            network: other.network,
            repositories,
            credentials,
        }
    }

    /// Apply `NCC_*` overrides read through `lookup`
    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("NCC_DATA_DIR") {
            self.paths.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(timeout) = lookup("NCC_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.network.timeout = timeout;
        }

        if let Some(retries) = lookup("NCC_RETRIES").and_then(|v| v.parse().ok()) {
            self.network.retries = retries;
        }

        self
    }

    /// Data directory, creating it if necessary
    pub fn data_dir(&self) -> NccResult<PathBuf> {
        let dir = match &self.paths.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Directory holding one subdirectory per installed package version
    pub fn packages_dir(&self) -> NccResult<PathBuf> {
        let dir = self.data_dir()?.join("packages");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn registry(&self) -> NccResult<RepositoryRegistry> {
        RepositoryRegistry::from_configurations(self.repositories.iter().cloned())
    }

    /// Save configuration to `ncc.toml` in `dir`
    pub fn save(&self, dir: &Path) -> NccResult<()> {
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), content)?;
        Ok(())
    }
}

impl CredentialStore for Config {
    fn lookup(&self, repository: &str) -> Option<Authentication> {
        self.credentials.lookup(repository)
    }
}

fn default_data_dir() -> NccResult<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "ncc", "ncc")
        .ok_or_else(|| NccError::config("Could not determine data directory"))?;
    Ok(project_dirs.data_dir().to_path_buf())
}
