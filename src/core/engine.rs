//! Engine coordinating repository lookups, installation and the lock

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::RuntimeCache;
use crate::core::{Config, NccError, NccResult, PackageLock};
use crate::installer::{run_pipeline, FileInstaller, InstallReport, InstallationPaths};
use crate::package::{Package, PackageCodec, PackageSource, PayloadCipher};
use crate::registry::{
    CredentialStore, FetchOptions, RepositoryClient, RepositoryRegistry, RepositoryResult,
    ResultKind,
};
use crate::utils::{install_dir_name, is_valid_package_name};

/// Outcome of a package installation
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub location: PathBuf,
    pub report: InstallReport,
}

/// Main engine for ncc operations
pub struct Engine {
    pub config: Config,

    pub registry: RepositoryRegistry,

    /// Client holding the request cache shared by every lookup
    pub client: RepositoryClient,

    data_dir: PathBuf,
}

impl Engine {
    pub fn new(config: Config) -> NccResult<Self> {
        let cache = Arc::new(RuntimeCache::new());
        let client = RepositoryClient::from_config(&config.network, cache)?;
        Self::with_client(config, client)
    }

    /// Engine over a caller-built client, e.g. one with a custom transport
    pub fn with_client(config: Config, client: RepositoryClient) -> NccResult<Self> {
        let registry = config.registry()?;
        let data_dir = config.data_dir()?;

        Ok(Self {
            config,
            registry,
            client,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.data_dir.join("packages")
    }

    /// Install location of `name=version`, always a direct child of the packages directory
    pub fn package_location(&self, name: &str, version: &str) -> NccResult<PathBuf> {
        if !is_valid_package_name(name) {
            return Err(NccError::invalid_argument(format!("Invalid package name: {}", name)));
        }
        if version.is_empty() || version.contains(['/', '\\']) || version.contains("..") {
            return Err(NccError::invalid_argument(format!(
                "Invalid package version: {}",
                version
            )));
        }

        let dir_name = install_dir_name(name, version);
        let mut components = Path::new(&dir_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.packages_dir().join(dir_name)),
            _ => Err(NccError::invalid_argument(format!(
                "Invalid install directory: {}",
                dir_name
            ))),
        }
    }

    /// The installed-package lock
    pub fn lock(&self) -> NccResult<PackageLock> {
        PackageLock::load_or_default(&self.data_dir)
    }

    /// Decode a package file, install it and register it in the lock
    pub fn install_package(
        &self,
        path: &Path,
        cipher: Option<&dyn PayloadCipher>,
    ) -> NccResult<InstalledPackage> {
        let bytes = std::fs::read(path).map_err(|e| {
            NccError::operation(format!("Failed to read package {}: {}", path.display(), e))
        })?;
        let codec = match cipher {
            Some(cipher) => PackageCodec::with_cipher(cipher),
            None => PackageCodec::new(),
        };
        let package = codec.decode(&bytes)?;
        self.install(&package)
    }

    /// Install an already decoded package
    pub fn install(&self, package: &Package) -> NccResult<InstalledPackage> {
        if !package.magic.installable {
            return Err(NccError::operation(format!(
                "Package {}={} is not installable",
                package.name(),
                package.version()
            )));
        }

        let location = self.package_location(package.name(), package.version())?;
        let mut lock = self.lock()?;
        let paths = InstallationPaths::new(&location);

        info!(
            "Installing {}={} into {}",
            package.name(),
            package.version(),
            location.display()
        );
        let report = run_pipeline(&mut FileInstaller::new(package), package, &paths)?;

        lock.add_package(package, &location);
        lock.save(&self.data_dir)?;

        Ok(InstalledPackage {
            name: package.name().to_string(),
            version: package.version().to_string(),
            location,
            report,
        })
    }

    /// Remove an installed version (or `latest`) and its files
    pub fn uninstall_package(&self, name: &str, version: &str) -> NccResult<String> {
        let mut lock = self.lock()?;
        let entry = lock
            .get_package(name)
            .ok_or_else(|| NccError::PackageNotFound(name.to_string()))?;
        let resolved = entry.require_version(version)?.version.clone();
        let location = self.package_location(name, &resolved)?;

        if location.exists() {
            std::fs::remove_dir_all(&location).map_err(|e| {
                NccError::operation(format!("Failed to remove {}: {}", location.display(), e))
            })?;
        }

        lock.remove_package_version(name, &resolved);
        lock.save(&self.data_dir)?;
        debug!("Uninstalled {}={}", name, resolved);
        Ok(resolved)
    }

    /// Installed packages with their versions
    pub fn installed(&self) -> NccResult<Vec<(String, Vec<String>)>> {
        let lock = self.lock()?;
        Ok(lock
            .packages()
            .into_iter()
            .map(|(name, versions)| {
                (
                    name.to_string(),
                    versions.into_iter().map(str::to_string).collect(),
                )
            })
            .collect())
    }

    /// Resolve a download location for `source` through its repository
    pub async fn fetch(
        &self,
        source: &PackageSource,
        kind: ResultKind,
        options: &FetchOptions,
    ) -> NccResult<RepositoryResult> {
        let repository = self.registry.get(&source.repository).ok_or_else(|| {
            NccError::invalid_argument(format!("Unknown repository: {}", source.repository))
        })?;
        let auth = self.config.lookup(repository.name());

        match kind {
            ResultKind::SourceArchive => {
                self.client
                    .fetch_source_archive(
                        repository,
                        &source.vendor,
                        &source.name,
                        &source.version,
                        auth.as_ref(),
                        options,
                    )
                    .await
            }
            ResultKind::NccPackage => {
                self.client
                    .fetch_package(
                        repository,
                        &source.vendor,
                        &source.name,
                        &source.version,
                        auth.as_ref(),
                        options,
                    )
                    .await
            }
        }
    }
}
