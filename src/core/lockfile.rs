//! Installed package lock
//!
//! Records every installed package version, where it lives, what it depends
//! on and which execution units it carries. Persisted as TOML with an
//! integrity hash that is verified on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{NccError, NccResult};
use crate::package::{CompilerExtension, ExecutionUnit, Package};
use crate::resolver::compare_versions;
use crate::utils::sha256;

/// Lock format version
pub const LOCK_VERSION: &str = "1.0.0";

/// Lock filename inside the data directory
pub const LOCKFILE_NAME: &str = "package.lck";

/// Dependency snapshot stored with a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub package_name: String,
    pub version: String,
}

/// One installed version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_execution_policy: Option<String>,

    /// Installation root
    pub location: PathBuf,

    pub compiler: CompilerExtension,

    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,

    /// Execution units without their payload
    #[serde(default)]
    pub execution_units: Vec<ExecutionUnit>,
}

impl VersionEntry {
    pub fn execution_unit(&self, policy_name: &str) -> Option<&ExecutionUnit> {
        self.execution_units
            .iter()
            .find(|u| u.policy.name == policy_name)
    }
}

/// All installed versions of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub name: String,

    /// Greatest installed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,

    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latest_version: None,
            versions: Vec::new(),
        }
    }

    /// Look up a version; `latest` resolves through the latest pointer
    pub fn get_version(&self, version: &str) -> Option<&VersionEntry> {
        let version = if version.eq_ignore_ascii_case("latest") {
            self.latest_version.as_deref()?
        } else {
            version
        };
        self.versions.iter().find(|v| v.version == version)
    }

    /// Like [`get_version`](Self::get_version) but a missing version is an error
    pub fn require_version(&self, version: &str) -> NccResult<&VersionEntry> {
        self.get_version(version)
            .ok_or_else(|| NccError::VersionNotFound {
                package: self.name.clone(),
                version: version.to_string(),
            })
    }

    /// Record an installed package version
    ///
    /// Returns `false` without changes when the version is already present and
    /// `overwrite` is not set.
    pub fn add_version(
        &mut self,
        package: &Package,
        install_path: impl Into<PathBuf>,
        overwrite: bool,
    ) -> bool {
        let version = package.version();
        if self.versions.iter().any(|v| v.version == version) {
            if !overwrite {
                return false;
            }
            self.versions.retain(|v| v.version != version);
        }

        self.versions.push(VersionEntry {
            version: version.to_string(),
            main_execution_policy: package.metadata.main_execution_policy.clone(),
            location: install_path.into(),
            compiler: package.metadata.compiler_extension.clone(),
            dependencies: package
                .dependencies
                .iter()
                .map(|d| DependencyEntry {
                    package_name: d.package_name.clone(),
                    version: d.version.clone(),
                })
                .collect(),
            execution_units: package
                .execution_units
                .iter()
                .map(ExecutionUnit::without_data)
                .collect(),
        });

        self.update_latest_version();
        true
    }

    /// Remove the first entry for `version`
    pub fn remove_version(&mut self, version: &str) -> bool {
        match self.versions.iter().position(|v| v.version == version) {
            Some(index) => {
                self.versions.remove(index);
                self.update_latest_version();
                true
            }
            None => false,
        }
    }

    /// Recompute the latest pointer
    ///
    /// The first version seeds the result and is only replaced by a strictly
    /// greater one, so among equal versions the earliest entry wins.
    pub fn update_latest_version(&mut self) {
        let mut latest: Option<&str> = None;
        for entry in &self.versions {
            match latest {
                None => latest = Some(&entry.version),
                Some(current) => {
                    if compare_versions(&entry.version, current).is_gt() {
                        latest = Some(&entry.version);
                    }
                }
            }
        }
        self.latest_version = latest.map(str::to_string);
    }

    pub fn version_strings(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.version.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// The persisted set of installed packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLock {
    pub lock_version: String,

    /// Unix timestamp of the last modification
    #[serde(default)]
    pub last_updated: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,

    #[serde(default)]
    pub packages: BTreeMap<String, PackageEntry>,
}

impl Default for PackageLock {
    fn default() -> Self {
        Self {
            lock_version: LOCK_VERSION.to_string(),
            last_updated: chrono::Utc::now().timestamp(),
            integrity: None,
            packages: BTreeMap::new(),
        }
    }
}

impl PackageLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the lock from a directory, `None` when no lock exists yet
    pub fn load(dir: &Path) -> NccResult<Option<Self>> {
        let path = dir.join(LOCKFILE_NAME);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let lock: PackageLock = toml::from_str(&content)?;

        if let Some(ref stored_integrity) = lock.integrity {
            if lock.compute_integrity()? != *stored_integrity {
                return Err(NccError::InvalidLockfile(path));
            }
        }

        debug!("Loaded package lock with {} packages", lock.packages.len());
        Ok(Some(lock))
    }

    /// Load the lock, starting a fresh one when none exists
    pub fn load_or_default(dir: &Path) -> NccResult<Self> {
        Ok(Self::load(dir)?.unwrap_or_default())
    }

    /// Save the lock to a directory
    pub fn save(&mut self, dir: &Path) -> NccResult<()> {
        self.integrity = None;
        self.integrity = Some(self.compute_integrity()?);

        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join(LOCKFILE_NAME), content)?;

        Ok(())
    }

    fn compute_integrity(&self) -> NccResult<String> {
        let mut lock_copy = self.clone();
        lock_copy.integrity = None;

        let content = toml::to_string(&lock_copy)?;
        Ok(format!("sha256-{}", sha256(content.as_bytes())))
    }

    fn touch(&mut self) {
        self.last_updated = chrono::Utc::now().timestamp();
    }

    /// Record an installed package, replacing an existing entry for the same version
    pub fn add_package(&mut self, package: &Package, install_path: impl Into<PathBuf>) {
        self.packages
            .entry(package.name().to_string())
            .or_insert_with(|| PackageEntry::new(package.name()))
            .add_version(package, install_path, true);
        self.touch();
    }

    /// Remove one version, dropping the package entry once no versions remain
    pub fn remove_package_version(&mut self, package: &str, version: &str) -> bool {
        let Some(entry) = self.packages.get_mut(package) else {
            return false;
        };

        let removed = entry.remove_version(version);
        if entry.is_empty() {
            self.packages.remove(package);
        }
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove a package with all of its versions
    pub fn remove_package(&mut self, package: &str) -> bool {
        let removed = self.packages.remove(package).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    pub fn get_package(&self, package: &str) -> Option<&PackageEntry> {
        self.packages.get(package)
    }

    /// Installed package names mapped to their versions
    pub fn packages(&self) -> BTreeMap<&str, Vec<&str>> {
        self.packages
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.version_strings()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Assembly, DependencyReference, ExecutionPolicy, Metadata};
    use tempfile::tempdir;

    fn package(version: &str) -> Package {
        let mut package = Package::new(
            Assembly::new("Lib", "com.example.lib", version),
            Metadata::new(CompilerExtension::new("php")),
        );
        package.add_execution_unit(ExecutionUnit::new(
            ExecutionPolicy::new("main", "php", "main.php"),
            b"<?php echo 1;".to_vec(),
        ));
        package.add_dependency(DependencyReference::new("com.example.util", "^1.0"));
        package
    }

    #[test]
    fn test_add_version_overwrite_semantics() {
        let mut entry = PackageEntry::new("com.example.lib");
        assert!(entry.add_version(&package("1.0.0"), "/opt/a", false));
        assert!(!entry.add_version(&package("1.0.0"), "/opt/b", false));
        assert_eq!(entry.get_version("1.0.0").unwrap().location, PathBuf::from("/opt/a"));

        assert!(entry.add_version(&package("1.0.0"), "/opt/b", true));
        assert_eq!(entry.versions.len(), 1);
        assert_eq!(entry.get_version("1.0.0").unwrap().location, PathBuf::from("/opt/b"));
    }

    #[test]
    fn test_add_version_strips_unit_payloads() {
        let mut entry = PackageEntry::new("com.example.lib");
        entry.add_version(&package("1.0.0"), "/opt/a", false);

        let version = entry.get_version("1.0.0").unwrap();
        assert_eq!(version.execution_units.len(), 1);
        assert!(version.execution_units[0].data.is_empty());
        assert_eq!(
            version.dependencies,
            vec![DependencyEntry {
                package_name: "com.example.util".to_string(),
                version: "^1.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_latest_follows_version_order() {
        let mut entry = PackageEntry::new("com.example.lib");
        entry.add_version(&package("1.2.0"), "/opt/1.2.0", false);
        entry.add_version(&package("1.10.0"), "/opt/1.10.0", false);
        entry.add_version(&package("1.9.0"), "/opt/1.9.0", false);
        assert_eq!(entry.latest_version.as_deref(), Some("1.10.0"));
        assert_eq!(entry.get_version("latest").unwrap().version, "1.10.0");

        assert!(entry.remove_version("1.10.0"));
        assert_eq!(entry.latest_version.as_deref(), Some("1.9.0"));
        assert!(!entry.remove_version("1.10.0"));
    }

    #[test]
    fn test_latest_tie_keeps_first_seen() {
        let mut entry = PackageEntry::new("com.example.lib");
        entry.add_version(&package("1.0"), "/opt/a", false);
        entry.add_version(&package("1.0.0"), "/opt/b", false);
        assert_eq!(entry.latest_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_strict_lookup() {
        let entry = PackageEntry::new("com.example.lib");
        assert!(entry.get_version("latest").is_none());
        assert!(matches!(
            entry.require_version("2.0.0"),
            Err(NccError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_last_version_drops_package() {
        let mut lock = PackageLock::new();
        lock.add_package(&package("1.0.0"), "/opt/a");
        lock.add_package(&package("2.0.0"), "/opt/b");
        assert_eq!(lock.packages()["com.example.lib"], vec!["1.0.0", "2.0.0"]);

        assert!(lock.remove_package_version("com.example.lib", "1.0.0"));
        assert!(lock.get_package("com.example.lib").is_some());
        assert!(lock.remove_package_version("com.example.lib", "2.0.0"));
        assert!(lock.get_package("com.example.lib").is_none());
        assert!(!lock.remove_package_version("com.example.lib", "2.0.0"));
    }

    #[test]
    fn test_lock_roundtrip() {
        let dir = tempdir().unwrap();

        let mut lock = PackageLock::new();
        lock.add_package(&package("1.0.0"), dir.path().join("com.example.lib=1.0.0"));
        lock.save(dir.path()).unwrap();

        let loaded = PackageLock::load(dir.path()).unwrap().unwrap();
        let entry = loaded.get_package("com.example.lib").unwrap();
        assert_eq!(entry.latest_version.as_deref(), Some("1.0.0"));
        assert_eq!(entry.versions[0].execution_units[0].policy.name, "main");
    }

    #[test]
    fn test_saved_integrity_matches_recomputed() {
        let dir = tempdir().unwrap();

        let mut lock = PackageLock::new();
        lock.add_package(&package("1.0.0"), "/opt/a");
        lock.save(dir.path()).unwrap();

        let stored = lock.integrity.clone().unwrap();
        assert!(stored.starts_with("sha256-"));
        assert_eq!(lock.compute_integrity().unwrap(), stored);
    }

    #[test]
    fn test_lock_integrity() {
        let dir = tempdir().unwrap();

        let mut lock = PackageLock::new();
        lock.add_package(&package("1.0.0"), "/opt/a");
        lock.save(dir.path()).unwrap();

        let path = dir.path().join(LOCKFILE_NAME);
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("/opt/a", "/opt/evil")).unwrap();

        assert!(matches!(
            PackageLock::load(dir.path()),
            Err(NccError::InvalidLockfile(_))
        ));
    }
}
