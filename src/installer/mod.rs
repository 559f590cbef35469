//! Package installation pipeline
//!
//! Installation runs in a fixed order: `pre_install`, every component, every
//! resource, then `post_install`. The first failure aborts the remaining
//! stages; files already written are left in place.

pub mod compiler;
pub mod file;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{NccError, NccResult};
use crate::package::{Component, Package, Resource};
use crate::utils::is_safe_path;

pub use compiler::{DirectoryCompiler, PackageCompiler};
pub use file::FileInstaller;

/// Layout of an installed package version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPaths {
    root: PathBuf,
}

impl InstallationPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Installation root
    pub fn install_path(&self) -> &Path {
        &self.root
    }

    /// Package metadata (`<root>/ncc`)
    pub fn data_path(&self) -> PathBuf {
        self.root.join("ncc")
    }

    /// Components and resources (`<root>/src`)
    pub fn source_path(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Execution unit payloads (`<root>/bin`)
    pub fn bin_path(&self) -> PathBuf {
        self.root.join("bin")
    }
}

/// Installer side of the build/install seam
pub trait PackageInstaller {
    fn pre_install(&mut self, paths: &InstallationPaths) -> NccResult<()>;

    /// Verify and decode a component; `None` means nothing is written
    fn process_component(&mut self, component: &Component) -> NccResult<Option<Vec<u8>>>;

    /// Verify a resource; `None` means nothing is written
    fn process_resource(&mut self, resource: &Resource) -> NccResult<Option<Vec<u8>>>;

    fn post_install(&mut self, paths: &InstallationPaths) -> NccResult<()>;
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub components_written: usize,
    pub resources_written: usize,
    pub bytes_written: u64,
}

/// Run the installation pipeline for `package` into `paths`
pub fn run_pipeline(
    installer: &mut dyn PackageInstaller,
    package: &Package,
    paths: &InstallationPaths,
) -> NccResult<InstallReport> {
    let mut report = InstallReport::default();
    let source_path = paths.source_path();

    installer.pre_install(paths)?;

    for component in &package.components {
        if let Some(content) = installer.process_component(component)? {
            write_entry(&source_path, &component.name, &content)?;
            report.components_written += 1;
            report.bytes_written += content.len() as u64;
        }
    }

    for resource in &package.resources {
        if let Some(content) = installer.process_resource(resource)? {
            write_entry(&source_path, &resource.name, &content)?;
            report.resources_written += 1;
            report.bytes_written += content.len() as u64;
        }
    }

    installer.post_install(paths)?;

    debug!(
        "Installed {}={} into {} ({} components, {} resources)",
        package.name(),
        package.version(),
        paths.install_path().display(),
        report.components_written,
        report.resources_written
    );
    Ok(report)
}

/// Write `content` to `base/name`, refusing names that escape `base`
pub(crate) fn write_entry(base: &Path, name: &str, content: &[u8]) -> NccResult<PathBuf> {
    let relative = Path::new(name);
    if !is_safe_path(relative) {
        return Err(NccError::operation(format!(
            "Refusing to write outside of the installation path: {}",
            name
        )));
    }

    let target = base.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            NccError::operation(format!("Failed to create directory {}: {}", parent.display(), e))
        })?;
    }
    fs::write(&target, content)?;
    Ok(target)
}
