//! Default installer writing a package onto the local filesystem

use std::fs;

use serde::Serialize;
use tracing::debug;

use super::{write_entry, InstallationPaths, PackageInstaller};
use crate::core::{NccError, NccResult};
use crate::package::{
    Assembly, Component, ComponentDataType, DependencyReference, Metadata, Package, Resource,
};

/// Name of the manifest written into the data path
pub const MANIFEST_NAME: &str = "package.json";

#[derive(Serialize)]
struct InstalledManifest<'a> {
    assembly: &'a Assembly,
    metadata: &'a Metadata,
    dependencies: &'a [DependencyReference],
    execution_units: Vec<UnitManifest<'a>>,
}

#[derive(Serialize)]
struct UnitManifest<'a> {
    id: String,
    name: &'a str,
    runner: &'a str,
    target: &'a str,
}

/// Installs components and resources as files and execution units under `bin/`
pub struct FileInstaller<'a> {
    package: &'a Package,
}

impl<'a> FileInstaller<'a> {
    pub fn new(package: &'a Package) -> Self {
        Self { package }
    }

    fn write_execution_units(&self, paths: &InstallationPaths) -> NccResult<()> {
        let bin_path = paths.bin_path();
        for unit in &self.package.execution_units {
            let target = write_entry(&bin_path, &unit.id(), &unit.data)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
            }

            debug!("Installed execution unit {} to {}", unit.policy.name, target.display());
        }
        Ok(())
    }

    fn write_manifest(&self, paths: &InstallationPaths) -> NccResult<()> {
        let manifest = InstalledManifest {
            assembly: &self.package.assembly,
            metadata: &self.package.metadata,
            dependencies: &self.package.dependencies,
            execution_units: self
                .package
                .execution_units
                .iter()
                .map(|u| UnitManifest {
                    id: u.id(),
                    name: &u.policy.name,
                    runner: &u.policy.runner,
                    target: &u.policy.target,
                })
                .collect(),
        };

        let content = serde_json::to_vec_pretty(&manifest)?;
        write_entry(&paths.data_path(), MANIFEST_NAME, &content)?;
        Ok(())
    }
}

impl PackageInstaller for FileInstaller<'_> {
    fn pre_install(&mut self, paths: &InstallationPaths) -> NccResult<()> {
        if let Some(hooks) = &self.package.metadata.installer {
            if let Some(missing) = hooks
                .policy_names()
                .find(|name| self.package.execution_unit(name).is_none())
            {
                return Err(NccError::package(format!(
                    "Installer hook references unknown execution policy: {}",
                    missing
                )));
            }
        }

        for dir in [paths.data_path(), paths.source_path(), paths.bin_path()] {
            fs::create_dir_all(&dir).map_err(|e| {
                NccError::operation(format!("Failed to create directory {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    fn process_component(&mut self, component: &Component) -> NccResult<Option<Vec<u8>>> {
        if component.data.is_empty() && component.checksum.is_none() {
            return Ok(None);
        }

        if !component.validate_checksum() {
            return Err(NccError::ComponentChecksum(component.name.clone()));
        }

        match component.data_type {
            ComponentDataType::Plain | ComponentDataType::Binary => Ok(Some(component.data.clone())),
            ComponentDataType::Base64Encoded => component.decoded_data().map(Some),
        }
    }

    fn process_resource(&mut self, resource: &Resource) -> NccResult<Option<Vec<u8>>> {
        if !resource.validate_checksum() {
            return Err(NccError::ResourceChecksum(resource.name.clone()));
        }
        Ok(Some(resource.data.clone()))
    }

    fn post_install(&mut self, paths: &InstallationPaths) -> NccResult<()> {
        self.write_execution_units(paths)?;
        self.write_manifest(paths)
    }
}
