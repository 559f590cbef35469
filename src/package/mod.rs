//! Package container model
//!
//! A [`Package`] is the in-memory form of a `.ncc` container: magic bytes,
//! identity, metadata, components, resources, execution units and declared
//! dependencies. [`PackageCodec`] converts it to and from bytes.

mod blob;
pub mod codec;
pub mod component;
pub mod dependency;
pub mod execution_unit;
pub mod magic;
pub mod metadata;
pub mod resource;
pub mod source;

use std::path::Path;

use tracing::debug;

use crate::core::{NccError, NccResult};

pub use codec::{PackageCodec, PayloadCipher};
pub use component::{Component, ComponentDataType};
pub use dependency::DependencyReference;
pub use execution_unit::{ExecutionPolicy, ExecutionUnit};
pub use magic::{Encoder, MagicBytes};
pub use metadata::{Assembly, CompilerExtension, InstallerHooks, Metadata, UpdateSource};
pub use resource::Resource;
pub use source::PackageSource;

/// File extension of package containers
pub const PACKAGE_EXTENSION: &str = "ncc";

/// An in-memory package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub magic: MagicBytes,
    pub assembly: Assembly,
    pub metadata: Metadata,
    pub dependencies: Vec<DependencyReference>,
    pub execution_units: Vec<ExecutionUnit>,
    pub resources: Vec<Resource>,
    pub components: Vec<Component>,
}

impl Package {
    pub fn new(assembly: Assembly, metadata: Metadata) -> Self {
        Self {
            magic: MagicBytes::default(),
            assembly,
            metadata,
            dependencies: Vec::new(),
            execution_units: Vec::new(),
            resources: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Package identifier (`com.example.library`)
    pub fn name(&self) -> &str {
        &self.assembly.package
    }

    pub fn version(&self) -> &str {
        &self.assembly.version
    }

    /// Add a component, replacing any with the same name
    pub fn add_component(&mut self, component: Component) {
        self.components.retain(|c| c.name != component.name);
        self.components.push(component);
    }

    /// Add a resource, replacing any with the same name
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.retain(|r| r.name != resource.name);
        self.resources.push(resource);
    }

    /// Add an execution unit, replacing any with the same policy name
    pub fn add_execution_unit(&mut self, unit: ExecutionUnit) {
        self.execution_units
            .retain(|u| u.policy.name != unit.policy.name);
        self.execution_units.push(unit);
    }

    /// Add a dependency, replacing any on the same package
    pub fn add_dependency(&mut self, dependency: DependencyReference) {
        self.dependencies
            .retain(|d| d.package_name != dependency.package_name);
        self.dependencies.push(dependency);
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn execution_unit(&self, policy_name: &str) -> Option<&ExecutionUnit> {
        self.execution_units
            .iter()
            .find(|u| u.policy.name == policy_name)
    }

    /// Check every component and resource against its stored checksum
    pub fn verify_integrity(&self) -> NccResult<()> {
        if let Some(component) = self.components.iter().find(|c| !c.validate_checksum()) {
            return Err(NccError::ComponentChecksum(component.name.clone()));
        }
        if let Some(resource) = self.resources.iter().find(|r| !r.validate_checksum()) {
            return Err(NccError::ResourceChecksum(resource.name.clone()));
        }
        Ok(())
    }

    /// Read and decode an unencrypted package file
    pub fn load(path: &Path) -> NccResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            NccError::operation(format!("Failed to read package {}: {}", path.display(), e))
        })?;
        let package = PackageCodec::new().decode(&bytes)?;
        debug!(
            "Loaded package {}={} from {}",
            package.name(),
            package.version(),
            path.display()
        );
        Ok(package)
    }

    /// Encode and write an unencrypted package file
    pub fn save(&self, path: &Path) -> NccResult<()> {
        let bytes = PackageCodec::new().encode(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
