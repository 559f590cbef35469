//! Declared package dependencies

use serde::{Deserialize, Serialize};

use super::source::PackageSource;
use crate::core::NccResult;

/// A dependency declared by a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReference {
    pub package_name: String,

    /// Version constraint, `latest` when unspecified
    #[serde(default = "default_version")]
    pub version: String,

    /// Remote locator (`vendor/name=version@repository`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_version() -> String {
    "latest".to_string()
}

impl DependencyReference {
    pub fn new(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: &PackageSource) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Parsed remote locator, if one is declared
    pub fn package_source(&self) -> NccResult<Option<PackageSource>> {
        self.source
            .as_deref()
            .map(|s| s.parse::<PackageSource>())
            .transpose()
    }
}
