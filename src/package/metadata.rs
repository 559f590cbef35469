//! Package identity and build metadata

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::RepositoryConfiguration;

/// Identity of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    /// Human readable name
    pub name: String,

    /// Reverse-domain identifier, the key in the package lock
    pub package: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Assembly {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            version: version.into(),
            description: None,
            author: None,
            organization: None,
            license: None,
            url: None,
        }
    }
}

/// Compiler extension a package was built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerExtension {
    pub extension: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_version: Option<String>,
}

impl CompilerExtension {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            minimum_version: None,
            maximum_version: None,
        }
    }
}

/// Where updates for an installed package come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSource {
    /// Package source string (`vendor/name@repository`)
    pub source: String,

    /// Repository definition, for repositories not configured locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfiguration>,
}

/// Execution policies run around install, uninstall and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerHooks {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_install: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_install: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_uninstall: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_uninstall: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_update: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_update: Vec<String>,
}

impl InstallerHooks {
    pub fn is_empty(&self) -> bool {
        self.pre_install.is_empty()
            && self.post_install.is_empty()
            && self.pre_uninstall.is_empty()
            && self.post_uninstall.is_empty()
            && self.pre_update.is_empty()
            && self.post_update.is_empty()
    }

    /// Every policy name referenced by a hook
    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.pre_install
            .iter()
            .chain(&self.post_install)
            .chain(&self.pre_uninstall)
            .chain(&self.post_uninstall)
            .chain(&self.pre_update)
            .chain(&self.post_update)
            .map(String::as_str)
    }
}

/// Build provenance and runtime settings of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub compiler_extension: CompilerExtension,

    /// Version of the tool that built the package
    pub compiler_version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_source: Option<UpdateSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer: Option<InstallerHooks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_execution_policy: Option<String>,
}

impl Metadata {
    pub fn new(compiler_extension: CompilerExtension) -> Self {
        Self {
            compiler_extension,
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
            constants: BTreeMap::new(),
            options: BTreeMap::new(),
            update_source: None,
            installer: None,
            main_execution_policy: None,
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}
