//! Executable payloads and the policies describing how to run them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::sha1_hex;

/// How an execution unit is run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    pub name: String,

    /// Runner that interprets the payload (e.g. `php`, `bash`)
    pub runner: String,

    /// Entry point, relative to the unit's install location
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(default)]
    pub silent: bool,

    #[serde(default)]
    pub tty: bool,

    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Printed before the unit runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl ExecutionPolicy {
    pub fn new(
        name: impl Into<String>,
        runner: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            runner: runner.into(),
            target: target.into(),
            working_directory: None,
            environment: BTreeMap::new(),
            arguments: Vec::new(),
            silent: false,
            tty: false,
            timeout: None,
            message: None,
        }
    }
}

/// An execution policy bound to its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionUnit {
    pub policy: ExecutionPolicy,

    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "super::blob")]
    pub data: Vec<u8>,
}

impl ExecutionUnit {
    pub fn new(policy: ExecutionPolicy, data: Vec<u8>) -> Self {
        Self { policy, data }
    }

    /// Stable identity derived from the policy name
    pub fn id(&self) -> String {
        sha1_hex(self.policy.name.as_bytes())
    }

    /// Copy of this unit without its payload
    pub fn without_data(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            data: Vec::new(),
        }
    }
}
