//! Source components carried inside a package

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::core::{NccError, NccResult};
use crate::utils::sha1_hex;

/// How a component's data is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentDataType {
    /// Text stored verbatim
    Plain,
    /// Raw bytes
    Binary,
    /// Base64 text, decoded on install
    #[serde(rename = "b64enc")]
    Base64Encoded,
}

/// A named blob of source or binary data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    pub data_type: ComponentDataType,

    #[serde(with = "super::blob")]
    pub data: Vec<u8>,

    /// SHA-1 of `data`; optional for components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Component {
    /// Create a component with a freshly computed checksum
    pub fn new(name: impl Into<String>, data_type: ComponentDataType, data: Vec<u8>) -> Self {
        let mut component = Self {
            name: name.into(),
            flags: Vec::new(),
            data_type,
            data,
            checksum: None,
        };
        component.update_checksum();
        component
    }

    /// Replace the data and recompute the checksum
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.update_checksum();
    }

    pub fn update_checksum(&mut self) {
        self.checksum = Some(sha1_hex(&self.data));
    }

    /// True when the stored checksum matches the data, or no checksum is stored
    pub fn validate_checksum(&self) -> bool {
        match &self.checksum {
            Some(checksum) => checksum.eq_ignore_ascii_case(&sha1_hex(&self.data)),
            None => true,
        }
    }

    /// Data as it should be written to disk
    pub fn decoded_data(&self) -> NccResult<Vec<u8>> {
        match self.data_type {
            ComponentDataType::Plain | ComponentDataType::Binary => Ok(self.data.clone()),
            ComponentDataType::Base64Encoded => base64::engine::general_purpose::STANDARD
                .decode(&self.data)
                .map_err(|e| NccError::ComponentDecode(format!("{}: {}", self.name, e))),
        }
    }
}
