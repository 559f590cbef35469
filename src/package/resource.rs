//! Non-source files shipped with a package

use serde::{Deserialize, Serialize};

use crate::utils::sha1_hex;

/// A named resource; unlike components the checksum is mandatory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,

    #[serde(with = "super::blob")]
    pub data: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let mut resource = Self {
            name: name.into(),
            data,
            checksum: None,
        };
        resource.update_checksum();
        resource
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.update_checksum();
    }

    pub fn update_checksum(&mut self) {
        self.checksum = Some(sha1_hex(&self.data));
    }

    /// False when the checksum is missing or does not match the data
    pub fn validate_checksum(&self) -> bool {
        self.checksum
            .as_deref()
            .map(|c| c.eq_ignore_ascii_case(&sha1_hex(&self.data)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_mandatory() {
        let mut resource = Resource::new("assets/logo.png", vec![1, 2, 3]);
        assert!(resource.validate_checksum());

        resource.checksum = None;
        assert!(!resource.validate_checksum());
    }

    #[test]
    fn test_mutation_invalidates_checksum() {
        let mut resource = Resource::new("data.json", b"{}".to_vec());
        resource.data = b"{\"a\":1}".to_vec();
        assert!(!resource.validate_checksum());

        resource.set_data(b"[]".to_vec());
        assert!(resource.validate_checksum());
    }
}
