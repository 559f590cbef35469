//! Remote package locators (`vendor/name=version@repository`)

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{NccError, NccResult};

static SOURCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<vendor>[a-z](?:[a-z0-9._-]*[a-z0-9])?)/(?P<name>[a-z](?:[a-z0-9._-]*[a-z0-9])?)(?:=(?P<version>[^\s@=]*))?@(?P<repository>[a-z](?:[a-z0-9._-]*[a-z0-9])?)$",
    )
    .expect("package source pattern is valid")
});

/// Where to fetch a package from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageSource {
    pub vendor: String,
    pub name: String,
    /// Requested version or constraint; `latest` when omitted
    pub version: String,
    /// Name of the configured repository
    pub repository: String,
}

impl PackageSource {
    pub fn is_latest(&self) -> bool {
        self.version.eq_ignore_ascii_case("latest")
    }
}

impl FromStr for PackageSource {
    type Err = NccError;

    fn from_str(s: &str) -> NccResult<Self> {
        let captures = SOURCE_PATTERN
            .captures(s.trim())
            .ok_or_else(|| NccError::invalid_argument(format!("Invalid package source: {}", s)))?;

        let version = captures
            .name("version")
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty())
            .unwrap_or("latest");

        Ok(Self {
            vendor: captures["vendor"].to_string(),
            name: captures["name"].to_string(),
            version: version.to_string(),
            repository: captures["repository"].to_string(),
        })
    }
}

impl TryFrom<String> for PackageSource {
    type Error = NccError;

    fn try_from(value: String) -> NccResult<Self> {
        value.parse()
    }
}

impl From<PackageSource> for String {
    fn from(source: PackageSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_latest() {
            write!(f, "{}/{}@{}", self.vendor, self.name, self.repository)
        } else {
            write!(
                f,
                "{}/{}={}@{}",
                self.vendor, self.name, self.version, self.repository
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_version() {
        let source: PackageSource = "my-org/my-pkg=3.0.0-beta@my-repo".parse().unwrap();
        assert_eq!(source.vendor, "my-org");
        assert_eq!(source.name, "my-pkg");
        assert_eq!(source.version, "3.0.0-beta");
        assert_eq!(source.repository, "my-repo");
        assert_eq!(source.to_string(), "my-org/my-pkg=3.0.0-beta@my-repo");
    }

    #[test]
    fn test_missing_version_means_latest() {
        let source: PackageSource = "org/package@repo".parse().unwrap();
        assert!(source.is_latest());
        assert_eq!(source.to_string(), "org/package@repo");

        let empty: PackageSource = "org/package=@repo".parse().unwrap();
        assert!(empty.is_latest());
    }

    #[test]
    fn test_invalid_sources() {
        for input in ["", "org/package", "org@repo", "-org/pkg@repo", "org/pkg-@repo", "org/pkg=1 0@repo"] {
            assert!(input.parse::<PackageSource>().is_err(), "{} should be invalid", input);
        }
    }

    #[test]
    fn test_case_insensitive() {
        let source: PackageSource = "Nosial/LibsConfig@GitHub".parse().unwrap();
        assert_eq!(source.repository, "GitHub");
    }
}
