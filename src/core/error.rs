//! Error types for ncc

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ncc operations
pub type NccResult<T> = Result<T, NccError>;

/// Main error type for ncc
#[derive(Error, Debug)]
pub enum NccError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure after retries, unexpected HTTP status, or nothing found upstream
    #[error("Network error: {0}")]
    Network(String),

    /// 401/403 from a remote, or a credential that does not match its declared type
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Local operational failure (missing archive, directory creation, short reads)
    #[error("Operation failed: {0}")]
    Operation(String),

    /// A response body that could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Component checksum mismatch: {0}")]
    ComponentChecksum(String),

    #[error("Resource checksum mismatch: {0}")]
    ResourceChecksum(String),

    #[error("Cannot decode component: {0}")]
    ComponentDecode(String),

    #[error("Invalid package: {0}")]
    PackageParsing(String),

    #[error("Version not found: {package}={version}")]
    VersionNotFound { package: String, version: String },

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock file corrupted or invalid: {0}")]
    InvalidLockfile(PathBuf),

    #[error("{0}")]
    Other(String),
}

impl NccError {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        NccError::Other(msg.into())
    }

    /// Create a network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        NccError::Network(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        NccError::Authentication(msg.into())
    }

    /// Create an operation error
    pub fn operation<S: Into<String>>(msg: S) -> Self {
        NccError::Operation(msg.into())
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        NccError::Parse(msg.into())
    }

    /// Create a package parsing error
    pub fn package<S: Into<String>>(msg: S) -> Self {
        NccError::PackageParsing(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        NccError::InvalidArgument(msg.into())
    }

    /// Create a not supported error
    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        NccError::NotSupported(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        NccError::Config(msg.into())
    }

    /// True for integrity failures (bad bytes), false for format failures
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            NccError::ComponentChecksum(_) | NccError::ResourceChecksum(_)
        )
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            NccError::PackageNotFound(_) => 2,
            NccError::VersionNotFound { .. } => 2,
            NccError::ComponentChecksum(_) | NccError::ResourceChecksum(_) => 3,
            NccError::ComponentDecode(_) | NccError::PackageParsing(_) => 4,
            NccError::Authentication(_) => 5,
            NccError::Network(_) | NccError::Http(_) => 6,
            _ => 1,
        }
    }
}
