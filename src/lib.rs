//! ncc - package container tooling and package manager core
//!
//! Binary `.ncc` package containers, tar/zip source archive extraction,
//! repository adapters for GitHub, GitLab, Gitea and Packagist, and the
//! installed-package lock.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod core;
pub mod installer;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod utils;

pub use crate::core::{Config, Engine, NccError, NccResult, PackageLock};
pub use crate::package::{Package, PackageCodec, PackageSource};
