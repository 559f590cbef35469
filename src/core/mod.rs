//! Core module for ncc
//!
//! This module contains the engine facade, configuration, error types and the
//! installed-package lock.

pub mod config;
pub mod engine;
pub mod error;
pub mod lockfile;

pub use config::Config;
pub use engine::Engine;
pub use error::{NccError, NccResult};
pub use lockfile::PackageLock;
