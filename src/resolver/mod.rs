//! Version resolution primitives shared by the lock store and registry backends

pub mod version;

pub use version::{compare_versions, parse_loose, satisfies, VersionConstraint};
