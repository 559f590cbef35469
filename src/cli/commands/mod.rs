//! CLI command implementations

pub mod build;
pub mod extract;
pub mod fetch;
pub mod inspect;
pub mod install;
pub mod list;
pub mod uninstall;

use std::path::PathBuf;

use crate::core::{Config, Engine, NccResult};

/// Engine over the configuration in `data_dir`, or the default data directory
pub(crate) fn engine(data_dir: Option<&PathBuf>) -> NccResult<Engine> {
    let config = match data_dir {
        Some(dir) => Config::load_from(dir)?,
        None => Config::load()?,
    };
    Engine::new(config)
}
