//! ncc uninstall - Remove an installed package version

use std::path::PathBuf;

use clap::Args;

use crate::cli::output;
use crate::core::NccResult;

#[derive(Args)]
pub struct UninstallArgs {
    /// Package name (e.g. com.example.lib)
    pub package: String,

    /// Version to remove
    #[arg(id = "package_version", value_name = "VERSION", default_value = "latest")]
    pub version: String,

    /// Data directory (defaults to the per-user data directory)
    #[arg(long, env = "NCC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

pub async fn execute(args: UninstallArgs, json_output: bool) -> NccResult<()> {
    let engine = super::engine(args.data_dir.as_ref())?;
    let removed = engine.uninstall_package(&args.package, &args.version)?;

    if json_output {
        output::json(&serde_json::json!({
            "success": true,
            "package": args.package,
            "version": removed
        }))?;
    } else {
        output::success(&format!(
            "Removed {}",
            output::package_version(&args.package, &removed)
        ));
    }

    Ok(())
}
