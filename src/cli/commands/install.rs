//! ncc install - Install a package file

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;

use crate::cli::output;
use crate::core::NccResult;
use crate::utils::{format_bytes, format_duration};

#[derive(Args)]
pub struct InstallArgs {
    /// Package file to install
    pub package: PathBuf,

    /// Data directory (defaults to the per-user data directory)
    #[arg(long, env = "NCC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

pub async fn execute(args: InstallArgs, json_output: bool) -> NccResult<()> {
    let start_time = Instant::now();
    let engine = super::engine(args.data_dir.as_ref())?;

    let progress = if !json_output {
        Some(output::spinner(&format!("Installing {}...", args.package.display())))
    } else {
        None
    };

    let result = engine.install_package(&args.package, None);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let installed = result?;
    let duration = start_time.elapsed();

    if json_output {
        output::json(&serde_json::json!({
            "success": true,
            "package": installed.name,
            "version": installed.version,
            "location": installed.location,
            "components": installed.report.components_written,
            "resources": installed.report.resources_written,
            "bytes": installed.report.bytes_written,
            "duration_ms": duration.as_millis()
        }))?;
    } else {
        output::success(&format!(
            "Installed {} ({} components, {} resources, {})",
            output::package_version(&installed.name, &installed.version),
            installed.report.components_written,
            installed.report.resources_written,
            format_bytes(installed.report.bytes_written)
        ));
        output::info(&format!(
            "Completed in {}",
            format_duration(duration.as_millis())
        ));
    }

    Ok(())
}
