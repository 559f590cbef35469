//! ncc list - Show installed packages

use std::path::PathBuf;

use clap::Args;

use crate::cli::output;
use crate::core::NccResult;

#[derive(Args)]
pub struct ListArgs {
    /// Data directory (defaults to the per-user data directory)
    #[arg(long, env = "NCC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

pub async fn execute(args: ListArgs, json_output: bool) -> NccResult<()> {
    let engine = super::engine(args.data_dir.as_ref())?;
    let installed = engine.installed()?;

    if json_output {
        let packages: serde_json::Map<String, serde_json::Value> = installed
            .into_iter()
            .map(|(name, versions)| (name, serde_json::json!(versions)))
            .collect();
        output::json(&packages)?;
        return Ok(());
    }

    if installed.is_empty() {
        output::info("No packages installed");
        return Ok(());
    }

    output::table_header(&["PACKAGE", "VERSIONS"]);
    output::divider();
    for (name, versions) in &installed {
        println!("{}  {}", console::style(name).cyan(), versions.join(", "));
    }

    Ok(())
}
