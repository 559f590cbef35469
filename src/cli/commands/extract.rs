//! ncc extract - Unpack a source archive

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;

use crate::archive::{self, EntryKind};
use crate::cli::output;
use crate::core::NccResult;
use crate::utils::format_duration;

#[derive(Args)]
pub struct ExtractArgs {
    /// Archive to extract (.zip, .tar, .tar.gz, .tar.bz2)
    pub archive: PathBuf,

    /// Destination directory
    #[arg(default_value = ".")]
    pub destination: PathBuf,
}

pub async fn execute(args: ExtractArgs, json_output: bool) -> NccResult<()> {
    let start_time = Instant::now();

    let entries = archive::extract(&args.archive, &args.destination)?;
    let files = entries.iter().filter(|e| e.kind == EntryKind::File).count();
    let duration = start_time.elapsed();

    if json_output {
        let paths: Vec<String> = entries
            .iter()
            .map(|e| e.relative_path.display().to_string())
            .collect();
        output::json(&serde_json::json!({
            "success": true,
            "destination": args.destination,
            "entries": paths,
            "duration_ms": duration.as_millis()
        }))?;
    } else {
        output::success(&format!(
            "Extracted {} files ({} entries) into {} in {}",
            files,
            entries.len(),
            args.destination.display(),
            format_duration(duration.as_millis())
        ));
    }

    Ok(())
}
