//! ncc fetch - Resolve where a package can be downloaded from

use std::path::PathBuf;

use clap::Args;

use crate::cli::output;
use crate::core::NccResult;
use crate::package::PackageSource;
use crate::registry::{FetchOptions, ResultKind};

#[derive(Args)]
pub struct FetchArgs {
    /// Package source, e.g. nosial/libs.config=1.0.0@github
    pub source: String,

    /// Resolve a prebuilt .ncc package instead of a source archive
    #[arg(long)]
    pub package: bool,

    /// Prefer statically linked package assets
    #[arg(long = "prefer-static")]
    pub prefer_static: bool,

    /// Data directory (defaults to the per-user data directory)
    #[arg(long, env = "NCC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

pub async fn execute(args: FetchArgs, json_output: bool) -> NccResult<()> {
    let source: PackageSource = args.source.parse()?;
    let engine = super::engine(args.data_dir.as_ref())?;

    let kind = if args.package {
        ResultKind::NccPackage
    } else {
        ResultKind::SourceArchive
    };
    let options = FetchOptions {
        prefer_static: args.prefer_static,
    };

    let progress = if !json_output {
        Some(output::spinner(&format!("Resolving {}...", source)))
    } else {
        None
    };
    let result = engine.fetch(&source, kind, &options).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    if json_output {
        output::json(&result)?;
    } else {
        output::success(&format!(
            "{} {} ({})",
            output::package_version(&source.name, &result.version),
            result.url,
            result.kind
        ));
    }

    Ok(())
}
