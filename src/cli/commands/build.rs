//! ncc build - Compile a directory into a package file

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, ValueEnum};

use crate::cli::output;
use crate::core::{NccError, NccResult};
use crate::installer::{DirectoryCompiler, PackageCompiler};
use crate::package::{Assembly, CompilerExtension, Encoder, ExecutionPolicy, PACKAGE_EXTENSION};
use crate::utils::{format_bytes, format_duration, is_valid_package_name};

#[derive(Clone, Copy, ValueEnum)]
pub enum EncoderArg {
    Cbor,
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source directory
    #[arg(default_value = ".")]
    pub source: PathBuf,

    /// Package name in reverse-domain form (e.g. com.example.lib)
    #[arg(long)]
    pub package: String,

    /// Assembly display name (defaults to the package name)
    #[arg(long)]
    pub name: Option<String>,

    /// Package version
    #[arg(id = "package_version", long = "package-version", default_value = "1.0.0")]
    pub version: String,

    /// Compiler extension; its files become components
    #[arg(long, default_value = "php")]
    pub extension: String,

    /// Additional component file extensions
    #[arg(long = "component-ext")]
    pub component_extensions: Vec<String>,

    /// Execution policy as NAME:RUNNER:TARGET (repeatable)
    #[arg(long = "policy")]
    pub policies: Vec<String>,

    /// Main execution policy
    #[arg(long)]
    pub main: Option<String>,

    /// Payload encoder
    #[arg(long, value_enum, default_value = "cbor")]
    pub encoder: EncoderArg,

    /// Gzip the payload
    #[arg(long)]
    pub compress: bool,

    /// Output file (defaults to <package>.ncc)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Parse `NAME:RUNNER:TARGET`
fn parse_policy(value: &str) -> NccResult<ExecutionPolicy> {
    let mut parts = value.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(runner), Some(target))
            if !name.is_empty() && !runner.is_empty() && !target.is_empty() =>
        {
            Ok(ExecutionPolicy::new(name, runner, target))
        }
        _ => Err(NccError::invalid_argument(format!(
            "Invalid execution policy '{}', expected NAME:RUNNER:TARGET",
            value
        ))),
    }
}

pub async fn execute(args: BuildArgs, json_output: bool) -> NccResult<()> {
    let start_time = Instant::now();

    if !is_valid_package_name(&args.package) {
        return Err(NccError::invalid_argument(format!(
            "Invalid package name '{}', expected reverse-domain form such as com.example.lib",
            args.package
        )));
    }

    let name = args.name.clone().unwrap_or_else(|| args.package.clone());
    let mut compiler = DirectoryCompiler::new(
        &args.source,
        Assembly::new(name, args.package.clone(), args.version.clone()),
        CompilerExtension::new(args.extension.clone()),
    );
    if !args.component_extensions.is_empty() {
        let mut extensions = args.component_extensions.clone();
        extensions.push(args.extension.clone());
        compiler = compiler.with_component_extensions(extensions);
    }
    for policy in &args.policies {
        compiler = compiler.with_execution_policy(parse_policy(policy)?);
    }

    {
        let package = compiler.package_mut();
        package.metadata.main_execution_policy = args.main.clone();
        package.magic.compressed = args.compress;
        package.magic.encoder = match args.encoder {
            EncoderArg::Cbor => Encoder::Cbor,
            EncoderArg::Json => Encoder::Json,
        };
    }

    let package = compiler.build()?;
    if let Some(main) = &package.metadata.main_execution_policy {
        if package.execution_unit(main).is_none() {
            return Err(NccError::invalid_argument(format!(
                "Main execution policy '{}' is not declared",
                main
            )));
        }
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", args.package, PACKAGE_EXTENSION)));
    package.save(&output_path)?;

    let size = std::fs::metadata(&output_path)?.len();
    let duration = start_time.elapsed();

    if json_output {
        output::json(&serde_json::json!({
            "success": true,
            "output": output_path,
            "magic": package.magic.to_string(),
            "components": package.components.len(),
            "resources": package.resources.len(),
            "execution_units": package.execution_units.len(),
            "bytes": size,
            "duration_ms": duration.as_millis()
        }))?;
    } else {
        output::success(&format!(
            "Built {} -> {} ({}) in {}",
            output::package_version(package.name(), package.version()),
            output_path.display(),
            format_bytes(size),
            format_duration(duration.as_millis())
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        let policy = parse_policy("main:php:bin/main.php").unwrap();
        assert_eq!(policy.name, "main");
        assert_eq!(policy.runner, "php");
        assert_eq!(policy.target, "bin/main.php");

        assert!(parse_policy("main:php").is_err());
        assert!(parse_policy("::x").is_err());
    }
}
