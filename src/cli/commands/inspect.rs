//! ncc inspect - Show package contents

use std::path::PathBuf;

use clap::Args;
use console::style;

use crate::cli::output;
use crate::core::NccResult;
use crate::package::Package;
use crate::utils::format_bytes;

#[derive(Args)]
pub struct InspectArgs {
    /// Package file
    pub package: PathBuf,

    /// Also verify component and resource checksums
    #[arg(long)]
    pub verify: bool,
}

pub async fn execute(args: InspectArgs, json_output: bool) -> NccResult<()> {
    let package = Package::load(&args.package)?;
    if args.verify {
        package.verify_integrity()?;
    }

    if json_output {
        let components: Vec<&str> = package.components.iter().map(|c| c.name.as_str()).collect();
        let resources: Vec<&str> = package.resources.iter().map(|r| r.name.as_str()).collect();
        let policies: Vec<_> = package.execution_units.iter().map(|u| &u.policy).collect();
        output::json(&serde_json::json!({
            "magic": package.magic.to_string(),
            "assembly": package.assembly,
            "metadata": package.metadata,
            "dependencies": package.dependencies,
            "components": components,
            "resources": resources,
            "execution_units": policies,
        }))?;
        return Ok(());
    }

    println!(
        "{} {}",
        output::package_version(package.name(), package.version()),
        style(package.magic.to_string()).dim()
    );
    println!("  compiler: {}", package.metadata.compiler_extension.extension);
    println!(
        "  flags: compressed={} encrypted={} installable={} executable={}",
        package.magic.compressed,
        package.magic.encrypted,
        package.magic.installable,
        package.magic.executable
    );
    output::divider();

    output::table_header(&["COMPONENT", "SIZE"]);
    for component in &package.components {
        println!("{}  {}", component.name, format_bytes(component.data.len() as u64));
    }

    if !package.resources.is_empty() {
        output::table_header(&["RESOURCE", "SIZE"]);
        for resource in &package.resources {
            println!("{}  {}", resource.name, format_bytes(resource.data.len() as u64));
        }
    }

    if !package.execution_units.is_empty() {
        output::table_header(&["EXECUTION POLICY", "RUNNER", "TARGET"]);
        for unit in &package.execution_units {
            println!("{}  {}  {}", unit.policy.name, unit.policy.runner, unit.policy.target);
        }
    }

    for dependency in &package.dependencies {
        println!(
            "depends on {}",
            output::package_version(&dependency.package_name, &dependency.version)
        );
    }

    if args.verify {
        output::success("All checksums valid");
    }

    Ok(())
}
