//! CLI module for ncc
//!
//! Provides command-line interface using clap.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::*;

/// ncc - package container tool and package manager
#[derive(Parser)]
#[command(name = "ncc")]
#[command(author = "ncc Contributors")]
#[command(version)]
#[command(about = "Build, inspect, fetch and install ncc packages", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a tar (optionally gzip/bzip2 compressed) or zip archive
    #[command(visible_alias = "x")]
    Extract(extract::ExtractArgs),

    /// Show the contents of a package file
    Inspect(inspect::InspectArgs),

    /// Build a package from a source directory
    #[command(visible_alias = "b")]
    Build(build::BuildArgs),

    /// Install a package file
    #[command(visible_alias = "i")]
    Install(install::InstallArgs),

    /// Uninstall an installed package version
    #[command(visible_aliases = ["rm", "remove"])]
    Uninstall(uninstall::UninstallArgs),

    /// List installed packages
    #[command(visible_alias = "ls")]
    List(list::ListArgs),

    /// Resolve a download URL for a package source (vendor/name=version@repository)
    Fetch(fetch::FetchArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from(["ncc", "--json", "fetch", "nosial/libs@github", "--package"]);
        assert!(cli.json);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.source, "nosial/libs@github");
                assert!(args.package);
            }
            _ => panic!("expected fetch"),
        }
    }
}
