//! ncc command line entry point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ncc::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Extract(args) => cli::commands::extract::execute(args, json_output).await,
        Commands::Inspect(args) => cli::commands::inspect::execute(args, json_output).await,
        Commands::Build(args) => cli::commands::build::execute(args, json_output).await,
        Commands::Install(args) => cli::commands::install::execute(args, json_output).await,
        Commands::Uninstall(args) => cli::commands::uninstall::execute(args, json_output).await,
        Commands::List(args) => cli::commands::list::execute(args, json_output).await,
        Commands::Fetch(args) => cli::commands::fetch::execute(args, json_output).await,
    };

    if let Err(e) = result {
        if json_output {
            let error_json = serde_json::json!({
                "error": true,
                "message": e.to_string(),
                "code": e.exit_code()
            });
            eprintln!("{}", error_json);
        } else {
            eprintln!("{} {}", console::style("error:").red().bold(), e);
        }
        std::process::exit(e.exit_code());
    }
}
