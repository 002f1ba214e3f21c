//! Upgradevisor CLI entry point.

use clap::Parser;

use upgradevisor::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => upgradevisor::cli::commands::run::execute(args, config_path).await,
        Commands::Config => upgradevisor::cli::commands::config::execute(config_path, cli.json),
        Commands::Version => {
            upgradevisor::cli::commands::version::execute(cli.json);
            Ok(())
        }
    };

    if let Err(err) = result {
        upgradevisor::cli::handle_error(err, cli.json);
    }
}
