use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level command line.
#[derive(Parser)]
#[command(name = "upgradevisor")]
#[command(about = "Upgradevisor - daemon upgrade supervisor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./upgradevisor.yaml)
    #[arg(short, long, global = true, env = "UPGRADEVISOR_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the daemon, installing upgrades it asks for
    Run(RunArgs),

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

/// Arguments of `upgradevisor run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Arguments passed through to the daemon
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
