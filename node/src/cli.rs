//! # CLI Interface
//!
//! Defines the command-line argument structure for `mintdesk-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `status`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mintdesk sale desk node.
///
/// Runs the capped-issuance token desk: serves the REST API for transfers,
/// purchases, and withdrawals, persists desk state to disk, and exposes
/// Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "mintdesk-node",
    about = "Mintdesk sale desk node",
    version,
    propagate_version = true
)]
pub struct MintdeskCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the mintdesk node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the desk node.
    Run(RunArgs),
    /// Initialize a new desk — creates the data directory and persists
    /// the genesis desk state.
    Init(InitArgs),
    /// Query the status of a running node via its API endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node data directory where desk state is stored.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "MINTDESK_DATA_DIR", default_value = "~/.mintdesk")]
    pub data_dir: PathBuf,

    /// Port for the REST API.
    #[arg(long, env = "MINTDESK_API_PORT", default_value_t = 8745)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MINTDESK_METRICS_PORT", default_value_t = 8746)]
    pub metrics_port: u16,

    /// Owner account for a freshly created desk.
    ///
    /// Ignored when the data directory already holds desk state — the
    /// persisted owner wins.
    #[arg(long, env = "MINTDESK_OWNER", default_value = "owner")]
    pub owner: String,

    /// Supply cap for a freshly created desk.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_SUPPLY_CAP)]
    pub cap: u64,

    /// Exchange rate (tokens per payment unit) for a freshly created desk.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_EXCHANGE_RATE)]
    pub rate: u64,

    /// Initial supply pre-minted to the owner on a freshly created desk.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_INITIAL_SUPPLY)]
    pub initial_supply: u64,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "MINTDESK_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "MINTDESK_DATA_DIR", default_value = "~/.mintdesk")]
    pub data_dir: PathBuf,

    /// Owner account for the new desk.
    #[arg(long, env = "MINTDESK_OWNER", default_value = "owner")]
    pub owner: String,

    /// Supply cap for the new desk.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_SUPPLY_CAP)]
    pub cap: u64,

    /// Exchange rate (tokens per payment unit) for the new desk.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_EXCHANGE_RATE)]
    pub rate: u64,

    /// Initial supply pre-minted to the owner.
    #[arg(long, default_value_t = mintdesk_core::config::DEFAULT_INITIAL_SUPPLY)]
    pub initial_supply: u64,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// API endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:8745")]
    pub api_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        MintdeskCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_desk_constants() {
        let cli = MintdeskCli::parse_from(["mintdesk-node", "run"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.cap, 1_080_000);
                assert_eq!(args.rate, 8);
                assert_eq!(args.initial_supply, 1_000_000);
                assert_eq!(args.owner, "owner");
            }
            _ => panic!("expected run subcommand"),
        }
    }
}
