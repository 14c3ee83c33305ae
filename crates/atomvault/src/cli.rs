//! CLI argument parsing with clap

use atomvault_api::DEFAULT_BASE_URL;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Atomvault - offline snapshots of Boomi AtomSphere accounts
#[derive(Parser, Debug)]
#[command(name = "atomvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every component in the account to local XML files
    Export(ExportArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// AtomSphere account identifier
    #[arg(long, env = "BOOMI_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Platform username
    #[arg(long, env = "BOOMI_USERNAME")]
    pub username: Option<String>,

    /// API token for the user
    #[arg(long, env = "BOOMI_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Root directory for the exported tree
    #[arg(short, long, default_value = "boomi-export")]
    pub output: Utf8PathBuf,

    /// Platform API root (non-production pods, testing)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum in-flight component fetches
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Timeout per remote call, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
