//! CLI argument definitions using clap

use clap::{ArgAction, Parser, ValueHint};
use clap_complete::Shell;

/// Windows Registry inspection: offline hive parsing to JSON and live exploration
#[derive(Parser, Debug)]
#[command(name = "regview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Explore the live system registry interactively
    #[arg(long)]
    pub live: bool,

    /// Load an offline registry hive file
    #[arg(long, value_name = "HIVE_PATH", value_hint = ValueHint::FilePath)]
    pub load: Option<String>,

    /// Output file for the offline hive structure [default: registry_output.json]
    #[arg(long, value_name = "OUTPUT_FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<String>,

    /// Raise log verbosity (-d: info, -dd: debug, -ddd: trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count)]
    pub debug: u8,

    /// Generate shell completions
    #[arg(long = "generate", value_enum, value_name = "SHELL")]
    pub generator: Option<Shell>,
}
