use std::io;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::cli::args::Cli;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config;
use crate::export;
use crate::hive::HiveFile;
use crate::live::SystemRegistry;
use crate::shell::{run_shell, ShellOutcome};
use crate::util::path::expand;

/// Dispatch the selected mode. `--live` takes precedence over `--load`;
/// with neither, print usage and succeed.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if cli.live {
        return _live();
    }
    if let Some(hive_path) = &cli.load {
        return _load(hive_path, cli.output.as_deref());
    }
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    println!();
    Ok(())
}

#[instrument]
fn _load(hive_path: &str, output: Option<&str>) -> CliResult<()> {
    let settings = config::load()?;
    let path = expand(hive_path);

    let hive = HiveFile::open(&path)?;
    debug!("embedded hive name: '{}'", hive.embedded_name());

    let tree = hive.read_tree()?;
    debug!("parsed {} keys, depth {}", tree.key_count(), tree.depth());

    let doc = export::tree_to_document(&tree);
    let out = match output {
        Some(raw) => expand(raw),
        None => settings.default_output,
    };
    export::write_document(&doc, &out)?;

    output::info(&format!("Registry hive data saved to {}", out.display()));
    Ok(())
}

#[instrument]
fn _live() -> CliResult<()> {
    let api = SystemRegistry::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    match run_shell(&api, &mut input)? {
        ShellOutcome::Completed => Ok(()),
        ShellOutcome::InvalidSelection => {
            Err(CliError::Usage("invalid hive selection".into()))
        }
    }
}
