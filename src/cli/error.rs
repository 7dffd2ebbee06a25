//! CLI-level errors (top-level error type, mapped to exit codes)

use thiserror::Error;

use crate::errors::HiveError;
use crate::exitcode;
use crate::export::ExportError;
use crate::live::LiveError;

/// CLI errors are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Hive(#[from] HiveError),

    #[error("{0}")]
    Live(#[from] LiveError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Hive(e) => match e {
                HiveError::FileNotFound(_) => exitcode::NOINPUT,
                HiveError::FileRead { .. } => exitcode::IOERR,
                HiveError::Format { .. } | HiveError::CellCycle(_) => exitcode::DATAERR,
            },
            CliError::Live(e) => match e {
                LiveError::AccessDenied { .. } => exitcode::NOPERM,
                LiveError::KeyNotFound { .. } => exitcode::NOINPUT,
                LiveError::Unsupported => exitcode::UNAVAILABLE,
                LiveError::Os { .. } => exitcode::IOERR,
            },
            CliError::Export(e) => match e {
                ExportError::Write { .. } => exitcode::CANTCREAT,
                ExportError::Serialize(_) => exitcode::SOFTWARE,
            },
            CliError::Config(_) => exitcode::CONFIG,
        }
    }
}
