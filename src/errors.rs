use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HiveError {
    #[error("hive file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read hive file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a valid registry hive: {reason} (offset {offset:#x})")]
    Format { offset: u64, reason: String },

    #[error("cell reference cycle detected at hive offset {0:#x}")]
    CellCycle(u32),
}

impl HiveError {
    /// Format error at a hive-data-relative cell offset.
    pub fn format_at(offset: u32, reason: impl Into<String>) -> Self {
        Self::Format {
            offset: offset as u64,
            reason: reason.into(),
        }
    }
}

pub type HiveResult<T> = Result<T, HiveError>;
