//! Offline registry hive parsing (the regf on-disk format).

pub mod format;
pub mod reader;

pub use format::{decode_value, type_name};
pub use reader::{HiveFile, KeyNode};
