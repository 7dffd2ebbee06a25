//! regview: inspect Windows Registry state.
//!
//! Offline mode parses a registry hive file (the regf binary format) into
//! a key tree from first principles and exports it as pretty-printed JSON;
//! live mode browses the running system's registry interactively through
//! the OS query API.

pub mod cli;
pub mod config;
pub mod errors;
pub mod exitcode;
pub mod export;
pub mod hive;
pub mod live;
pub mod model;
pub mod shell;
pub mod util;
