//! Live registry adapter: thin pass-through to the OS registry query API.
//!
//! The OS owns this facility; we only open a key, enumerate, and release
//! the handle again before returning. Nothing here holds a handle across
//! user input.

use thiserror::Error;

/// The fixed set of root registry namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootHive {
    LocalMachine,
    CurrentUser,
    Users,
    ClassesRoot,
    CurrentConfig,
}

impl RootHive {
    pub const ALL: [RootHive; 5] = [
        RootHive::LocalMachine,
        RootHive::CurrentUser,
        RootHive::Users,
        RootHive::ClassesRoot,
        RootHive::CurrentConfig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RootHive::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootHive::CurrentUser => "HKEY_CURRENT_USER",
            RootHive::Users => "HKEY_USERS",
            RootHive::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootHive::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }

    /// Resolve a 1-based menu index as displayed to the user.
    pub fn from_index(index: usize) -> Option<RootHive> {
        if (1..=Self::ALL.len()).contains(&index) {
            Some(Self::ALL[index - 1])
        } else {
            None
        }
    }
}

impl std::fmt::Display for RootHive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One value entry as reported by the OS, already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveValue {
    /// Value name (empty string for the default value)
    pub name: String,
    /// Display rendering of the data
    pub data: String,
    /// Registry type name, e.g. `REG_SZ`
    pub kind: String,
}

#[derive(Error, Debug)]
pub enum LiveError {
    #[error("registry key not found: {root}\\{path}")]
    KeyNotFound { root: RootHive, path: String },

    #[error("permission denied opening {root}\\{path} (try running as Administrator)")]
    AccessDenied { root: RootHive, path: String },

    #[error("live registry exploration requires Windows")]
    Unsupported,

    #[error("registry operation failed on {root}\\{path}: {source}")]
    Os {
        root: RootHive,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type LiveResult<T> = Result<T, LiveError>;

/// The three OS-provided operations this tool consumes.
///
/// Implementations open the key, enumerate in the OS-defined stable order,
/// and release the handle before returning. Permission failures are
/// reported, never retried.
pub trait RegistryApi {
    /// Immediate subkey names of `path` under `root` (empty path = root).
    fn subkey_names(&self, root: RootHive, path: &str) -> LiveResult<Vec<String>>;

    /// Immediate value entries of `path` under `root`.
    fn value_entries(&self, root: RootHive, path: &str) -> LiveResult<Vec<LiveValue>>;
}

/// Adapter over the running system's registry.
#[derive(Debug, Default)]
pub struct SystemRegistry;

impl SystemRegistry {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod windows {
    use super::*;
    use std::io;
    use winreg::enums::{
        HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS,
        KEY_READ,
    };
    use winreg::{RegKey, HKEY};

    fn hkey(root: RootHive) -> HKEY {
        match root {
            RootHive::LocalMachine => HKEY_LOCAL_MACHINE,
            RootHive::CurrentUser => HKEY_CURRENT_USER,
            RootHive::Users => HKEY_USERS,
            RootHive::ClassesRoot => HKEY_CLASSES_ROOT,
            RootHive::CurrentConfig => HKEY_CURRENT_CONFIG,
        }
    }

    fn map_err(root: RootHive, path: &str, err: io::Error) -> LiveError {
        match err.kind() {
            io::ErrorKind::NotFound => LiveError::KeyNotFound {
                root,
                path: path.to_string(),
            },
            io::ErrorKind::PermissionDenied => LiveError::AccessDenied {
                root,
                path: path.to_string(),
            },
            _ => LiveError::Os {
                root,
                path: path.to_string(),
                source: err,
            },
        }
    }

    fn open(root: RootHive, path: &str) -> LiveResult<RegKey> {
        RegKey::predef(hkey(root))
            .open_subkey_with_flags(path, KEY_READ)
            .map_err(|e| map_err(root, path, e))
    }

    impl RegistryApi for SystemRegistry {
        fn subkey_names(&self, root: RootHive, path: &str) -> LiveResult<Vec<String>> {
            let key = open(root, path)?;
            key.enum_keys()
                .collect::<io::Result<Vec<String>>>()
                .map_err(|e| map_err(root, path, e))
            // handle released on drop, before the next prompt
        }

        fn value_entries(&self, root: RootHive, path: &str) -> LiveResult<Vec<LiveValue>> {
            let key = open(root, path)?;
            let mut entries = Vec::new();
            for item in key.enum_values() {
                let (name, value) = item.map_err(|e| map_err(root, path, e))?;
                let kind = crate::hive::type_name(value.vtype as u32).to_string();
                entries.push(LiveValue {
                    name,
                    data: value.to_string(),
                    kind,
                });
            }
            Ok(entries)
        }
    }
}

#[cfg(not(windows))]
impl RegistryApi for SystemRegistry {
    fn subkey_names(&self, _root: RootHive, _path: &str) -> LiveResult<Vec<String>> {
        Err(LiveError::Unsupported)
    }

    fn value_entries(&self, _root: RootHive, _path: &str) -> LiveResult<Vec<LiveValue>> {
        Err(LiveError::Unsupported)
    }
}
