//! Path helpers

use std::path::PathBuf;

/// Expand `~` and `$VAR` references in a user-supplied path.
///
/// Falls back to the raw string when expansion fails (e.g. an unset
/// variable); the subsequent open reports the real error.
pub fn expand(raw: &str) -> PathBuf {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .unwrap_or_else(|_| PathBuf::from(raw))
}
