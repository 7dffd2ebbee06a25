//! Interactive shell over the live registry.
//!
//! The transition logic (command parsing, cursor movement, hive selection)
//! is plain data-in/data-out so it can be exercised without a terminal;
//! `run_shell` is the single top-level driver that owns the blocking
//! read-eval loop. No transition terminates the process — every step
//! returns a typed outcome.

use std::io::BufRead;

use regex::Regex;
use tracing::debug;

use crate::cli::output;
use crate::live::{LiveError, LiveResult, RegistryApi, RootHive};

/// The interactive session's position under the chosen root hive.
///
/// Empty means the hive root. Lives only for the duration of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    segments: Vec<String>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Descend into a child key.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Pop the last segment; no-op at root.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Backslash-joined path, empty at root.
    pub fn path(&self) -> String {
        self.segments.join("\\")
    }

    /// Path of a child of the current position.
    pub fn child_path(&self, name: &str) -> String {
        if self.is_root() {
            name.to_string()
        } else {
            format!("{}\\{}", self.path(), name)
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("Root")
        } else {
            f.write_str(&self.path())
        }
    }
}

/// Parsed browse command. Indices are 1-based as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Descend(usize),
    ShowValues(usize),
    Back,
    Exit,
    Invalid(String),
}

/// Parser for browse-loop commands.
pub struct CommandParser {
    enter_re: Regex,
    values_re: Regex,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            enter_re: Regex::new(r"^(?:enter\s+)?(\d+)$").unwrap(),
            values_re: Regex::new(r"^values\s+(\d+)$").unwrap(),
        }
    }

    pub fn parse(&self, input: &str) -> Transition {
        let input = input.trim().to_lowercase();
        match input.as_str() {
            "exit" => return Transition::Exit,
            "back" => return Transition::Back,
            _ => {}
        }
        if let Some(caps) = self.enter_re.captures(&input) {
            if let Ok(n) = caps[1].parse::<usize>() {
                return Transition::Descend(n);
            }
        }
        if let Some(caps) = self.values_re.captures(&input) {
            if let Ok(n) = caps[1].parse::<usize>() {
                return Transition::ShowValues(n);
            }
        }
        if input.starts_with("values") {
            return Transition::Invalid("Invalid command. Use: values <number>".into());
        }
        Transition::Invalid("Invalid input. Try again.".into())
    }
}

/// Result of the hive selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveChoice {
    Selected(RootHive),
    Exit,
    Invalid,
}

/// Interpret the hive menu input (1-based index, or `exit`).
pub fn select_hive(input: &str) -> HiveChoice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("exit") {
        return HiveChoice::Exit;
    }
    match input.parse::<usize>() {
        Ok(n) => match RootHive::from_index(n) {
            Some(root) => HiveChoice::Selected(root),
            None => HiveChoice::Invalid,
        },
        Err(_) => HiveChoice::Invalid,
    }
}

/// How the shell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOutcome {
    /// User exited (or input closed).
    Completed,
    /// The hive menu got an out-of-range or non-numeric choice; the browse
    /// loop was never entered.
    InvalidSelection,
}

fn read_line(input: &mut dyn BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf.trim().to_string()),
        Err(_) => None,
    }
}

/// Top-level interactive driver: hive menu, then the browse loop.
pub fn run_shell<R: RegistryApi>(api: &R, input: &mut dyn BufRead) -> LiveResult<ShellOutcome> {
    println!("Available Registry Hives:");
    for (idx, hive) in RootHive::ALL.iter().enumerate() {
        println!("{}. {}", idx + 1, hive.name());
    }
    output::prompt("Select a hive number to explore (or type 'exit' to quit):");

    let Some(line) = read_line(input) else {
        return Ok(ShellOutcome::Completed);
    };
    match select_hive(&line) {
        HiveChoice::Exit => Ok(ShellOutcome::Completed),
        HiveChoice::Invalid => {
            output::error("invalid choice");
            Ok(ShellOutcome::InvalidSelection)
        }
        HiveChoice::Selected(root) => {
            println!("\nYou selected: {}", root.name());
            browse(api, root, input)
        }
    }
}

/// The steady browsing state: list, prompt, apply one transition, repeat.
///
/// A key with no subkeys is just another browsable state; `values`, `back`
/// and `exit` all keep working there. Adapter failures abort only the
/// current action.
fn browse<R: RegistryApi>(
    api: &R,
    root: RootHive,
    input: &mut dyn BufRead,
) -> LiveResult<ShellOutcome> {
    let parser = CommandParser::new();
    let mut cursor = Cursor::new();

    loop {
        let subkeys = match api.subkey_names(root, &cursor.path()) {
            Ok(names) => names,
            Err(LiveError::Unsupported) => return Err(LiveError::Unsupported),
            Err(e) => {
                output::error(&e);
                Vec::new()
            }
        };

        if subkeys.is_empty() {
            println!("No subkeys under: {}", cursor);
        } else {
            println!("Subkeys under: {}", cursor);
            for (idx, name) in subkeys.iter().enumerate() {
                println!("  {}. {}", idx + 1, name);
            }
        }
        output::prompt(
            "Enter a subkey number to explore, 'values <number>' to list values, 'back' to go up, or 'exit' to quit:",
        );

        let Some(line) = read_line(input) else {
            return Ok(ShellOutcome::Completed);
        };
        match parser.parse(&line) {
            Transition::Exit => {
                println!("Exiting.");
                return Ok(ShellOutcome::Completed);
            }
            Transition::Back => cursor.pop(),
            Transition::Descend(n) => {
                if n >= 1 && n <= subkeys.len() {
                    debug!("descending into {}", subkeys[n - 1]);
                    cursor.push(subkeys[n - 1].clone());
                } else {
                    output::error("Invalid choice. Try again.");
                }
            }
            Transition::ShowValues(n) => {
                if n >= 1 && n <= subkeys.len() {
                    let target = cursor.child_path(&subkeys[n - 1]);
                    show_values(api, root, &target)?;
                } else {
                    output::error("Invalid key number. Try again.");
                }
            }
            Transition::Invalid(msg) => output::error(&msg),
        }
    }
}

fn show_values<R: RegistryApi>(api: &R, root: RootHive, path: &str) -> LiveResult<()> {
    match api.value_entries(root, path) {
        Ok(entries) => {
            println!("Values under: {}", path);
            if entries.is_empty() {
                println!("  (no values)");
            }
            for entry in entries {
                let name = if entry.name.is_empty() {
                    "(Default)"
                } else {
                    &entry.name
                };
                println!("  {}: {} ({})", name, entry.data, entry.kind);
            }
            Ok(())
        }
        Err(LiveError::Unsupported) => Err(LiveError::Unsupported),
        Err(e) => {
            output::error(&e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_enter_then_back_restores_root() {
        let mut cursor = Cursor::new();
        assert!(cursor.is_root());
        cursor.push("Software");
        assert_eq!(cursor.path(), "Software");
        cursor.pop();
        assert!(cursor.is_root());
        assert_eq!(cursor, Cursor::new());
    }

    #[test]
    fn test_cursor_back_at_root_is_noop() {
        let mut cursor = Cursor::new();
        cursor.pop();
        assert!(cursor.is_root());
    }

    #[test]
    fn test_cursor_paths() {
        let mut cursor = Cursor::new();
        assert_eq!(cursor.child_path("Software"), "Software");
        cursor.push("Software");
        cursor.push("Vendor");
        assert_eq!(cursor.path(), "Software\\Vendor");
        assert_eq!(cursor.child_path("App"), "Software\\Vendor\\App");
        assert_eq!(cursor.to_string(), "Software\\Vendor");
    }

    #[test]
    fn test_parse_descend_forms() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("3"), Transition::Descend(3));
        assert_eq!(parser.parse("enter 3"), Transition::Descend(3));
        assert_eq!(parser.parse("  ENTER 12 "), Transition::Descend(12));
    }

    #[test]
    fn test_parse_values() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("values 2"), Transition::ShowValues(2));
        assert!(matches!(parser.parse("values"), Transition::Invalid(_)));
        assert!(matches!(parser.parse("values x"), Transition::Invalid(_)));
    }

    #[test]
    fn test_parse_keywords() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("back"), Transition::Back);
        assert_eq!(parser.parse("EXIT"), Transition::Exit);
        assert!(matches!(parser.parse("bogus"), Transition::Invalid(_)));
    }

    #[test]
    fn test_select_hive() {
        assert_eq!(select_hive("1"), HiveChoice::Selected(RootHive::LocalMachine));
        assert_eq!(select_hive(" 5 "), HiveChoice::Selected(RootHive::CurrentConfig));
        assert_eq!(select_hive("exit"), HiveChoice::Exit);
        assert_eq!(select_hive("6"), HiveChoice::Invalid);
        assert_eq!(select_hive("zero"), HiveChoice::Invalid);
    }
}
