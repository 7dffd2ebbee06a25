//! Tree exporter: serializes a key tree to nested JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::model::{RegistryKey, ValueData, ValueSlot};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Render one value slot.
///
/// Text serializes natively, integers as JSON numbers, binary as lowercase
/// hex with no prefix or separator. A decode error becomes an inline
/// `"Error: ..."` marker string in the slot.
fn slot_to_value(slot: &ValueSlot) -> Value {
    match slot {
        Ok(ValueData::Text(s)) => Value::String(s.clone()),
        Ok(ValueData::Integer(n)) => Value::from(*n),
        Ok(ValueData::Binary(bytes)) => Value::String(hex::encode(bytes)),
        Err(e) => Value::String(format!("Error: {}", e)),
    }
}

/// Convert a key tree to its JSON document.
///
/// Pure transformation, no I/O. Post-order traversal with an explicit
/// stack, so document depth is bounded by heap, not the call stack. The
/// result is deterministic: value names in sorted map order, subkeys in
/// tree order.
#[instrument(level = "debug", skip(root), fields(keys = root.key_count()))]
pub fn tree_to_document(root: &RegistryKey) -> Value {
    // (node, visited): first visit schedules the children, second visit
    // assembles the node from the finished subtrees sitting on `done`.
    let mut stack: Vec<(&RegistryKey, bool)> = vec![(root, false)];
    let mut done: Vec<Value> = Vec::new();

    while let Some((node, visited)) = stack.pop() {
        if !visited {
            stack.push((node, true));
            for child in node.subkeys.iter().rev() {
                stack.push((child, false));
            }
        } else {
            let children = done.split_off(done.len() - node.subkeys.len());

            let mut values = Map::new();
            for (name, slot) in &node.values {
                values.insert(name.clone(), slot_to_value(slot));
            }

            let mut obj = Map::new();
            obj.insert("name".into(), Value::String(node.name.clone()));
            obj.insert("values".into(), Value::Object(values));
            obj.insert("subkeys".into(), Value::Array(children));
            done.push(Value::Object(obj));
        }
    }

    // The only subtree left is the root itself.
    done.pop().unwrap_or(Value::Null)
}

/// Write a document to `path` as pretty-printed UTF-8 JSON (4-space
/// indent), overwriting any existing file.
#[instrument(level = "debug", skip(doc))]
pub fn write_document(doc: &Value, path: &Path) -> ExportResult<()> {
    let file = File::create(path).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    doc.serialize(&mut serializer)?;

    writer.flush().map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
