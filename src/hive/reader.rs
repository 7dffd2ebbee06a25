//! Offline hive reader: resolves cells from the raw file bytes into key
//! nodes and value records, with no help from the OS registry API.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::errors::{HiveError, HiveResult};
use crate::hive::format::{
    decode_value, read_utf16le_string, BASE_BLOCK_SIZE, KEY_COMP_NAME, LF_SIGNATURE,
    LH_SIGNATURE, LI_SIGNATURE, NK_FLAGS, NK_NAME_LENGTH, NK_NAME_START, NK_SIGNATURE,
    NK_SUBKEY_COUNT, NK_SUBKEY_LIST, NK_VALUE_COUNT, NK_VALUE_LIST, NO_CELL, REGF_HIVE_LENGTH,
    REGF_NAME, REGF_NAME_MAX, REGF_ROOT_CELL, REGF_SIGNATURE, RI_SIGNATURE, VALUE_COMP_NAME,
    VK_DATA_LENGTH, VK_DATA_OFFSET, VK_DATA_RESIDENT, VK_FLAGS, VK_NAME_LENGTH, VK_NAME_START,
    VK_SIGNATURE, VK_TYPE,
};
use crate::model::{RegistryKey, ValueDecodeError, ValueSlot};

/// Upper bound on list entry counts; anything beyond this is corruption.
const MAX_LIST_ENTRIES: usize = 10_000;

/// A parsed key node (NK record).
#[derive(Debug, Clone)]
pub struct KeyNode {
    /// Cell offset relative to the hive data base.
    pub cell_offset: u32,
    /// Key name.
    pub name: String,
    /// NK flags.
    pub flags: u16,
    /// Number of subkeys the record declares.
    pub subkey_count: u32,
    /// Subkey list cell offset, `NO_CELL` if none.
    pub subkey_list_offset: u32,
    /// Number of values the record declares.
    pub value_count: u32,
    /// Value list cell offset, `NO_CELL` if none.
    pub value_list_offset: u32,
}

/// An opened hive file.
///
/// The file is read into memory once at open time; no handle is kept.
/// All accessors are read-only.
#[derive(Debug)]
pub struct HiveFile {
    data: Vec<u8>,
    hive_length: u32,
    root_cell_offset: u32,
    embedded_name: String,
}

impl HiveFile {
    /// Open and validate a hive file.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> HiveResult<Self> {
        if !path.exists() {
            return Err(HiveError::FileNotFound(path.to_path_buf()));
        }
        let data = fs::read(path).map_err(|source| HiveError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let hive = Self::from_bytes(data)?;
        debug!(
            "opened hive '{}' ({} bytes of hive data)",
            hive.embedded_name, hive.hive_length
        );
        Ok(hive)
    }

    /// Validate the base block and construct a reader over raw hive bytes.
    pub fn from_bytes(data: Vec<u8>) -> HiveResult<Self> {
        if data.len() < BASE_BLOCK_SIZE {
            return Err(HiveError::Format {
                offset: 0,
                reason: format!("file too small for a base block: {} bytes", data.len()),
            });
        }
        if &data[0..4] != REGF_SIGNATURE {
            return Err(HiveError::Format {
                offset: 0,
                reason: "missing regf signature".into(),
            });
        }

        let seq1 = u32::from_le_bytes(data[4..8].try_into().unwrap());
        let seq2 = u32::from_le_bytes(data[8..12].try_into().unwrap());
        if seq1 == 0 && seq2 == 0 {
            return Err(HiveError::Format {
                offset: 4,
                reason: "both sequence numbers are zero".into(),
            });
        }

        let root_cell_offset =
            u32::from_le_bytes(data[REGF_ROOT_CELL..REGF_ROOT_CELL + 4].try_into().unwrap());
        let hive_length = u32::from_le_bytes(
            data[REGF_HIVE_LENGTH..REGF_HIVE_LENGTH + 4]
                .try_into()
                .unwrap(),
        );
        if root_cell_offset == 0 || hive_length == 0 {
            return Err(HiveError::Format {
                offset: REGF_ROOT_CELL as u64,
                reason: "zero root cell offset or hive length".into(),
            });
        }
        if root_cell_offset >= hive_length {
            return Err(HiveError::Format {
                offset: REGF_ROOT_CELL as u64,
                reason: format!(
                    "root cell offset {:#x} exceeds hive length {:#x}",
                    root_cell_offset, hive_length
                ),
            });
        }

        // First hive bin sits right after the base block.
        if data.len() >= BASE_BLOCK_SIZE + 4
            && &data[BASE_BLOCK_SIZE..BASE_BLOCK_SIZE + 4] != crate::hive::format::HBIN_SIGNATURE
        {
            return Err(HiveError::Format {
                offset: BASE_BLOCK_SIZE as u64,
                reason: "missing hbin signature".into(),
            });
        }

        let name_end = std::cmp::min(REGF_NAME + REGF_NAME_MAX, data.len());
        let embedded_name = read_utf16le_string(&data[REGF_NAME..name_end]);

        Ok(Self {
            data,
            hive_length,
            root_cell_offset,
            embedded_name,
        })
    }

    /// Hive name embedded in the base block (e.g. `\REGISTRY\MACHINE\SAM`).
    pub fn embedded_name(&self) -> &str {
        &self.embedded_name
    }

    /// Bounds-checked slice of `len` bytes at a hive-data-relative offset.
    fn cell_bytes(&self, cell_offset: u32, len: usize) -> HiveResult<&[u8]> {
        if cell_offset >= self.hive_length {
            return Err(HiveError::format_at(
                cell_offset,
                format!(
                    "cell offset exceeds hive length {:#x}",
                    self.hive_length
                ),
            ));
        }
        let start = BASE_BLOCK_SIZE + cell_offset as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| HiveError::format_at(cell_offset, "cell length overflow"))?;
        if end > self.data.len() {
            return Err(HiveError::format_at(
                cell_offset,
                "cell extends past end of hive data",
            ));
        }
        Ok(&self.data[start..end])
    }

    /// The root key node of this hive.
    pub fn root_key(&self) -> HiveResult<KeyNode> {
        self.read_key_node(self.root_cell_offset)
    }

    /// Read a key node (NK record) at the given cell offset.
    pub fn read_key_node(&self, cell_offset: u32) -> HiveResult<KeyNode> {
        // Cell layout: i32 size | u16 "nk" | record fields | name bytes
        let cell = self.cell_bytes(cell_offset, 4 + NK_NAME_START)?;

        let sig = u16::from_le_bytes(cell[4..6].try_into().unwrap());
        if sig != NK_SIGNATURE {
            return Err(HiveError::format_at(
                cell_offset,
                format!("expected nk signature, got {:#06x}", sig),
            ));
        }

        // Record field offsets are relative to the signature.
        let nk = &cell[4..];
        let flags = u16::from_le_bytes(nk[NK_FLAGS..NK_FLAGS + 2].try_into().unwrap());
        let subkey_count =
            u32::from_le_bytes(nk[NK_SUBKEY_COUNT..NK_SUBKEY_COUNT + 4].try_into().unwrap());
        let subkey_list_offset =
            u32::from_le_bytes(nk[NK_SUBKEY_LIST..NK_SUBKEY_LIST + 4].try_into().unwrap());
        let value_count =
            u32::from_le_bytes(nk[NK_VALUE_COUNT..NK_VALUE_COUNT + 4].try_into().unwrap());
        let value_list_offset =
            u32::from_le_bytes(nk[NK_VALUE_LIST..NK_VALUE_LIST + 4].try_into().unwrap());
        let name_length =
            u16::from_le_bytes(nk[NK_NAME_LENGTH..NK_NAME_LENGTH + 2].try_into().unwrap()) as usize;

        let name = if name_length > 0 {
            let with_name = self.cell_bytes(cell_offset, 4 + NK_NAME_START + name_length)?;
            let name_bytes = &with_name[4 + NK_NAME_START..];
            if flags & KEY_COMP_NAME != 0 {
                String::from_utf8_lossy(name_bytes).into_owned()
            } else {
                read_utf16le_string(name_bytes)
            }
        } else {
            String::new()
        };

        Ok(KeyNode {
            cell_offset,
            name,
            flags,
            subkey_count,
            subkey_list_offset,
            value_count,
            value_list_offset,
        })
    }

    /// Enumerate the subkey nodes of a key, in hive order.
    ///
    /// A child cell that cannot be parsed is skipped (it has no place in the
    /// tree); structural damage to the list itself is an error.
    pub fn subkeys(&self, key: &KeyNode) -> HiveResult<Vec<KeyNode>> {
        if key.subkey_count == 0 || key.subkey_list_offset == NO_CELL {
            return Ok(Vec::new());
        }
        let offsets = self.subkey_list_offsets(key.subkey_list_offset)?;
        let mut subkeys = Vec::with_capacity(offsets.len());
        for off in offsets {
            match self.read_key_node(off) {
                Ok(node) => subkeys.push(node),
                Err(e) => debug!("skipping unreadable subkey cell at {:#x}: {}", off, e),
            }
        }
        Ok(subkeys)
    }

    /// Resolve a subkey list (lf/lh/li/ri record) into child NK offsets.
    ///
    /// ri index roots nest lists one level deep; resolution is a worklist
    /// queue so the sublists expand in declared order, with a seen-set to
    /// reject self-referencing lists in corrupt hives.
    fn subkey_list_offsets(&self, list_offset: u32) -> HiveResult<Vec<u32>> {
        let mut pending = VecDeque::from([list_offset]);
        let mut seen: HashSet<u32> = HashSet::new();
        let mut out = Vec::new();

        while let Some(offset) = pending.pop_front() {
            if !seen.insert(offset) {
                return Err(HiveError::CellCycle(offset));
            }
            // Cell layout: i32 size | u16 sig | u16 count | entries
            let header = self.cell_bytes(offset, 4 + 4)?;
            let sig = u16::from_le_bytes(header[4..6].try_into().unwrap());
            let count = u16::from_le_bytes(header[6..8].try_into().unwrap()) as usize;
            if count > MAX_LIST_ENTRIES || out.len() + count > MAX_LIST_ENTRIES {
                return Err(HiveError::format_at(
                    offset,
                    format!("subkey list count {} is unreasonably large", count),
                ));
            }

            match sig {
                LF_SIGNATURE | LH_SIGNATURE => {
                    // Entries are (u32 offset, u32 name hash) pairs.
                    let data = self.cell_bytes(offset, 8 + count * 8)?;
                    for i in 0..count {
                        let base = 8 + i * 8;
                        out.push(u32::from_le_bytes(data[base..base + 4].try_into().unwrap()));
                    }
                }
                LI_SIGNATURE => {
                    // Entries are bare u32 offsets.
                    let data = self.cell_bytes(offset, 8 + count * 4)?;
                    for i in 0..count {
                        let base = 8 + i * 4;
                        out.push(u32::from_le_bytes(data[base..base + 4].try_into().unwrap()));
                    }
                }
                RI_SIGNATURE => {
                    // Entries are offsets of further lf/lh/li lists.
                    let data = self.cell_bytes(offset, 8 + count * 4)?;
                    for i in 0..count {
                        let base = 8 + i * 4;
                        pending.push_back(u32::from_le_bytes(
                            data[base..base + 4].try_into().unwrap(),
                        ));
                    }
                }
                _ => {
                    return Err(HiveError::format_at(
                        offset,
                        format!("unknown subkey list signature {:#06x}", sig),
                    ));
                }
            }
        }

        Ok(out)
    }

    /// Enumerate the value entries of a key as (name, slot) pairs.
    ///
    /// A value whose payload cannot be interpreted gets an inline error
    /// marker in its slot; a VK record too damaged to even yield a name is
    /// skipped with a log line.
    pub fn values(&self, key: &KeyNode) -> HiveResult<Vec<(String, ValueSlot)>> {
        if key.value_count == 0 || key.value_list_offset == NO_CELL {
            return Ok(Vec::new());
        }
        let count = key.value_count as usize;
        if count > MAX_LIST_ENTRIES {
            return Err(HiveError::format_at(
                key.value_list_offset,
                format!("value count {} is unreasonably large", count),
            ));
        }

        // The value list is a cell holding an array of u32 VK offsets.
        let list = self.cell_bytes(key.value_list_offset, 4 + count * 4)?;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let base = 4 + i * 4;
            let vk_offset = u32::from_le_bytes(list[base..base + 4].try_into().unwrap());
            match self.read_value(vk_offset) {
                Ok(entry) => out.push(entry),
                Err(e) => debug!("skipping unreadable value record at {:#x}: {}", vk_offset, e),
            }
        }
        Ok(out)
    }

    /// Read a single value (VK record) into a (name, slot) pair.
    fn read_value(&self, cell_offset: u32) -> HiveResult<(String, ValueSlot)> {
        // Cell layout: i32 size | u16 "vk" | record fields | name bytes
        let header = self.cell_bytes(cell_offset, 4 + VK_NAME_START)?;

        let sig = u16::from_le_bytes(header[4..6].try_into().unwrap());
        if sig != VK_SIGNATURE {
            return Err(HiveError::format_at(
                cell_offset,
                format!("expected vk signature, got {:#06x}", sig),
            ));
        }

        let vk = &header[4..];
        let name_length =
            u16::from_le_bytes(vk[VK_NAME_LENGTH..VK_NAME_LENGTH + 2].try_into().unwrap()) as usize;
        let data_length_raw =
            u32::from_le_bytes(vk[VK_DATA_LENGTH..VK_DATA_LENGTH + 4].try_into().unwrap());
        let data_offset =
            u32::from_le_bytes(vk[VK_DATA_OFFSET..VK_DATA_OFFSET + 4].try_into().unwrap());
        let value_type = u32::from_le_bytes(vk[VK_TYPE..VK_TYPE + 4].try_into().unwrap());
        let vk_flags = u16::from_le_bytes(vk[VK_FLAGS..VK_FLAGS + 2].try_into().unwrap());

        // Empty name means the key's (Default) value.
        let name = if name_length > 0 {
            let with_name = self.cell_bytes(cell_offset, 4 + VK_NAME_START + name_length)?;
            let name_bytes = &with_name[4 + VK_NAME_START..];
            if vk_flags & VALUE_COMP_NAME != 0 {
                String::from_utf8_lossy(name_bytes).into_owned()
            } else {
                read_utf16le_string(name_bytes)
            }
        } else {
            String::new()
        };

        // Bit 31 of the data length marks data resident in the offset field.
        let resident = data_length_raw & VK_DATA_RESIDENT != 0;
        let data_length = (data_length_raw & !VK_DATA_RESIDENT) as usize;

        let slot = if data_length == 0 {
            decode_value(value_type, &[])
        } else if resident {
            let inline_len = std::cmp::min(data_length, 4);
            decode_value(value_type, &data_offset.to_le_bytes()[..inline_len])
        } else {
            // An unreadable data cell poisons only this slot.
            match self.cell_bytes(data_offset, 4 + data_length) {
                Ok(cell) => decode_value(value_type, &cell[4..]),
                Err(e) => Err(ValueDecodeError::new(e.to_string())),
            }
        };

        Ok((name, slot))
    }

    /// Materialize the full key tree.
    ///
    /// Depth-first with an explicit stack, so hive depth never grows the
    /// call stack. A repeated NK offset on the path means the hive is
    /// corrupt and aborts the read.
    #[instrument(level = "debug", skip(self))]
    pub fn read_tree(&self) -> HiveResult<RegistryKey> {
        let root = self.root_key()?;

        let mut visited: HashSet<u32> = HashSet::new();
        // Flat pre-order list; every child lands at a higher index than its
        // parent, so a reverse sweep completes children before parents.
        let mut nodes: Vec<(Option<RegistryKey>, Option<usize>)> = Vec::new();
        let mut stack: Vec<(KeyNode, Option<usize>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            if !visited.insert(node.cell_offset) {
                return Err(HiveError::CellCycle(node.cell_offset));
            }
            let mut key = RegistryKey::new(node.name.clone());
            for (name, slot) in self.values(&node)? {
                key.values.insert(name, slot);
            }
            let idx = nodes.len();
            let children = self.subkeys(&node)?;
            nodes.push((Some(key), parent));
            for child in children {
                stack.push((child, Some(idx)));
            }
        }

        for i in (1..nodes.len()).rev() {
            let Some(key) = nodes[i].0.take() else { continue };
            let Some(parent) = nodes[i].1 else { continue };
            if let Some(parent_key) = nodes[parent].0.as_mut() {
                parent_key.subkeys.push(key);
            }
        }

        nodes[0]
            .0
            .take()
            .ok_or_else(|| HiveError::format_at(self.root_cell_offset, "empty key tree"))
    }
}
