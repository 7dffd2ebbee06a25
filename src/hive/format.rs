//! On-disk layout of the regf hive format.
//!
//! ```text
//! +0x0000  base block ("regf" signature, 4096 bytes)
//!   +0x0004  Sequence1 (u32)
//!   +0x0008  Sequence2 (u32)
//!   +0x0024  RootCellOffset (u32) — offset of root NK cell within hive data
//!   +0x0028  HiveLength (u32) — total hive data length
//!   +0x0030  hive name (UTF-16LE, up to 255 wchars)
//! +0x1000  hive bins ("hbin" signature), each holding cells
//!   A cell is |size(i32)|payload...|; allocated cells have negative size.
//!   Cell payloads are identified by a 2-byte signature:
//!     "nk" — key node
//!     "vk" — key value
//!     "lf"/"lh" — fast/hashed leaf subkey list
//!     "li" — leaf index
//!     "ri" — index root (list of lists, for large subkey counts)
//! ```
//!
//! All cell offsets found in records are relative to the hive data base
//! (file offset 0x1000).

use crate::model::{ValueData, ValueDecodeError};

pub const REGF_SIGNATURE: &[u8; 4] = b"regf";
pub const HBIN_SIGNATURE: &[u8; 4] = b"hbin";
pub const NK_SIGNATURE: u16 = 0x6B6E; // "nk" little-endian
pub const VK_SIGNATURE: u16 = 0x6B76; // "vk" little-endian
pub const LF_SIGNATURE: u16 = 0x666C; // "lf" little-endian
pub const LH_SIGNATURE: u16 = 0x686C; // "lh" little-endian
pub const RI_SIGNATURE: u16 = 0x6972; // "ri" little-endian
pub const LI_SIGNATURE: u16 = 0x696C; // "li" little-endian

/// The base block is always 4096 bytes; hive data starts right after it.
pub const BASE_BLOCK_SIZE: usize = 4096;

/// Offset of RootCellOffset within the base block.
pub const REGF_ROOT_CELL: usize = 0x24;
/// Offset of the hive data length within the base block.
pub const REGF_HIVE_LENGTH: usize = 0x28;
/// Offset of the UTF-16LE hive name within the base block.
pub const REGF_NAME: usize = 0x30;
/// Maximum hive name length in bytes (255 wchars).
pub const REGF_NAME_MAX: usize = 510;

// NK record field offsets, relative to the "nk" signature
pub const NK_FLAGS: usize = 2;
pub const NK_SUBKEY_COUNT: usize = 20;
pub const NK_SUBKEY_LIST: usize = 28;
pub const NK_VALUE_COUNT: usize = 36;
pub const NK_VALUE_LIST: usize = 40;
pub const NK_NAME_LENGTH: usize = 72;
pub const NK_NAME_START: usize = 76;

/// NK flag: key name is ASCII (compressed), not UTF-16LE.
pub const KEY_COMP_NAME: u16 = 0x0020;

// VK record field offsets, relative to the "vk" signature
pub const VK_NAME_LENGTH: usize = 2;
pub const VK_DATA_LENGTH: usize = 4;
pub const VK_DATA_OFFSET: usize = 8;
pub const VK_TYPE: usize = 12;
pub const VK_FLAGS: usize = 16;
pub const VK_NAME_START: usize = 20;

/// VK flag: value name is ASCII (compressed).
pub const VALUE_COMP_NAME: u16 = 0x0001;

/// Bit 31 of the VK data length: data is resident in the offset field itself.
pub const VK_DATA_RESIDENT: u32 = 0x8000_0000;

/// Sentinel for "no cell here".
pub const NO_CELL: u32 = 0xFFFF_FFFF;

/// Registry value type tags.
pub mod reg_type {
    pub const REG_NONE: u32 = 0;
    pub const REG_SZ: u32 = 1;
    pub const REG_EXPAND_SZ: u32 = 2;
    pub const REG_BINARY: u32 = 3;
    pub const REG_DWORD: u32 = 4;
    pub const REG_DWORD_BIG_ENDIAN: u32 = 5;
    pub const REG_LINK: u32 = 6;
    pub const REG_MULTI_SZ: u32 = 7;
    pub const REG_RESOURCE_LIST: u32 = 8;
    pub const REG_FULL_RESOURCE_DESCRIPTOR: u32 = 9;
    pub const REG_RESOURCE_REQUIREMENTS_LIST: u32 = 10;
    pub const REG_QWORD: u32 = 11;
}

/// Human-readable name of a value type tag.
pub fn type_name(value_type: u32) -> &'static str {
    match value_type {
        reg_type::REG_NONE => "REG_NONE",
        reg_type::REG_SZ => "REG_SZ",
        reg_type::REG_EXPAND_SZ => "REG_EXPAND_SZ",
        reg_type::REG_BINARY => "REG_BINARY",
        reg_type::REG_DWORD => "REG_DWORD",
        reg_type::REG_DWORD_BIG_ENDIAN => "REG_DWORD_BIG_ENDIAN",
        reg_type::REG_LINK => "REG_LINK",
        reg_type::REG_MULTI_SZ => "REG_MULTI_SZ",
        reg_type::REG_RESOURCE_LIST => "REG_RESOURCE_LIST",
        reg_type::REG_FULL_RESOURCE_DESCRIPTOR => "REG_FULL_RESOURCE_DESCRIPTOR",
        reg_type::REG_RESOURCE_REQUIREMENTS_LIST => "REG_RESOURCE_REQUIREMENTS_LIST",
        reg_type::REG_QWORD => "REG_QWORD",
        _ => "REG_UNKNOWN",
    }
}

/// Decode a UTF-16LE string from raw bytes, stopping at the first NUL.
pub fn read_utf16le_string(data: &[u8]) -> String {
    let chars: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16_lossy(&chars)
}

/// Interpret raw value data according to its declared type tag.
///
/// The tag alone decides the variant: string types become `Text`, the
/// fixed-width numeric types become `Integer`, everything else is `Binary`.
/// Data that does not satisfy its own tag (short numerics, odd-length or
/// malformed UTF-16) yields a `ValueDecodeError` for the caller to record
/// inline.
pub fn decode_value(value_type: u32, data: &[u8]) -> Result<ValueData, ValueDecodeError> {
    match value_type {
        reg_type::REG_SZ | reg_type::REG_EXPAND_SZ => {
            if data.len() % 2 != 0 {
                return Err(ValueDecodeError::new(format!(
                    "string data has odd length {}",
                    data.len()
                )));
            }
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .take_while(|&c| c != 0)
                .collect();
            let text = String::from_utf16(&units)
                .map_err(|_| ValueDecodeError::new("string data is not valid UTF-16"))?;
            Ok(ValueData::Text(text))
        }
        reg_type::REG_DWORD => {
            if data.len() < 4 {
                return Err(ValueDecodeError::new(format!(
                    "dword data too short: {} bytes",
                    data.len()
                )));
            }
            let raw: [u8; 4] = data[..4].try_into().unwrap();
            Ok(ValueData::Integer(u32::from_le_bytes(raw) as u64))
        }
        reg_type::REG_DWORD_BIG_ENDIAN => {
            if data.len() < 4 {
                return Err(ValueDecodeError::new(format!(
                    "dword data too short: {} bytes",
                    data.len()
                )));
            }
            let raw: [u8; 4] = data[..4].try_into().unwrap();
            Ok(ValueData::Integer(u32::from_be_bytes(raw) as u64))
        }
        reg_type::REG_QWORD => {
            if data.len() < 8 {
                return Err(ValueDecodeError::new(format!(
                    "qword data too short: {} bytes",
                    data.len()
                )));
            }
            let raw: [u8; 8] = data[..8].try_into().unwrap();
            Ok(ValueData::Integer(u64::from_le_bytes(raw)))
        }
        _ => Ok(ValueData::Binary(data.to_vec())),
    }
}
