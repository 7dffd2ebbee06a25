//! Shared test support: builds synthetic regf hive images byte by byte,
//! so the reader can be exercised without binary fixtures.

#![allow(dead_code)]

use regview::hive::format::{
    KEY_COMP_NAME, LF_SIGNATURE, LH_SIGNATURE, LI_SIGNATURE, NK_SIGNATURE, NO_CELL, RI_SIGNATURE,
    VALUE_COMP_NAME, VK_DATA_RESIDENT, VK_SIGNATURE,
};

const HBIN_HEADER: usize = 32;

/// Grows a hive data area cell by cell; offsets handed back are relative to
/// the data base, exactly as NK/VK records reference them.
pub struct HiveBuilder {
    data: Vec<u8>,
}

impl Default for HiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HiveBuilder {
    pub fn new() -> Self {
        let mut data = vec![0u8; HBIN_HEADER];
        data[0..4].copy_from_slice(b"hbin");
        // file offset of this bin
        data[4..8].copy_from_slice(&0u32.to_le_bytes());
        // size patched in build()
        Self { data }
    }

    /// Append an allocated cell (negative size prefix) holding `payload`.
    fn alloc(&mut self, payload: &[u8]) -> u32 {
        while self.data.len() % 8 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len() as u32;
        let size = -((payload.len() + 4) as i32);
        self.data.extend_from_slice(&size.to_le_bytes());
        self.data.extend_from_slice(payload);
        offset
    }

    /// Raw data cell (for non-resident value payloads).
    pub fn add_data_cell(&mut self, bytes: &[u8]) -> u32 {
        self.alloc(bytes)
    }

    /// VK record with a non-resident payload stored in its own cell.
    pub fn add_value(&mut self, name: &str, value_type: u32, data: &[u8]) -> u32 {
        let data_offset = self.add_data_cell(data);
        self.add_value_raw(name, value_type, data.len() as u32, data_offset)
    }

    /// VK record with the payload resident in the offset field (max 4 bytes).
    pub fn add_value_resident(&mut self, name: &str, value_type: u32, data: &[u8]) -> u32 {
        assert!(data.len() <= 4, "resident data is at most 4 bytes");
        let mut packed = [0u8; 4];
        packed[..data.len()].copy_from_slice(data);
        self.add_value_raw(
            name,
            value_type,
            data.len() as u32 | VK_DATA_RESIDENT,
            u32::from_le_bytes(packed),
        )
    }

    /// VK record with explicit raw length/offset fields, for corruption
    /// scenarios (short data, dangling data offsets).
    pub fn add_value_raw(
        &mut self,
        name: &str,
        value_type: u32,
        data_length_raw: u32,
        data_offset: u32,
    ) -> u32 {
        let mut rec = vec![0u8; 20 + name.len()];
        rec[0..2].copy_from_slice(&VK_SIGNATURE.to_le_bytes());
        rec[2..4].copy_from_slice(&(name.len() as u16).to_le_bytes());
        rec[4..8].copy_from_slice(&data_length_raw.to_le_bytes());
        rec[8..12].copy_from_slice(&data_offset.to_le_bytes());
        rec[12..16].copy_from_slice(&value_type.to_le_bytes());
        rec[16..18].copy_from_slice(&VALUE_COMP_NAME.to_le_bytes());
        rec[20..].copy_from_slice(name.as_bytes());
        self.alloc(&rec)
    }

    /// Value list cell: an array of VK offsets.
    pub fn add_value_list(&mut self, offsets: &[u32]) -> u32 {
        let mut payload = Vec::with_capacity(offsets.len() * 4);
        for off in offsets {
            payload.extend_from_slice(&off.to_le_bytes());
        }
        self.alloc(&payload)
    }

    fn add_offset_list(&mut self, sig: u16, entry_size: usize, offsets: &[u32]) -> u32 {
        let mut payload = vec![0u8; 4];
        payload[0..2].copy_from_slice(&sig.to_le_bytes());
        payload[2..4].copy_from_slice(&(offsets.len() as u16).to_le_bytes());
        for off in offsets {
            payload.extend_from_slice(&off.to_le_bytes());
            if entry_size == 8 {
                // name hash, unused by the reader
                payload.extend_from_slice(&0u32.to_le_bytes());
            }
        }
        self.alloc(&payload)
    }

    pub fn add_lf_list(&mut self, offsets: &[u32]) -> u32 {
        self.add_offset_list(LF_SIGNATURE, 8, offsets)
    }

    pub fn add_lh_list(&mut self, offsets: &[u32]) -> u32 {
        self.add_offset_list(LH_SIGNATURE, 8, offsets)
    }

    pub fn add_li_list(&mut self, offsets: &[u32]) -> u32 {
        self.add_offset_list(LI_SIGNATURE, 4, offsets)
    }

    /// Index root: a list of further subkey lists.
    pub fn add_ri_list(&mut self, list_offsets: &[u32]) -> u32 {
        self.add_offset_list(RI_SIGNATURE, 4, list_offsets)
    }

    /// NK record with an ASCII (compressed) name.
    pub fn add_key(
        &mut self,
        name: &str,
        subkey_list: Option<(u32, u32)>,
        value_list: Option<(u32, u32)>,
    ) -> u32 {
        self.add_key_record(name.as_bytes(), KEY_COMP_NAME, subkey_list, value_list)
    }

    /// NK record with a UTF-16LE name (compressed-name flag clear).
    pub fn add_key_utf16(
        &mut self,
        name: &str,
        subkey_list: Option<(u32, u32)>,
        value_list: Option<(u32, u32)>,
    ) -> u32 {
        let mut encoded = Vec::with_capacity(name.len() * 2);
        for unit in name.encode_utf16() {
            encoded.extend_from_slice(&unit.to_le_bytes());
        }
        self.add_key_record(&encoded, 0, subkey_list, value_list)
    }

    fn add_key_record(
        &mut self,
        name_bytes: &[u8],
        flags: u16,
        subkey_list: Option<(u32, u32)>,
        value_list: Option<(u32, u32)>,
    ) -> u32 {
        let (subkey_list_offset, subkey_count) = subkey_list.unwrap_or((NO_CELL, 0));
        let (value_list_offset, value_count) = value_list.unwrap_or((NO_CELL, 0));

        let mut rec = vec![0u8; 76 + name_bytes.len()];
        rec[0..2].copy_from_slice(&NK_SIGNATURE.to_le_bytes());
        rec[2..4].copy_from_slice(&flags.to_le_bytes());
        rec[20..24].copy_from_slice(&subkey_count.to_le_bytes());
        rec[28..32].copy_from_slice(&subkey_list_offset.to_le_bytes());
        rec[36..40].copy_from_slice(&value_count.to_le_bytes());
        rec[40..44].copy_from_slice(&value_list_offset.to_le_bytes());
        rec[72..74].copy_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        rec[76..].copy_from_slice(name_bytes);
        self.alloc(&rec)
    }

    /// Assemble the complete file: base block, then the padded data area.
    pub fn build(self, root_offset: u32) -> Vec<u8> {
        let mut area = self.data;
        while area.len() % 4096 != 0 {
            area.push(0);
        }
        let area_len = area.len() as u32;
        area[8..12].copy_from_slice(&area_len.to_le_bytes());

        let mut file = vec![0u8; 4096];
        file[0..4].copy_from_slice(b"regf");
        file[4..8].copy_from_slice(&1u32.to_le_bytes());
        file[8..12].copy_from_slice(&1u32.to_le_bytes());
        file[0x24..0x28].copy_from_slice(&root_offset.to_le_bytes());
        file[0x28..0x2C].copy_from_slice(&area_len.to_le_bytes());
        let name = "\\REGISTRY\\MACHINE\\TEST";
        for (i, unit) in name.encode_utf16().enumerate() {
            file[0x30 + i * 2..0x30 + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        file.extend_from_slice(&area);
        file
    }
}

/// The reference two-level hive: ROOT with subkey Software carrying
/// Ver="1.0" (REG_SZ) and Flags=01 ff (REG_BINARY).
pub fn scenario_hive() -> Vec<u8> {
    use regview::hive::format::reg_type;

    let mut b = HiveBuilder::new();
    let ver = b.add_value("Ver", reg_type::REG_SZ, &[b'1', 0, b'.', 0, b'0', 0, 0, 0]);
    let flags = b.add_value("Flags", reg_type::REG_BINARY, &[0x01, 0xFF]);
    let vlist = b.add_value_list(&[ver, flags]);
    let software = b.add_key("Software", None, Some((vlist, 2)));
    let slist = b.add_lf_list(&[software]);
    let root = b.add_key("ROOT", Some((slist, 1)), None);
    b.build(root)
}
