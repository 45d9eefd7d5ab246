//! Synthetic DEX buffer construction for unit/integration tests. Not part of the public API.

#![cfg(test)]

use crate::header::{DEX_ENDIAN_CONSTANT, NO_INDEX};

const HEADER_SIZE: usize = 0x70;

#[derive(Default)]
pub struct ProtoSpec {
    pub shorty_idx: u32,
    pub return_type_idx: u32,
    pub params: Vec<u16>,
}

#[derive(Default)]
pub struct FieldSpec {
    pub class_idx: u16,
    pub type_idx: u16,
    pub name_idx: u32,
}

#[derive(Default)]
pub struct MethodSpec {
    pub class_idx: u16,
    pub proto_idx: u16,
    pub name_idx: u32,
}

#[derive(Default)]
pub struct ClassDataSpec {
    /// ascending field/method indices per sequence; the builder computes the deltas.
    pub static_fields: Vec<(u32, u32)>,
    pub instance_fields: Vec<(u32, u32)>,
    /// `(method_idx, access_flags, insns_size)` — `Some(insns_size)` causes the builder to emit a
    /// real `code_item` and wire its offset in automatically.
    pub direct_methods: Vec<(u32, u32, Option<u32>)>,
    pub virtual_methods: Vec<(u32, u32, Option<u32>)>,
}

pub struct ClassSpec {
    pub class_idx: u32,
    pub access_flags: u32,
    pub superclass_idx: u32,
    pub source_file_idx: u32,
    pub class_data: Option<ClassDataSpec>,
}

#[derive(Default)]
pub struct DexBuilder {
    pub strings: Vec<String>,
    pub types: Vec<u32>,
    pub protos: Vec<ProtoSpec>,
    pub fields: Vec<FieldSpec>,
    pub methods: Vec<MethodSpec>,
    pub classes: Vec<ClassSpec>,
}

impl DexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(&mut self, s: &str) -> u32 {
        self.strings.push(s.to_string());
        self.strings.len() as u32 - 1
    }

    pub fn add_type(&mut self, string_idx: u32) -> u32 {
        self.types.push(string_idx);
        self.types.len() as u32 - 1
    }

    pub fn add_proto(&mut self, shorty_idx: u32, return_type_idx: u32, params: Vec<u16>) -> u32 {
        self.protos.push(ProtoSpec { shorty_idx, return_type_idx, params });
        self.protos.len() as u32 - 1
    }

    pub fn add_field(&mut self, class_idx: u16, type_idx: u16, name_idx: u32) -> u32 {
        self.fields.push(FieldSpec { class_idx, type_idx, name_idx });
        self.fields.len() as u32 - 1
    }

    pub fn add_method(&mut self, class_idx: u16, proto_idx: u16, name_idx: u32) -> u32 {
        self.methods.push(MethodSpec { class_idx, proto_idx, name_idx });
        self.methods.len() as u32 - 1
    }

    pub fn add_class(&mut self, spec: ClassSpec) -> u32 {
        self.classes.push(spec);
        self.classes.len() as u32 - 1
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];

        // 1. string data
        let mut string_data_off = Vec::with_capacity(self.strings.len());
        for s in &self.strings {
            string_data_off.push(buf.len() as u32);
            write_uleb128(&mut buf, s.chars().count() as u32);
            buf.extend_from_slice(s.as_bytes());
            buf.push(0);
        }

        // 2. code items referenced from class-data method sequences, written up front so their
        // offsets are known by the time the delta-encoded streams are emitted.
        let mut direct_code_off: Vec<Vec<u32>> = Vec::with_capacity(self.classes.len());
        let mut virtual_code_off: Vec<Vec<u32>> = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let (mut d, mut v) = (Vec::new(), Vec::new());
            if let Some(data) = &class.class_data {
                for &(_, _, insns) in &data.direct_methods {
                    d.push(write_code_item(&mut buf, insns));
                }
                for &(_, _, insns) in &data.virtual_methods {
                    v.push(write_code_item(&mut buf, insns));
                }
            }
            direct_code_off.push(d);
            virtual_code_off.push(v);
        }

        // 3. class data streams
        let mut class_data_off = vec![0u32; self.classes.len()];
        for (i, class) in self.classes.iter().enumerate() {
            let Some(data) = &class.class_data else { continue };
            class_data_off[i] = buf.len() as u32;
            write_uleb128(&mut buf, data.static_fields.len() as u32);
            write_uleb128(&mut buf, data.instance_fields.len() as u32);
            write_uleb128(&mut buf, data.direct_methods.len() as u32);
            write_uleb128(&mut buf, data.virtual_methods.len() as u32);

            write_field_sequence(&mut buf, &data.static_fields);
            write_field_sequence(&mut buf, &data.instance_fields);
            write_method_sequence(&mut buf, &data.direct_methods, &direct_code_off[i]);
            write_method_sequence(&mut buf, &data.virtual_methods, &virtual_code_off[i]);
        }

        // 3. proto parameter lists
        let mut proto_params_off = vec![0u32; self.protos.len()];
        for (i, proto) in self.protos.iter().enumerate() {
            if proto.params.is_empty() {
                continue;
            }
            proto_params_off[i] = buf.len() as u32;
            buf.extend_from_slice(&(proto.params.len() as u32).to_le_bytes());
            for p in &proto.params {
                buf.extend_from_slice(&p.to_le_bytes());
            }
        }

        // 4. string_ids
        let string_ids_off = buf.len() as u32;
        for off in &string_data_off {
            buf.extend_from_slice(&off.to_le_bytes());
        }

        // 5. type_ids
        let type_ids_off = buf.len() as u32;
        for t in &self.types {
            buf.extend_from_slice(&t.to_le_bytes());
        }

        // 6. proto_ids
        let proto_ids_off = buf.len() as u32;
        for (i, proto) in self.protos.iter().enumerate() {
            buf.extend_from_slice(&proto.shorty_idx.to_le_bytes());
            buf.extend_from_slice(&proto.return_type_idx.to_le_bytes());
            buf.extend_from_slice(&proto_params_off[i].to_le_bytes());
        }

        // 7. field_ids
        let field_ids_off = buf.len() as u32;
        for f in &self.fields {
            buf.extend_from_slice(&f.class_idx.to_le_bytes());
            buf.extend_from_slice(&f.type_idx.to_le_bytes());
            buf.extend_from_slice(&f.name_idx.to_le_bytes());
        }

        // 8. method_ids
        let method_ids_off = buf.len() as u32;
        for m in &self.methods {
            buf.extend_from_slice(&m.class_idx.to_le_bytes());
            buf.extend_from_slice(&m.proto_idx.to_le_bytes());
            buf.extend_from_slice(&m.name_idx.to_le_bytes());
        }

        // 9. class_defs
        let class_defs_off = buf.len() as u32;
        for (i, class) in self.classes.iter().enumerate() {
            buf.extend_from_slice(&class.class_idx.to_le_bytes());
            buf.extend_from_slice(&class.access_flags.to_le_bytes());
            buf.extend_from_slice(&class.superclass_idx.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes()); // interfaces_off
            buf.extend_from_slice(&class.source_file_idx.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes()); // annotations_off
            buf.extend_from_slice(&class_data_off[i].to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes()); // static_values_off
        }

        // 10. map list
        let map_off = buf.len() as u32;
        let mut entries: Vec<(u16, u32, u32)> = vec![(0x0000, 1, 0)];
        if !self.strings.is_empty() {
            entries.push((0x0001, self.strings.len() as u32, string_ids_off));
        }
        if !self.types.is_empty() {
            entries.push((0x0002, self.types.len() as u32, type_ids_off));
        }
        if !self.protos.is_empty() {
            entries.push((0x0003, self.protos.len() as u32, proto_ids_off));
        }
        if !self.fields.is_empty() {
            entries.push((0x0004, self.fields.len() as u32, field_ids_off));
        }
        if !self.methods.is_empty() {
            entries.push((0x0005, self.methods.len() as u32, method_ids_off));
        }
        if !self.classes.is_empty() {
            entries.push((0x0006, self.classes.len() as u32, class_defs_off));
        }
        buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for (type_, size, off) in entries {
            buf.extend_from_slice(&type_.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&size.to_le_bytes());
            buf.extend_from_slice(&off.to_le_bytes());
        }

        let file_size = buf.len() as u32;

        // header
        buf[0..4].copy_from_slice(b"dex\n");
        buf[4..7].copy_from_slice(b"035");
        buf[7] = 0;
        buf[8..12].copy_from_slice(&0u32.to_le_bytes()); // checksum
        buf[12..32].copy_from_slice(&[0u8; 20]); // signature
        buf[32..36].copy_from_slice(&file_size.to_le_bytes());
        buf[36..40].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        buf[40..44].copy_from_slice(&DEX_ENDIAN_CONSTANT.to_le_bytes());
        buf[44..48].copy_from_slice(&0u32.to_le_bytes()); // link_size
        buf[48..52].copy_from_slice(&0u32.to_le_bytes()); // link_off
        buf[52..56].copy_from_slice(&map_off.to_le_bytes());
        buf[56..60].copy_from_slice(&(self.strings.len() as u32).to_le_bytes());
        buf[60..64].copy_from_slice(&string_ids_off.to_le_bytes());
        buf[64..68].copy_from_slice(&(self.types.len() as u32).to_le_bytes());
        buf[68..72].copy_from_slice(&type_ids_off.to_le_bytes());
        buf[72..76].copy_from_slice(&(self.protos.len() as u32).to_le_bytes());
        buf[76..80].copy_from_slice(&proto_ids_off.to_le_bytes());
        buf[80..84].copy_from_slice(&(self.fields.len() as u32).to_le_bytes());
        buf[84..88].copy_from_slice(&field_ids_off.to_le_bytes());
        buf[88..92].copy_from_slice(&(self.methods.len() as u32).to_le_bytes());
        buf[92..96].copy_from_slice(&method_ids_off.to_le_bytes());
        buf[96..100].copy_from_slice(&(self.classes.len() as u32).to_le_bytes());
        buf[100..104].copy_from_slice(&class_defs_off.to_le_bytes());
        buf[104..108].copy_from_slice(&0u32.to_le_bytes()); // data_size
        buf[108..112].copy_from_slice(&0u32.to_le_bytes()); // data_off

        buf
    }
}

fn write_uleb128(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            buf.push(byte | 0x80);
        } else {
            buf.push(byte);
            break;
        }
    }
}

fn write_field_sequence(buf: &mut Vec<u8>, fields: &[(u32, u32)]) {
    let mut prev = 0i64;
    for &(idx, access) in fields {
        let delta = idx as i64 - prev;
        prev = idx as i64;
        write_uleb128(buf, delta as u32);
        write_uleb128(buf, access);
    }
}

fn write_method_sequence(buf: &mut Vec<u8>, methods: &[(u32, u32, Option<u32>)], code_offsets: &[u32]) {
    let mut prev = 0i64;
    for (i, &(idx, access, _)) in methods.iter().enumerate() {
        let delta = idx as i64 - prev;
        prev = idx as i64;
        write_uleb128(buf, delta as u32);
        write_uleb128(buf, access);
        write_uleb128(buf, code_offsets[i]);
    }
}

/// Writes a minimal `code_item` (all-zero register/ins/outs/tries counts, no debug info, all-zero
/// instruction bytes) and returns its offset, or `0` (meaning "no code") when `insns_size` is
/// `None`.
fn write_code_item(buf: &mut Vec<u8>, insns_size: Option<u32>) -> u32 {
    let Some(insns_size) = insns_size else { return 0 };
    let off = buf.len() as u32;
    buf.extend_from_slice(&0u16.to_le_bytes()); // registers_size
    buf.extend_from_slice(&0u16.to_le_bytes()); // ins_size
    buf.extend_from_slice(&0u16.to_le_bytes()); // outs_size
    buf.extend_from_slice(&0u16.to_le_bytes()); // tries_size
    buf.extend_from_slice(&0u32.to_le_bytes()); // debug_info_off
    buf.extend_from_slice(&insns_size.to_le_bytes());
    buf.extend(std::iter::repeat(0u8).take(insns_size as usize * 2));
    off
}

pub fn no_index() -> u32 {
    NO_INDEX
}

pub fn build_empty_dex() -> Vec<u8> {
    DexBuilder::new().build()
}
