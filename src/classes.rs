//! Class-def records and the delta-encoded class-data stream (spec.md §4.4).

use log::warn;

use crate::byte_stream::ByteStream;
use crate::header::{Header, NO_INDEX};
use crate::model::{AccessFlags, Class, ClassState, File};

const CLASS_DEF_RECORD_SIZE: usize = 32;

pub fn parse_classes(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.class_defs;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * CLASS_DEF_RECORD_SIZE;
        let record = match read_class_def_record(stream, entry_off) {
            Some(r) => r,
            None => {
                warn!("class_defs[{i}]: truncated record, stopping pool");
                break;
            }
        };
        if record.class_idx as usize >= file.types.len() {
            warn!("class_defs[{i}]: class_idx {} out of bounds, skipping record", record.class_idx);
            continue;
        }

        let descriptor_idx = file.types[record.class_idx as usize].descriptor;
        let descriptor_str = match file.string_at(descriptor_idx) {
            Some(s) => s.to_string(),
            None => {
                warn!("class_defs[{i}]: class descriptor string missing, skipping record");
                continue;
            }
        };

        let superclass = if record.superclass_idx == NO_INDEX {
            None
        } else if (record.superclass_idx as usize) < file.types.len() {
            let super_descriptor_idx = file.types[record.superclass_idx as usize].descriptor;
            match file.string_at(super_descriptor_idx) {
                Some(super_descriptor) => {
                    let super_descriptor = super_descriptor.to_string();
                    if let Some(existing) = file.class_by_name(&super_descriptor) {
                        Some(existing)
                    } else {
                        file.inheritance.entry(super_descriptor).or_default().push(file.classes.len() as u32);
                        None
                    }
                }
                None => {
                    warn!("class_defs[{i}]: superclass descriptor string missing");
                    None
                }
            }
        } else {
            warn!("class_defs[{i}]: superclass_idx {} out of bounds, treating as absent", record.superclass_idx);
            None
        };

        let source_file = if record.source_file_idx == NO_INDEX {
            None
        } else if (record.source_file_idx as usize) < file.strings.len() {
            Some(record.source_file_idx)
        } else {
            warn!("class_defs[{i}]: source_file_idx out of bounds, treating as absent");
            None
        };

        let class_idx = file.classes.len() as u32;
        if let Some(existing) = file.class_by_descriptor.get(&descriptor_str) {
            warn!("class_defs[{i}]: duplicate class descriptor {descriptor_str}, last writer wins");
            let _ = existing;
        }

        file.classes.push(Class {
            descriptor: descriptor_idx,
            descriptor_str: descriptor_str.clone(),
            access_flags: AccessFlags::from_bits_truncate(record.access_flags),
            superclass,
            source_file,
            fields: Vec::new(),
            methods: Vec::new(),
            original_index: Some(class_idx),
            interfaces_off: record.interfaces_off,
            annotations_off: record.annotations_off,
            state: ClassState::Local,
        });
        file.class_by_descriptor.insert(descriptor_str.clone(), class_idx);

        if record.class_data_off > 0 {
            parse_class_data(stream, file, record.class_data_off, class_idx, &descriptor_str, i);
        }
    }
    log::debug!("parsed {} classes", file.classes.len());
}

struct ClassDefRecord {
    class_idx: u32,
    access_flags: u32,
    superclass_idx: u32,
    interfaces_off: u32,
    source_file_idx: u32,
    annotations_off: u32,
    class_data_off: u32,
}

fn read_class_def_record(stream: &mut ByteStream, off: usize) -> Option<ClassDefRecord> {
    let class_idx = stream.peek_u32(off).ok()?;
    let access_flags = stream.peek_u32(off + 4).ok()?;
    let superclass_idx = stream.peek_u32(off + 8).ok()?;
    let interfaces_off = stream.peek_u32(off + 12).ok()?;
    let source_file_idx = stream.peek_u32(off + 16).ok()?;
    let annotations_off = stream.peek_u32(off + 20).ok()?;
    let class_data_off = stream.peek_u32(off + 24).ok()?;
    // static_values_off at off+28 is not interpreted.
    Some(ClassDefRecord {
        class_idx,
        access_flags,
        superclass_idx,
        interfaces_off,
        source_file_idx,
        annotations_off,
        class_data_off,
    })
}

/// Decodes the four delta-encoded sequences making up a class-data stream and attaches each
/// entry to `class_idx`, consuming the matching pending entry from `class_field_map`/
/// `class_method_map` as it goes.
fn parse_class_data(
    stream: &mut ByteStream,
    file: &mut File,
    class_data_off: u32,
    class_idx: u32,
    descriptor: &str,
    class_def_index: u32,
) {
    let saved = stream.pos();
    stream.setpos(class_data_off as usize);

    let counts = [
        stream.read_uleb128(),
        stream.read_uleb128(),
        stream.read_uleb128(),
        stream.read_uleb128(),
    ];
    let (static_fields_size, instance_fields_size, direct_methods_size, virtual_methods_size) =
        match counts {
            [Ok(a), Ok(b), Ok(c), Ok(d)] => (a, b, c, d),
            _ => {
                warn!("class_defs[{class_def_index}]: truncated class-data header at {class_data_off:#x}");
                stream.setpos(saved);
                return;
            }
        };

    attach_fields(stream, file, class_idx, descriptor, static_fields_size, true, class_def_index);
    attach_fields(stream, file, class_idx, descriptor, instance_fields_size, false, class_def_index);
    attach_methods(stream, file, class_idx, descriptor, direct_methods_size, false, class_def_index);
    attach_methods(stream, file, class_idx, descriptor, virtual_methods_size, true, class_def_index);

    stream.setpos(saved);
}

fn attach_fields(
    stream: &mut ByteStream,
    file: &mut File,
    class_idx: u32,
    descriptor: &str,
    count: u32,
    is_static: bool,
    class_def_index: u32,
) {
    let mut running_idx: i64 = 0;
    for n in 0..count {
        let delta = match stream.read_uleb128() {
            Ok(v) => v,
            Err(_) => {
                warn!("class_defs[{class_def_index}]: truncated field entry {n}, stopping sequence");
                return;
            }
        };
        let access = match stream.read_uleb128() {
            Ok(v) => v,
            Err(_) => {
                warn!("class_defs[{class_def_index}]: truncated field entry {n}, stopping sequence");
                return;
            }
        };
        running_idx += delta as i64;
        let field_idx = running_idx as u32;

        let pending = file.class_field_map.get_mut(descriptor);
        let pos = pending.as_ref().and_then(|v| v.iter().position(|&f| f == field_idx));
        let (pending, pos) = match (pending, pos) {
            (Some(p), Some(pos)) => (p, pos),
            _ => {
                warn!("class_defs[{class_def_index}]: field_idx {field_idx} not declared for {descriptor}, skipping");
                continue;
            }
        };
        pending.remove(pos);

        let field = match file.fields.get_mut(field_idx as usize) {
            Some(f) => f,
            None => continue,
        };
        if field.original_index != field_idx {
            warn!("class_defs[{class_def_index}]: field original_index mismatch, ignoring record");
            continue;
        }
        field.access_flags = AccessFlags::from_bits_truncate(access);
        field.is_static = is_static;
        field.parent = Some(class_idx);

        if let Some(class) = file.classes.get_mut(class_idx as usize) {
            class.fields.push(field_idx);
        }
    }
}

fn attach_methods(
    stream: &mut ByteStream,
    file: &mut File,
    class_idx: u32,
    descriptor: &str,
    count: u32,
    is_virtual: bool,
    class_def_index: u32,
) {
    let mut running_idx: i64 = 0;
    for n in 0..count {
        let delta = match stream.read_uleb128() {
            Ok(v) => v,
            Err(_) => {
                warn!("class_defs[{class_def_index}]: truncated method entry {n}, stopping sequence");
                return;
            }
        };
        let access = match stream.read_uleb128() {
            Ok(v) => v,
            Err(_) => {
                warn!("class_defs[{class_def_index}]: truncated method entry {n}, stopping sequence");
                return;
            }
        };
        let code_off = match stream.read_uleb128() {
            Ok(v) => v,
            Err(_) => {
                warn!("class_defs[{class_def_index}]: truncated method entry {n}, stopping sequence");
                return;
            }
        };
        running_idx += delta as i64;
        let method_idx = running_idx as u32;

        let pending = file.class_method_map.get_mut(descriptor);
        let pos = pending.as_ref().and_then(|v| v.iter().position(|&m| m == method_idx));
        let (pending, pos) = match (pending, pos) {
            (Some(p), Some(pos)) => (p, pos),
            _ => {
                warn!("class_defs[{class_def_index}]: method_idx {method_idx} not declared for {descriptor}, skipping");
                continue;
            }
        };
        pending.remove(pos);

        let code = if code_off > 0 {
            read_code_item_insns(stream, code_off)
        } else {
            None
        };

        let method = match file.methods.get_mut(method_idx as usize) {
            Some(m) => m,
            None => continue,
        };
        if method.original_index != method_idx {
            warn!("class_defs[{class_def_index}]: method original_index mismatch, ignoring record");
            continue;
        }
        let mut flags = AccessFlags::from_bits_truncate(access);
        if method.access_flags.is_constructor() {
            flags |= AccessFlags::CONSTRUCTOR;
        }
        method.access_flags = flags;
        method.is_virtual = is_virtual;
        method.parent = Some(class_idx);
        method.code = code;

        if let Some(class) = file.classes.get_mut(class_idx as usize) {
            class.methods.push(method_idx);
        }
    }
}

/// `code_item` layout: registers_size, ins_size, outs_size, tries_size (u16 each), debug_info_off
/// (u32), insns_size (u32), then `insns_size * 2` bytes of bytecode. No decoding performed here —
/// only the `(offset, length)` of the raw instruction bytes is recorded.
fn read_code_item_insns(stream: &ByteStream, code_off: u32) -> Option<(u32, u32)> {
    let base = code_off as usize;
    let _registers_size = stream.peek_u16(base).ok()?;
    let _ins_size = stream.peek_u16(base + 2).ok()?;
    let _outs_size = stream.peek_u16(base + 4).ok()?;
    let _tries_size = stream.peek_u16(base + 6).ok()?;
    let _debug_info_off = stream.peek_u32(base + 8).ok()?;
    let insns_size = stream.peek_u32(base + 12).ok()?;
    let insns_off = base + 16;
    let byte_len = insns_size.checked_mul(2)?;
    if stream.can_read_at(insns_off, byte_len as usize) {
        Some((insns_off as u32, byte_len))
    } else {
        None
    }
}
