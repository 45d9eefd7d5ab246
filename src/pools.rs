//! The five index-addressable pools: strings, types, prototypes, fields, methods. Parsed strictly
//! leaves-first (spec.md §2); each parser validates every index field against the *current* size
//! of the pool it references before dereferencing, recovering from corruption by skipping either
//! the one record (`continue`) or the rest of the pool (`break`) per spec.md §4.3.

use log::warn;

use crate::byte_stream::ByteStream;
use crate::header::{Header, NO_INDEX};
use crate::map_list::{MapItemType, MapList};
use crate::model::{AccessFlags, CallSite, Field, File, Method, MethodHandle, Prototype, Type, TypeKind};

pub fn parse_strings(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.string_ids;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * 4;
        let string_data_off = match stream.peek_u32(entry_off) {
            Ok(v) => v,
            Err(_) => {
                warn!("string_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        stream.setpos(string_data_off as usize);
        let code_points = match stream.read_uleb128() {
            Ok(v) => v as usize,
            Err(_) => {
                warn!("string_ids[{i}]: bad utf16_size varint at {string_data_off:#x}, skipping");
                file.strings.push(String::new());
                continue;
            }
        };
        match stream.read_mutf8(code_points) {
            Ok(s) => file.strings.push(s),
            Err(_) => {
                warn!("string_ids[{i}]: invalid modified-utf8 at {string_data_off:#x}, substituting empty string");
                file.strings.push(String::new());
            }
        }
    }
    log::debug!("parsed {} strings", file.strings.len());
}

pub fn parse_types(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.type_ids;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * 4;
        let descriptor_idx = match stream.peek_u32(entry_off) {
            Ok(v) => v,
            Err(_) => {
                warn!("type_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        if descriptor_idx as usize >= file.strings.len() {
            warn!("type_ids[{i}]: descriptor_idx {descriptor_idx} out of bounds ({} strings), stopping pool", file.strings.len());
            break;
        }
        let descriptor = file.strings[descriptor_idx as usize].clone();
        let kind = TypeKind::classify(&descriptor);
        let type_idx = file.types.len() as u32;
        file.types.push(Type {
            descriptor: descriptor_idx,
            kind,
            class: None,
        });
        let element = Type::element_descriptor(&descriptor);
        if matches!(kind, TypeKind::Class) || (kind == TypeKind::Array && element.starts_with('L')) {
            file.class_type_map.entry(element.to_string()).or_default().push(type_idx);
        }
    }
    log::debug!("parsed {} types", file.types.len());
}

pub fn parse_prototypes(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.proto_ids;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * 12;
        let shorty_idx = match stream.peek_u32(entry_off) {
            Ok(v) => v,
            Err(_) => {
                warn!("proto_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let return_type_idx = match stream.peek_u32(entry_off + 4) {
            Ok(v) => v,
            Err(_) => {
                warn!("proto_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let parameters_off = match stream.peek_u32(entry_off + 8) {
            Ok(v) => v,
            Err(_) => {
                warn!("proto_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };

        if return_type_idx as usize >= file.types.len() {
            warn!("proto_ids[{i}]: return_type_idx {return_type_idx} out of bounds, stopping pool");
            break;
        }

        let mut parameters = Vec::new();
        if parameters_off > 0 {
            let saved = stream.pos();
            stream.setpos(parameters_off as usize);
            match stream.read_u32() {
                Ok(count) => {
                    let mut ok = true;
                    for _ in 0..count {
                        match stream.read_u16() {
                            Ok(ty) => {
                                if (ty as usize) < file.types.len() {
                                    parameters.push(ty as u32);
                                } else {
                                    warn!("proto_ids[{i}]: parameter type index {ty} out of bounds, truncating params");
                                    ok = false;
                                    break;
                                }
                            }
                            Err(_) => {
                                warn!("proto_ids[{i}]: truncated parameters list at {parameters_off:#x}");
                                ok = false;
                                break;
                            }
                        }
                    }
                    let _ = ok;
                }
                Err(_) => {
                    warn!("proto_ids[{i}]: truncated parameters count at {parameters_off:#x}");
                }
            }
            stream.setpos(saved);
        }

        file.prototypes.push(Prototype {
            shorty_idx,
            return_type: return_type_idx,
            parameters,
        });
    }
    log::debug!("parsed {} prototypes", file.prototypes.len());
}

/// Strips leading `[` and returns the class descriptor a field/method record is declared on,
/// i.e. the element type for an array-of-class `Type`.
fn declaring_descriptor<'a>(file: &'a File, type_idx: u32) -> Option<&'a str> {
    let ty = file.type_at(type_idx)?;
    let descriptor = file.string_at(ty.descriptor)?;
    Some(Type::element_descriptor(descriptor))
}

pub fn parse_fields(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.field_ids;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * 8;
        let class_idx = match stream.peek_u16(entry_off) {
            Ok(v) => v as u32,
            Err(_) => {
                warn!("field_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let type_idx = match stream.peek_u16(entry_off + 2) {
            Ok(v) => v as u32,
            Err(_) => {
                warn!("field_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let name_idx = match stream.peek_u32(entry_off + 4) {
            Ok(v) => v,
            Err(_) => {
                warn!("field_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };

        if name_idx as usize >= file.strings.len() || type_idx as usize >= file.types.len() {
            warn!("field_ids[{i}]: name or type index out of bounds, skipping record");
            continue;
        }
        let descriptor = match declaring_descriptor(file, class_idx) {
            Some(d) => d.to_string(),
            None => {
                warn!("field_ids[{i}]: class_idx {class_idx} out of bounds, skipping record");
                continue;
            }
        };
        let declaring_type_descriptor = file.types[class_idx as usize].descriptor;

        let field_idx = file.fields.len() as u32;
        file.fields.push(Field {
            name: name_idx,
            declaring_class_descriptor: declaring_type_descriptor,
            type_: type_idx,
            parent: None,
            access_flags: AccessFlags::empty(),
            is_static: false,
            original_index: field_idx,
        });
        file.class_field_map.entry(descriptor).or_default().push(field_idx);
    }
    log::debug!("parsed {} fields", file.fields.len());
}

pub fn parse_methods(stream: &mut ByteStream, header: &Header, file: &mut File) {
    let loc = header.method_ids;
    if loc.size == 0 || loc.off == 0 {
        return;
    }
    for i in 0..loc.size {
        let entry_off = loc.off as usize + i as usize * 8;
        let class_idx = match stream.peek_u16(entry_off) {
            Ok(v) => v as u32,
            Err(_) => {
                warn!("method_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let proto_idx = match stream.peek_u16(entry_off + 2) {
            Ok(v) => v as u32,
            Err(_) => {
                warn!("method_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let name_idx = match stream.peek_u32(entry_off + 4) {
            Ok(v) => v,
            Err(_) => {
                warn!("method_ids[{i}]: truncated record, stopping pool");
                break;
            }
        };

        if name_idx as usize >= file.strings.len() || proto_idx as usize >= file.prototypes.len() {
            warn!("method_ids[{i}]: name or proto index out of bounds, skipping record");
            continue;
        }
        let descriptor = match declaring_descriptor(file, class_idx) {
            Some(d) => d.to_string(),
            None => {
                warn!("method_ids[{i}]: class_idx {class_idx} out of bounds, skipping record");
                continue;
            }
        };
        let declaring_type_descriptor = file.types[class_idx as usize].descriptor;

        let name = file.strings[name_idx as usize].clone();
        let mut access_flags = AccessFlags::empty();
        if Method::is_constructor_name(&name) {
            access_flags |= AccessFlags::CONSTRUCTOR;
        }

        let method_idx = file.methods.len() as u32;
        file.methods.push(Method {
            name: name_idx,
            declaring_class_descriptor: declaring_type_descriptor,
            proto: proto_idx,
            parent: None,
            access_flags,
            is_virtual: false,
            code: None,
            original_index: method_idx,
        });
        file.class_method_map.entry(descriptor).or_default().push(method_idx);
    }
    log::debug!("parsed {} methods", file.methods.len());
}

pub const fn no_index() -> u32 {
    NO_INDEX
}

/// Method handles and call sites (SPEC_FULL §10.4): small fixed-width pools the header does not
/// locate at all — the MapList is the only source of their (offset, count), so a missing MapList
/// entry means an empty pool, never an error.
pub fn parse_method_handles(stream: &mut ByteStream, map: &MapList, file: &mut File) {
    let off = map.item_offset(MapItemType::MethodHandleItem);
    let count = map.item_size(MapItemType::MethodHandleItem);
    if off == 0 || count == 0 {
        return;
    }
    for i in 0..count {
        let entry_off = off + i * 8;
        let kind = match stream.peek_u16(entry_off) {
            Ok(v) => v,
            Err(_) => {
                warn!("method_handles[{i}]: truncated record, stopping pool");
                break;
            }
        };
        let field_or_method_id = match stream.peek_u16(entry_off + 4) {
            Ok(v) => v as u32,
            Err(_) => {
                warn!("method_handles[{i}]: truncated record, stopping pool");
                break;
            }
        };
        file.method_handles.push(MethodHandle { kind, field_or_method_id });
    }
}

pub fn parse_call_sites(stream: &mut ByteStream, map: &MapList, file: &mut File) {
    let off = map.item_offset(MapItemType::CallSiteIdItem);
    let count = map.item_size(MapItemType::CallSiteIdItem);
    if off == 0 || count == 0 {
        return;
    }
    for i in 0..count {
        let entry_off = off + i * 4;
        let call_site_off = match stream.peek_u32(entry_off) {
            Ok(v) => v,
            Err(_) => {
                warn!("call_sites[{i}]: truncated record, stopping pool");
                break;
            }
        };
        file.call_sites.push(CallSite { call_site_off });
    }
}
