//! The top-level entry point wiring every component together in the order spec.md §2 mandates:
//! ByteStream ← Header/Map ← Strings ← Types ← (Prototypes, Fields, Methods) ← Classes ← Resolver.

use log::debug;

use crate::byte_stream::ByteStream;
use crate::classes;
use crate::header::Header;
use crate::map_list::{MapItemType, MapList};
use crate::model::File;
use crate::pools;
use crate::resolver;
use crate::Result;

/// Parses a complete DEX buffer into an in-memory object graph. Only unrecoverable I/O and a
/// malformed header are surfaced as errors here; everything else downstream is a recoverable
/// condition logged and skipped (spec.md §4.5, §7).
pub fn parse(bytes: &[u8]) -> Result<File> {
    let mut stream = ByteStream::new(bytes);
    let header = Header::parse(&mut stream)?;
    debug!("dex header ok: version={:?} file_size={}", header.version, header.file_size);

    let map = MapList::parse(&mut stream, header.map_off);
    check_header_pools_against_map(&header, &map);

    let mut file = File::default();
    file.data = bytes.to_vec();

    pools::parse_strings(&mut stream, &header, &mut file);
    pools::parse_types(&mut stream, &header, &mut file);
    pools::parse_prototypes(&mut stream, &header, &mut file);
    pools::parse_fields(&mut stream, &header, &mut file);
    pools::parse_methods(&mut stream, &header, &mut file);
    pools::parse_method_handles(&mut stream, &map, &mut file);
    pools::parse_call_sites(&mut stream, &map, &mut file);

    classes::parse_classes(&mut stream, &header, &mut file);

    resolver::resolve(&mut file);

    debug!(
        "parse complete: {} strings, {} types, {} prototypes, {} fields, {} methods, {} classes",
        file.strings.len(),
        file.types.len(),
        file.prototypes.len(),
        file.fields.len(),
        file.methods.len(),
        file.classes.len()
    );

    Ok(file)
}

fn check_header_pools_against_map(header: &Header, map: &MapList) {
    map.check_consistency(MapItemType::StringIdItem, header.string_ids.off, header.string_ids.size, "string_ids");
    map.check_consistency(MapItemType::TypeIdItem, header.type_ids.off, header.type_ids.size, "type_ids");
    map.check_consistency(MapItemType::ProtoIdItem, header.proto_ids.off, header.proto_ids.size, "proto_ids");
    map.check_consistency(MapItemType::FieldIdItem, header.field_ids.off, header.field_ids.size, "field_ids");
    map.check_consistency(MapItemType::MethodIdItem, header.method_ids.off, header.method_ids.size, "method_ids");
    map.check_consistency(MapItemType::ClassDefItem, header.class_defs.off, header.class_defs.size, "class_defs");
}
