//! The `MapList`: a directory of every section in the file, in order. Advisory where the header
//! already locates a pool (strings/types/protos/fields/methods/class-defs); authoritative where
//! the header does not (method handles, call sites, hiddenapi class data).

use crate::byte_stream::ByteStream;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapItemType {
    HeaderItem,
    StringIdItem,
    TypeIdItem,
    ProtoIdItem,
    FieldIdItem,
    MethodIdItem,
    ClassDefItem,
    CallSiteIdItem,
    MethodHandleItem,
    MapList,
    TypeList,
    AnnotationSetRefList,
    AnnotationSetItem,
    ClassDataItem,
    CodeItem,
    StringDataItem,
    DebugInfoItem,
    AnnotationItem,
    EncodedArrayItem,
    AnnotationsDirectoryItem,
    HiddenApiClassDataItem,
    Unknown(u16),
}

impl MapItemType {
    fn from_u16(v: u16) -> MapItemType {
        match v {
            0x0000 => MapItemType::HeaderItem,
            0x0001 => MapItemType::StringIdItem,
            0x0002 => MapItemType::TypeIdItem,
            0x0003 => MapItemType::ProtoIdItem,
            0x0004 => MapItemType::FieldIdItem,
            0x0005 => MapItemType::MethodIdItem,
            0x0006 => MapItemType::ClassDefItem,
            0x0007 => MapItemType::CallSiteIdItem,
            0x0008 => MapItemType::MethodHandleItem,
            0x1000 => MapItemType::MapList,
            0x1001 => MapItemType::TypeList,
            0x1002 => MapItemType::AnnotationSetRefList,
            0x1003 => MapItemType::AnnotationSetItem,
            0x2000 => MapItemType::ClassDataItem,
            0x2001 => MapItemType::CodeItem,
            0x2002 => MapItemType::StringDataItem,
            0x2003 => MapItemType::DebugInfoItem,
            0x2004 => MapItemType::AnnotationItem,
            0x2005 => MapItemType::EncodedArrayItem,
            0x2006 => MapItemType::AnnotationsDirectoryItem,
            0xF000 => MapItemType::HiddenApiClassDataItem,
            other => MapItemType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MapItem {
    pub type_: MapItemType,
    pub size: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MapList {
    items: Vec<MapItem>,
}

impl MapList {
    /// Parses the map at `map_off`. A missing or malformed map is not fatal: per spec.md §4.2 it
    /// is purely advisory, so a parse failure just yields an empty map and a warning.
    pub fn parse(stream: &mut ByteStream, map_off: u32) -> MapList {
        if map_off == 0 {
            return MapList::default();
        }
        let mut list = MapList::default();
        stream.setpos(map_off as usize);
        let count = match stream.read_u32() {
            Ok(c) => c,
            Err(_) => {
                warn!("map list at {map_off} is truncated; proceeding without it");
                return list;
            }
        };
        for i in 0..count {
            let type_ = match stream.read_u16() {
                Ok(v) => MapItemType::from_u16(v),
                Err(_) => {
                    warn!("map list truncated after {i} of {count} entries");
                    break;
                }
            };
            // unused 16-bit padding field
            if stream.read_u16().is_err() {
                warn!("map list truncated after {i} of {count} entries");
                break;
            }
            let size = match stream.read_u32() {
                Ok(v) => v,
                Err(_) => break,
            };
            let offset = match stream.read_u32() {
                Ok(v) => v,
                Err(_) => break,
            };
            list.items.push(MapItem { type_, size, offset });
        }
        list
    }

    pub fn get(&self, type_: MapItemType) -> Option<&MapItem> {
        self.items.iter().find(|item| item.type_ == type_)
    }

    pub fn item_size(&self, type_: MapItemType) -> usize {
        self.get(type_).map(|i| i.size as usize).unwrap_or(0)
    }

    pub fn item_offset(&self, type_: MapItemType) -> usize {
        self.get(type_).map(|i| i.offset as usize).unwrap_or(0)
    }

    /// Checks a header-located pool's (offset, size) against the map's entry for `type_`, warning
    /// (but never failing) on disagreement. The header's values always win.
    pub fn check_consistency(&self, type_: MapItemType, header_off: u32, header_size: u32, name: &str) {
        if let Some(item) = self.get(type_) {
            if item.offset != header_off || item.size != header_size {
                warn!(
                    "map disagrees with header for {name}: map=({:#x}, {}) header=({:#x}, {}); using header",
                    item.offset, item.size, header_off, header_size
                );
            }
        }
    }
}
