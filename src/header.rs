//! Fixed DEX header layout and version tag.

use crate::byte_stream::ByteStream;
use crate::error::DexError;
use crate::Result;

pub const DEX_MAGIC: &[u8; 4] = b"dex\n";
pub const DEX_ENDIAN_CONSTANT: u32 = 0x12345678;
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// The four-versions-in-the-wild runtime tag (spec.md §9: a runtime version tag over a
/// compile-time type parameter, since the layouts this parser touches don't vary by version).
/// `040`/`041` are accepted (observed in the wild, container-format DEX) but this parser does not
/// implement the container-size/header-offset extension those add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexVersion {
    V035,
    V037,
    V038,
    V039,
    V040,
    V041,
}

impl DexVersion {
    pub fn from_digits(digits: [u8; 3]) -> Option<DexVersion> {
        match &digits {
            b"035" => Some(DexVersion::V035),
            b"037" => Some(DexVersion::V037),
            b"038" => Some(DexVersion::V038),
            b"039" => Some(DexVersion::V039),
            b"040" => Some(DexVersion::V040),
            b"041" => Some(DexVersion::V041),
            _ => None,
        }
    }
}

/// A single `(size, offset)` pair as stored in the header for each pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolLocation {
    pub size: u32,
    pub off: u32,
}

#[derive(Debug, Clone)]
pub struct Header {
    pub version: DexVersion,
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link: PoolLocation,
    pub map_off: u32,
    pub string_ids: PoolLocation,
    pub type_ids: PoolLocation,
    pub proto_ids: PoolLocation,
    pub field_ids: PoolLocation,
    pub method_ids: PoolLocation,
    pub class_defs: PoolLocation,
    pub data: PoolLocation,
}

const EXPECTED_HEADER_SIZE: u32 = 0x70;

impl Header {
    /// Parses the fixed-layout header at offset 0. Any failure here is a hard, top-level
    /// `ParseError` per spec.md §7 — there is no recoverable path before the header is known good.
    pub fn parse(stream: &mut ByteStream) -> Result<Header> {
        if !stream.can_read_at(0, EXPECTED_HEADER_SIZE as usize) {
            return Err(DexError::TruncatedFile);
        }
        stream.setpos(0);
        let magic = stream.read_bytes(4)?;
        if magic != DEX_MAGIC {
            return Err(DexError::BadFileMagic);
        }
        let digits = stream.read_bytes(3)?;
        let version = DexVersion::from_digits([digits[0], digits[1], digits[2]]).ok_or_else(|| {
            let mut v = 0u32;
            for b in digits {
                v = v * 10 + (*b as u32).wrapping_sub('0' as u32);
            }
            DexError::UnknownDexVersion { version: v }
        })?;
        let nul = stream.read_u8()?;
        if nul != 0 {
            return Err(DexError::BadFileMagic);
        }

        let checksum = stream.read_u32()?;
        let mut signature = [0u8; 20];
        signature.copy_from_slice(stream.read_bytes(20)?);
        let file_size = stream.read_u32()?;
        let header_size = stream.read_u32()?;
        if header_size != EXPECTED_HEADER_SIZE {
            return Err(DexError::BadHeaderSize {
                size: header_size,
                expected: EXPECTED_HEADER_SIZE,
            });
        }
        let endian_tag = stream.read_u32()?;
        if endian_tag != DEX_ENDIAN_CONSTANT {
            return Err(DexError::UnexpectedEndianess(endian_tag));
        }
        let link_size = stream.read_u32()?;
        let link_off = stream.read_u32()?;
        let map_off = stream.read_u32()?;
        let string_ids_size = stream.read_u32()?;
        let string_ids_off = stream.read_u32()?;
        let type_ids_size = stream.read_u32()?;
        let type_ids_off = stream.read_u32()?;
        let proto_ids_size = stream.read_u32()?;
        let proto_ids_off = stream.read_u32()?;
        let field_ids_size = stream.read_u32()?;
        let field_ids_off = stream.read_u32()?;
        let method_ids_size = stream.read_u32()?;
        let method_ids_off = stream.read_u32()?;
        let class_defs_size = stream.read_u32()?;
        let class_defs_off = stream.read_u32()?;
        let data_size = stream.read_u32()?;
        let data_off = stream.read_u32()?;

        Ok(Header {
            version,
            checksum,
            signature,
            file_size,
            header_size,
            endian_tag,
            link: PoolLocation { size: link_size, off: link_off },
            map_off,
            string_ids: PoolLocation { size: string_ids_size, off: string_ids_off },
            type_ids: PoolLocation { size: type_ids_size, off: type_ids_off },
            proto_ids: PoolLocation { size: proto_ids_size, off: proto_ids_off },
            field_ids: PoolLocation { size: field_ids_size, off: field_ids_off },
            method_ids: PoolLocation { size: method_ids_size, off: method_ids_off },
            class_defs: PoolLocation { size: class_defs_size, off: class_defs_off },
            data: PoolLocation { size: data_size, off: data_off },
        })
    }
}
