use std::fmt::Debug;

use thiserror::Error;

/// Hard failures from [`crate::parse`]. Everything else is a recoverable record that is logged
/// and skipped — see `pools.rs`, `classes.rs`, `resolver.rs`.
#[derive(Error)]
pub enum DexError {
    #[error("Empty or truncated file")]
    TruncatedFile,

    #[error("Bad file magic")]
    BadFileMagic,

    #[error("Unknown dex version: {version}")]
    UnknownDexVersion { version: u32 },

    #[error("Bad header size: {size}, expected {expected}")]
    BadHeaderSize { size: u32, expected: u32 },

    #[error("Unexpected endian tag: {0:#x}")]
    UnexpectedEndianess(u32),

    #[error("Bad leb128 at offset {0}: truncated or overlong")]
    BadVarint(usize),

    #[error("Invalid modified-UTF-8 starting at offset {0}")]
    BadMutf8(usize),

    #[error("Read of {requested} bytes at offset {offset} overflows buffer of size {size}")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        size: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Debug for DexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
