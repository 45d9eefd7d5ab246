use std::result;

pub mod byte_stream;
pub mod classes;
pub mod desc_names;
pub mod error;
pub mod header;
pub mod map_list;
pub mod model;
pub mod parser;
pub mod pools;
pub mod resolver;

#[cfg(test)]
mod testutil;

pub use model::File;
pub use parser::parse;

pub type Result<T> = result::Result<T, error::DexError>;
