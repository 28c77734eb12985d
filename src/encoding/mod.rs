//! # Encoding Module
//!
//! Fixed-width binary encoding helpers used at the file-format boundary.
//! All multibyte integers in the file format are big-endian (network
//! order); in-memory pages are raw byte arrays addressed by offset and
//! never go through these helpers.

pub mod codec;

pub use codec::{
    read_exact_bytes, read_u16, read_u16_array, read_u32, read_u32_array, read_u8, write_bytes,
    write_u16, write_u16_array, write_u32, write_u32_array, write_u8,
};
