//! # Fixed-Width Byte Codec
//!
//! Big-endian encode/decode of `u8`, `u16`, and `u32` against `std::io`
//! streams, plus fixed-width array variants that loop over elements.
//!
//! Reads use `read_exact` semantics: a partial read is an error, never a
//! short result. The pager routes whole-page transfers through
//! [`read_exact_bytes`] and [`write_bytes`] so that every byte crossing the
//! stream boundary goes through this module.
//!
//! ## Error Handling
//!
//! All functions return `eyre::Result` with a message naming the failed
//! primitive. Callers that know the enclosing page wrap the error with the
//! page id.

use std::io::{Read, Write};

use eyre::{eyre, Result};

pub fn write_u8<W: Write>(w: &mut W, value: u8) -> Result<()> {
    w.write_all(&[value])
        .map_err(|e| eyre!("failed to write u8: {e}"))
}

pub fn write_u16<W: Write>(w: &mut W, value: u16) -> Result<()> {
    w.write_all(&value.to_be_bytes())
        .map_err(|e| eyre!("failed to write u16: {e}"))
}

pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<()> {
    w.write_all(&value.to_be_bytes())
        .map_err(|e| eyre!("failed to write u32: {e}"))
}

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)
        .map_err(|e| eyre!("failed to read u8: {e}"))?;
    Ok(buf[0])
}

pub fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)
        .map_err(|e| eyre!("failed to read u16: {e}"))?;
    Ok(u16::from_be_bytes(buf))
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| eyre!("failed to read u32: {e}"))?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u16_array<W: Write>(w: &mut W, values: &[u16]) -> Result<()> {
    for value in values {
        write_u16(w, *value)?;
    }
    Ok(())
}

pub fn read_u16_array<R: Read>(r: &mut R, out: &mut [u16]) -> Result<()> {
    for slot in out.iter_mut() {
        *slot = read_u16(r)?;
    }
    Ok(())
}

pub fn write_u32_array<W: Write>(w: &mut W, values: &[u32]) -> Result<()> {
    for value in values {
        write_u32(w, *value)?;
    }
    Ok(())
}

pub fn read_u32_array<R: Read>(r: &mut R, out: &mut [u32]) -> Result<()> {
    for slot in out.iter_mut() {
        *slot = read_u32(r)?;
    }
    Ok(())
}

pub fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_all(bytes)
        .map_err(|e| eyre!("failed to write {} bytes: {e}", bytes.len()))
}

pub fn read_exact_bytes<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf)
        .map_err(|e| eyre!("failed to read {} bytes: {e}", buf.len()))
}
