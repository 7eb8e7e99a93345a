//! util — small helpers shared by the decoders.
//!
//! Contains:
//! - `field()`: bounds-checked sub-slice of a decoded buffer (OOB = corruption).
//! - `read_exact_at()` / `read_up_to()`: positioned reads on a `Read + Seek` source.
//! - `replace_pair()`: byte-pair substitution used by directory layouts.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{corrupt, Result};

/// `buf[off..off + len]`, or `StructuralCorruption` naming `what` when the range
/// falls outside the buffer.
#[inline]
pub fn field<'a>(buf: &'a [u8], off: usize, len: usize, what: &str) -> Result<&'a [u8]> {
    off.checked_add(len)
        .and_then(|end| buf.get(off..end))
        .ok_or_else(|| {
            corrupt!(
                "{} out of bounds (off={}, len={}, buffer={})",
                what,
                off,
                len,
                buf.len()
            )
        })
}

/// Read exactly `len` bytes at `offset`. A short source is corruption, not EOF.
pub fn read_exact_at<R: Read + Seek>(src: &mut R, offset: u64, len: usize) -> Result<Vec<u8>> {
    src.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    let mut filled = 0usize;
    while filled < len {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(corrupt!(
                "short read at offset {}: wanted {} bytes, got {}",
                offset,
                len,
                filled
            ));
        }
        filled += n;
    }
    Ok(buf)
}

/// Read up to `len` bytes at `offset`; returns fewer at end of source.
pub fn read_up_to<R: Read + Seek>(src: &mut R, offset: u64, len: usize) -> Result<Vec<u8>> {
    src.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len.min(1 << 20));
    src.by_ref().take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Replace every non-overlapping occurrence of `from` (left to right) with `to`.
pub fn replace_pair(data: &[u8], from: &[u8], to: u8) -> Vec<u8> {
    if from.is_empty() {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0usize;
    while i < data.len() {
        if data[i..].starts_with(from) {
            out.push(to);
            i += from.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}
