//! group/item — physical item header of a hashed group and payload post-processing.
//!
//! Header layout (file byte order):
//! - 32-bit (12 bytes): [fwd u32 @0][back u32 @4][.. u16 @8][flags u16 @10]
//! - 64-bit (24 bytes): [fwd u64 @0][back u64 @8][.. u16 @16][flags u16 @18][.. u32 @20]
//!
//! Flag bit positions depend on the byte order (see `ItemFlags::from_raw`).

use crate::consts::{
    ITEM32_HDR_SIZE, ITEM32_OFF_BACK, ITEM32_OFF_FLAGS, ITEM64_HDR_SIZE, ITEM64_OFF_BACK,
    ITEM64_OFF_FLAGS, KEY_TERMINATOR, OVERSIZE32_PREFIX, OVERSIZE64_PREFIX,
};
use crate::error::{corrupt, Result};
use crate::header::{Arch, Endian, UvFileInfo};
use crate::record::Record;

/// Decoded item flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFlags {
    /// Item holds no record; only its forward pointer matters.
    pub free: bool,
    /// Trailing padding; the last byte (or an 8-byte tail) gives its length.
    pub padded: bool,
    pub new_style_padding: bool,
    /// Forward pointer addresses the overflow file.
    pub forward_to_overflow: bool,
    /// Payload starts with [offset][count] of continuation items.
    pub oversized: bool,
    /// Item is a continuation buffer of an oversized item.
    pub oversized_buffer: bool,
}

impl ItemFlags {
    pub fn from_raw(raw: u16, order: Endian) -> Self {
        let bit = |n: u16| raw & (1 << n) != 0;
        match order {
            Endian::Little => Self {
                free: bit(1),
                padded: bit(5),
                new_style_padding: bit(4),
                forward_to_overflow: bit(13),
                oversized: bit(7),
                oversized_buffer: bit(6),
            },
            Endian::Big => Self {
                free: bit(14),
                padded: bit(10),
                new_style_padding: bit(11),
                forward_to_overflow: bit(2),
                oversized: bit(8),
                oversized_buffer: bit(9),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemHeader {
    pub forward: u64,
    /// Back pointer; not needed for reading.
    pub back: u64,
    pub raw_flags: u16,
    pub flags: ItemFlags,
}

impl ItemHeader {
    #[inline]
    pub fn size(arch: Arch) -> usize {
        match arch {
            Arch::Bits32 => ITEM32_HDR_SIZE,
            Arch::Bits64 => ITEM64_HDR_SIZE,
        }
    }

    pub fn decode(buf: &[u8], info: &UvFileInfo) -> Result<Self> {
        let (off_back, off_flags) = match info.arch {
            Arch::Bits32 => (ITEM32_OFF_BACK, ITEM32_OFF_FLAGS),
            Arch::Bits64 => (ITEM64_OFF_BACK, ITEM64_OFF_FLAGS),
        };
        let forward = info.word_at(buf, 0, "item forward pointer")?;
        let back = info.word_at(buf, off_back, "item back pointer")?;
        let raw_flags = info.byte_order.u16_at(buf, off_flags, "item flags")?;
        Ok(Self {
            forward,
            back,
            raw_flags,
            flags: ItemFlags::from_raw(raw_flags, info.byte_order),
        })
    }
}

/// Oversize prefix of an item payload: where the continuation items start and
/// how many there are. Returns the prefix and the inline remainder.
pub fn split_oversize_prefix<'a>(buf: &'a [u8], info: &UvFileInfo) -> Result<(u64, u32, &'a [u8])> {
    let (prefix, count_off) = match info.arch {
        Arch::Bits32 => (OVERSIZE32_PREFIX, 4),
        Arch::Bits64 => (OVERSIZE64_PREFIX, 8),
    };
    let offset = info.word_at(buf, 0, "oversize offset")?;
    let count = info.byte_order.u32_at(buf, count_off, "oversize count")?;
    Ok((offset, count, &buf[prefix..]))
}

/// Trim trailing padding in place. The last byte is the pad length; zero there
/// means the length is an 8-byte count at the tail instead (the whole buffer
/// when it is shorter than 8 bytes).
pub fn strip_padding(buf: &mut Vec<u8>, order: Endian) -> Result<()> {
    let last = *buf
        .last()
        .ok_or_else(|| corrupt!("padded item has an empty buffer"))?;
    let pad = if last != 0 {
        last as u64
    } else {
        order.uint(&buf[buf.len().saturating_sub(8)..])
    };
    if pad > buf.len() as u64 {
        return Err(corrupt!(
            "padding of {} bytes exceeds item buffer of {} bytes",
            pad,
            buf.len()
        ));
    }
    buf.truncate(buf.len() - pad as usize);
    Ok(())
}

/// Split an assembled item buffer on the first key terminator.
pub fn split_record(mut buf: Vec<u8>) -> Result<Record> {
    let pos = buf
        .iter()
        .position(|b| *b == KEY_TERMINATOR)
        .ok_or_else(|| corrupt!("item of {} bytes has no key terminator", buf.len()))?;
    let raw = buf.split_off(pos + 1);
    buf.truncate(pos);
    Ok(Record::new(buf, raw))
}
