// src/header.rs — file header of hashed and B-tree files
//
// First physical block (up to 1024 bytes), multi-byte fields in the file's byte order:
//   [0..4]   LE: [revision][arch][0xEF 0xAC]    BE: [..][..][arch][revision]
//   u32 @4   file_type
//   modulus  u32 @12 (32-bit) | u64 @8 (64-bit); type 30: u32 @0x24 | u64 @0x20
//   u32 @16  separation (group = separation * 512 bytes)
//   u32 @0x48 dynamic hash algorithm id (type 30 only)
//
// Policy:
// - revision must be 0x0c, anything else is UnsupportedRevision.
// - header_length = group_length for even separation, else one 1024-byte block.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::consts::{
    ARCH_BYTE_32, BE_OFF_ARCH, BE_OFF_REVISION, BLOCK_UNIT, FILE_TYPE_DYNAMIC, HDR32_OFF_MODULUS,
    HDR32_OFF_MODULUS_DYN, HDR64_OFF_MODULUS, HDR64_OFF_MODULUS_DYN, HDR_OFF_DYN_HASH_ALG,
    HDR_OFF_FILE_TYPE, HDR_OFF_SEPARATION, HEADER_BLOCK, HEADER_MIN, LE_MAGIC, LE_OFF_ARCH,
    LE_OFF_REVISION, SUPPORTED_REVISION,
};
use crate::error::{corrupt, Result, UvError};
use crate::util::field;

/// Byte order of every multi-byte field in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn u16(self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big => BigEndian::read_u16(b),
        }
    }

    #[inline]
    pub fn u32(self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big => BigEndian::read_u32(b),
        }
    }

    #[inline]
    pub fn u64(self, b: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(b),
            Endian::Big => BigEndian::read_u64(b),
        }
    }

    /// Unsigned integer over all of `b` (1..=8 bytes).
    #[inline]
    pub fn uint(self, b: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_uint(b, b.len()),
            Endian::Big => BigEndian::read_uint(b, b.len()),
        }
    }

    /// Bounds-checked u16 at `off`.
    pub fn u16_at(self, buf: &[u8], off: usize, what: &str) -> Result<u16> {
        Ok(self.u16(field(buf, off, 2, what)?))
    }

    /// Bounds-checked u32 at `off`.
    pub fn u32_at(self, buf: &[u8], off: usize, what: &str) -> Result<u32> {
        Ok(self.u32(field(buf, off, 4, what)?))
    }

    /// Bounds-checked u64 at `off`.
    pub fn u64_at(self, buf: &[u8], off: usize, what: &str) -> Result<u64> {
        Ok(self.u64(field(buf, off, 8, what)?))
    }
}

/// Word width of the on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Bits32,
    Bits64,
}

impl Arch {
    /// Size of a file pointer in bytes.
    #[inline]
    pub fn word(self) -> usize {
        match self {
            Arch::Bits32 => 4,
            Arch::Bits64 => 8,
        }
    }
}

/// Geometry of one hashed or B-tree file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvFileInfo {
    pub byte_order: Endian,
    pub arch: Arch,
    pub file_type: u32,
    /// Bucket count (hashed files) / page divisor (B-tree).
    pub modulus: u64,
    /// Blocks per group.
    pub separation: u32,
    /// separation * 512
    pub group_length: u64,
    /// group_length for even separation, else 1024.
    pub header_length: u64,
    /// Present for dynamic (type 30) files only.
    pub dyn_hash_alg: Option<u32>,
}

impl UvFileInfo {
    /// Read a pointer-sized (4 or 8 byte) field at `off`.
    pub fn word_at(&self, buf: &[u8], off: usize, what: &str) -> Result<u64> {
        match self.arch {
            Arch::Bits32 => Ok(self.byte_order.u32_at(buf, off, what)? as u64),
            Arch::Bits64 => self.byte_order.u64_at(buf, off, what),
        }
    }

    /// Absolute offset of group (bucket / page) `index`.
    #[inline]
    pub fn group_offset(&self, index: u64) -> u64 {
        self.header_length
            .saturating_add(index.saturating_mul(self.group_length))
    }

    /// Group index containing absolute `offset`, or None below the header.
    #[inline]
    pub fn group_index_of(&self, offset: u64) -> Option<u64> {
        offset
            .checked_sub(self.header_length)
            .map(|rel| rel / self.group_length)
    }
}

/// Decode the geometry from the first block of a file.
pub fn parse_file_header(buf: &[u8]) -> Result<UvFileInfo> {
    if buf.len() < HEADER_MIN {
        return Err(corrupt!(
            "file header truncated: {} bytes, need at least {}",
            buf.len(),
            HEADER_MIN
        ));
    }

    let (byte_order, arch_byte, revision) = if buf[2..4] == LE_MAGIC {
        (Endian::Little, buf[LE_OFF_ARCH], buf[LE_OFF_REVISION])
    } else {
        (Endian::Big, buf[BE_OFF_ARCH], buf[BE_OFF_REVISION])
    };

    if revision != SUPPORTED_REVISION {
        return Err(UvError::UnsupportedRevision(revision));
    }

    let file_type = byte_order.u32_at(buf, HDR_OFF_FILE_TYPE, "file_type")?;
    let (arch, modulus) = if arch_byte == ARCH_BYTE_32 {
        let off = if file_type == FILE_TYPE_DYNAMIC {
            HDR32_OFF_MODULUS_DYN
        } else {
            HDR32_OFF_MODULUS
        };
        (Arch::Bits32, byte_order.u32_at(buf, off, "modulus")? as u64)
    } else {
        let off = if file_type == FILE_TYPE_DYNAMIC {
            HDR64_OFF_MODULUS_DYN
        } else {
            HDR64_OFF_MODULUS
        };
        (Arch::Bits64, byte_order.u64_at(buf, off, "modulus")?)
    };
    let separation = byte_order.u32_at(buf, HDR_OFF_SEPARATION, "separation")?;
    if separation == 0 {
        return Err(corrupt!("separation is zero"));
    }

    let dyn_hash_alg = if file_type == FILE_TYPE_DYNAMIC {
        Some(byte_order.u32_at(buf, HDR_OFF_DYN_HASH_ALG, "dyn_hash_alg")?)
    } else {
        None
    };

    let group_length = separation as u64 * BLOCK_UNIT;
    let header_length = if separation % 2 == 0 {
        group_length
    } else {
        HEADER_BLOCK as u64
    };

    Ok(UvFileInfo {
        byte_order,
        arch,
        file_type,
        modulus,
        separation,
        group_length,
        header_length,
        dyn_hash_alg,
    })
}

/// Read the first block of `src` (from its current position) and decode it.
pub fn read_file_header<R: Read>(src: &mut R) -> Result<UvFileInfo> {
    let mut buf = Vec::with_capacity(HEADER_BLOCK);
    src.by_ref().take(HEADER_BLOCK as u64).read_to_end(&mut buf)?;
    if buf.len() >= HEADER_MIN {
        buf.resize(HEADER_BLOCK, 0);
    }
    parse_file_header(&buf)
}
