//! Format constants shared by the decoders (file header, item chains, B-tree pages,
//! record delimiters, directory layouts).

// -------- Record delimiters --------

/// Separates a record key from its raw value inside a stored item.
pub const KEY_TERMINATOR: u8 = 0xFF;
/// Field mark.
pub const FIELD_MARK: u8 = 0xFE;
/// Value mark.
pub const VALUE_MARK: u8 = 0xFD;
/// Subvalue mark.
pub const SUBVALUE_MARK: u8 = 0xFC;

// -------- File header (first physical block) --------

/// Number of bytes consumed by the header decoder.
pub const HEADER_BLOCK: usize = 1024;
/// Smallest readable header: everything up to and including the dyn-hash id.
pub const HEADER_MIN: usize = 0x4C;
/// Size unit of a group: `group_length = separation * BLOCK_UNIT`.
pub const BLOCK_UNIT: u64 = 512;

/// Bytes [2..4] of a little-endian header ("machine class" marker).
pub const LE_MAGIC: [u8; 2] = [0xEF, 0xAC];
/// Only supported revision byte.
pub const SUPPORTED_REVISION: u8 = 0x0C;
/// Architecture byte for the 32-bit layout; every other value means 64-bit.
pub const ARCH_BYTE_32: u8 = 1;

/// (arch, revision) byte offsets for little-endian headers.
pub const LE_OFF_ARCH: usize = 1;
pub const LE_OFF_REVISION: usize = 0;
/// (arch, revision) byte offsets for big-endian headers.
pub const BE_OFF_ARCH: usize = 2;
pub const BE_OFF_REVISION: usize = 3;

/// file_type (u32), both layouts.
pub const HDR_OFF_FILE_TYPE: usize = 4;
/// modulus: u32 @12 (32-bit) or u64 @8 (64-bit).
pub const HDR32_OFF_MODULUS: usize = 12;
pub const HDR64_OFF_MODULUS: usize = 8;
/// modulus for dynamic (type 30) files.
pub const HDR32_OFF_MODULUS_DYN: usize = 0x24;
pub const HDR64_OFF_MODULUS_DYN: usize = 0x20;
/// separation (u32), both layouts.
pub const HDR_OFF_SEPARATION: usize = 16;
/// dynamic hash algorithm id (u32).
pub const HDR_OFF_DYN_HASH_ALG: usize = 0x48;

// -------- File type codes --------

pub const FILE_TYPE_BTREE: u32 = 25;
pub const FILE_TYPE_DYNAMIC: u32 = 30;

// -------- Item headers (hashed groups) --------

/// 32-bit item header: [fwd u32][back u32][.. u16][flags u16].
pub const ITEM32_HDR_SIZE: usize = 12;
pub const ITEM32_OFF_BACK: usize = 4;
pub const ITEM32_OFF_FLAGS: usize = 10;
/// 64-bit item header: [fwd u64][back u64][.. u16][flags u16][.. u32].
pub const ITEM64_HDR_SIZE: usize = 24;
pub const ITEM64_OFF_BACK: usize = 8;
pub const ITEM64_OFF_FLAGS: usize = 18;

/// Oversize prefix inside an item payload: [offset word][count u32].
pub const OVERSIZE32_PREFIX: usize = 8;
pub const OVERSIZE64_PREFIX: usize = 12;

// -------- B-tree page type tags --------

pub const BTREE_PAGE_PARENT: u16 = 1;
pub const BTREE_PAGE_LEAF: u16 = 2;
pub const BTREE_PAGE_OVERSIZE: u16 = 8;

// -------- Directory layouts --------

/// Zero-byte marker selecting the nested (type 1) layout.
pub const TYPE1_MARKER: &str = ".Type1";
/// Marker selecting the dynamic hashed layout.
pub const TYPE30_MARKER: &str = ".Type30";
/// Primary data file of a dynamic hashed file.
pub const TYPE30_DATA: &str = "DATA.30";
/// Overflow file of a dynamic hashed file.
pub const TYPE30_OVER: &str = "OVER.30";
/// Longest escaped path segment in the nested layout.
pub const TYPE1_SEGMENT_MAX: usize = 14;

// -------- Account --------

/// Catalog file inside an account directory.
pub const VOC_FILE: &str = "VOC";
