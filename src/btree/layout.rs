//! btree/layout — fixed field offsets of B-tree pages per architecture.
//!
//! Every page starts with a u16 type tag at offset 0 (see consts::BTREE_PAGE_*).
//!
//! Leaf page:
//! - 32-bit: [count u16 @0x0c][offsets u16 x128 @0x0e][lengths u16 x128 @0x10e][data @0x20e]
//! - 64-bit: [count u16 @0x18][offsets u16 x128 @0x1a][lengths u16 x128 @0x11a][data @0x21a]
//!   Item offsets are relative to the data area.
//!
//! Parent page:
//! - 32-bit: [child ptr u32 @4 + 4i][count u16 @0x604][key offsets @0x606][key lengths @0x906][key data @0xc06]
//! - 64-bit: [child ptr u64 @8 + 8i][count u16 @0xc08][key offsets @0xc0a][key lengths @0xf0a][key data @0x120a]
//!   `count` fence keys -> `count + 1` slots (child pointer + fence).
//!
//! Oversize page:
//! - 32-bit: [next u32 @4][len u32 @8][data @12]
//! - 64-bit: [len u32 @4][next u64 @8][data @16]

use crate::header::Arch;

/// Offset of the u16 page type tag.
pub const OFF_PAGE_TYPE: usize = 0;
/// u16 "key_offset_list_length" of parent pages (kept, not used for reading).
pub const OFF_PARENT_KEY_LIST_LEN: usize = 2;

/// Size of one entry in the leaf / parent offset and length tables.
pub const TABLE_ENTRY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafLayout {
    pub off_count: usize,
    pub off_offsets: usize,
    pub off_lengths: usize,
    pub off_data: usize,
    pub max_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLayout {
    pub off_children: usize,
    pub off_count: usize,
    pub off_key_offsets: usize,
    pub off_key_lengths: usize,
    pub off_key_data: usize,
    /// Slots the child pointer array and the key tables have room for.
    pub max_slots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversizeLayout {
    pub off_next: usize,
    pub off_len: usize,
    pub off_data: usize,
}

pub const LEAF32: LeafLayout = LeafLayout {
    off_count: 0x0c,
    off_offsets: 0x0e,
    off_lengths: 0x10e,
    off_data: 0x20e,
    max_items: 0x100 / TABLE_ENTRY,
};

pub const LEAF64: LeafLayout = LeafLayout {
    off_count: 0x18,
    off_offsets: 0x1a,
    off_lengths: 0x11a,
    off_data: 0x21a,
    max_items: 0x100 / TABLE_ENTRY,
};

pub const PARENT32: ParentLayout = ParentLayout {
    off_children: 4,
    off_count: 0x604,
    off_key_offsets: 0x606,
    off_key_lengths: 0x906,
    off_key_data: 0xc06,
    max_slots: 0x300 / TABLE_ENTRY,
};

pub const PARENT64: ParentLayout = ParentLayout {
    off_children: 8,
    off_count: 0xc08,
    off_key_offsets: 0xc0a,
    off_key_lengths: 0xf0a,
    off_key_data: 0x120a,
    max_slots: 0x300 / TABLE_ENTRY,
};

pub const OVERSIZE32: OversizeLayout = OversizeLayout {
    off_next: 4,
    off_len: 8,
    off_data: 12,
};

pub const OVERSIZE64: OversizeLayout = OversizeLayout {
    off_next: 8,
    off_len: 4,
    off_data: 16,
};

#[inline]
pub fn leaf(arch: Arch) -> &'static LeafLayout {
    match arch {
        Arch::Bits32 => &LEAF32,
        Arch::Bits64 => &LEAF64,
    }
}

#[inline]
pub fn parent(arch: Arch) -> &'static ParentLayout {
    match arch {
        Arch::Bits32 => &PARENT32,
        Arch::Bits64 => &PARENT64,
    }
}

#[inline]
pub fn oversize(arch: Arch) -> &'static OversizeLayout {
    match arch {
        Arch::Bits32 => &OVERSIZE32,
        Arch::Bits64 => &OVERSIZE64,
    }
}
