//! btree/page — decoding of one B-tree page into a tagged union.
//!
//! Decoding validates structure up front (table bounds, ordering bytes, fence
//! slots, type tags); record bodies of a leaf are cut lazily per item.
//!
//! Leaf item bytes: [order][flags] (little endian) or [flags][order] (big
//! endian), then the body. Flag bit 5 = trailing padding whose length is the last
//! byte of the item; bit 6 = body starts with the file offset (one word) of the
//! first oversize page.
//!
//! Parent fence bytes: [order][..][key...]; the order byte comes first in both
//! byte orders. At most one slot is open (empty fence), either the first or the
//! last; its position decides whether fences bound their child from below or
//! from above.

use crate::btree::layout::{self, OFF_PAGE_TYPE, OFF_PARENT_KEY_LIST_LEN, TABLE_ENTRY};
use crate::consts::{BTREE_PAGE_LEAF, BTREE_PAGE_OVERSIZE, BTREE_PAGE_PARENT, KEY_TERMINATOR};
use crate::error::{corrupt, Result};
use crate::header::{Endian, UvFileInfo};
use crate::util::field;

const LEAF_FLAG_PADDED: u8 = 1 << 5;
const LEAF_FLAG_OVERSIZED: u8 = 1 << 6;

/// Bytes in front of a fence key: order byte + one reserved byte.
const FENCE_PREFIX: usize = 2;
/// Bytes in front of a leaf item body: order byte + flags byte.
const ITEM_PREFIX: usize = 2;

#[derive(Debug)]
pub enum BTreePage {
    Leaf(LeafPage),
    Parent(ParentPage),
    Oversize(OversizePage),
}

impl BTreePage {
    /// Classify `buf` by its type tag and decode it.
    pub fn decode(buf: Vec<u8>, info: &UvFileInfo) -> Result<Self> {
        let tag = info.byte_order.u16_at(&buf, OFF_PAGE_TYPE, "page type")?;
        match tag {
            BTREE_PAGE_LEAF => LeafPage::decode(buf, info).map(BTreePage::Leaf),
            BTREE_PAGE_PARENT => ParentPage::decode(&buf, info).map(BTreePage::Parent),
            BTREE_PAGE_OVERSIZE => OversizePage::decode(&buf, info).map(BTreePage::Oversize),
            other => Err(corrupt!("unknown B-tree page type {}", other)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BTreePage::Leaf(_) => "leaf",
            BTreePage::Parent(_) => "parent",
            BTreePage::Oversize(_) => "oversize",
        }
    }
}

// ---------------- leaf ----------------

#[derive(Debug, Clone, Copy)]
struct LeafSlot {
    start: usize,
    len: usize,
    order: u8,
    flags: u8,
}

/// Leaf page: owns the page bytes plus the validated item table.
#[derive(Debug)]
pub struct LeafPage {
    buf: Vec<u8>,
    slots: Vec<LeafSlot>,
    byte_order: Endian,
    word: usize,
}

/// One leaf item with padding trimmed and the oversize head split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafItem<'a> {
    pub order: u8,
    /// File offset of the first oversize page, if the value continues there.
    pub oversize_head: Option<u64>,
    /// `key 0xFF value-prefix`
    pub body: &'a [u8],
}

impl<'a> LeafItem<'a> {
    /// Key and in-page part of the value.
    pub fn split(&self) -> Result<(&'a [u8], &'a [u8])> {
        let pos = self
            .body
            .iter()
            .position(|b| *b == KEY_TERMINATOR)
            .ok_or_else(|| corrupt!("leaf item of {} bytes has no key terminator", self.body.len()))?;
        Ok((&self.body[..pos], &self.body[pos + 1..]))
    }
}

impl LeafPage {
    pub fn decode(buf: Vec<u8>, info: &UvFileInfo) -> Result<Self> {
        let lay = layout::leaf(info.arch);
        let order = info.byte_order;
        let count = order.u16_at(&buf, lay.off_count, "leaf item count")? as usize;
        if count > lay.max_items {
            return Err(corrupt!(
                "leaf item count {} exceeds table capacity {}",
                count,
                lay.max_items
            ));
        }

        let mut slots = Vec::with_capacity(count);
        let mut last_order = 0u8;
        for i in 0..count {
            let rel = order.u16_at(&buf, lay.off_offsets + i * TABLE_ENTRY, "leaf item offset")? as usize;
            let len = order.u16_at(&buf, lay.off_lengths + i * TABLE_ENTRY, "leaf item length")? as usize;
            let start = lay.off_data + rel;
            let bytes = field(&buf, start, len, "leaf item")?;
            if len < ITEM_PREFIX {
                return Err(corrupt!("leaf item {} is {} bytes, shorter than its prefix", i, len));
            }
            let (item_order, flags) = match order {
                Endian::Little => (bytes[0], bytes[1]),
                Endian::Big => (bytes[1], bytes[0]),
            };
            if item_order < last_order {
                return Err(corrupt!(
                    "leaf items out of order: item {} has order byte {:#04x} after {:#04x}",
                    i,
                    item_order,
                    last_order
                ));
            }
            last_order = item_order;
            slots.push(LeafSlot {
                start,
                len,
                order: item_order,
                flags,
            });
        }

        Ok(Self {
            buf,
            slots,
            byte_order: order,
            word: info.arch.word(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Item `i` with its prefix, padding and oversize head stripped.
    pub fn item(&self, i: usize) -> Result<LeafItem<'_>> {
        let slot = self
            .slots
            .get(i)
            .ok_or_else(|| corrupt!("leaf item {} out of range ({} items)", i, self.slots.len()))?;
        let bytes = &self.buf[slot.start..slot.start + slot.len];

        let mut end = bytes.len();
        if slot.flags & LEAF_FLAG_PADDED != 0 {
            let pad = bytes[end - 1] as usize;
            if pad > end - ITEM_PREFIX {
                return Err(corrupt!(
                    "leaf item {}: padding {} exceeds item length {}",
                    i,
                    pad,
                    slot.len
                ));
            }
            end -= pad;
        }
        let mut body = &bytes[ITEM_PREFIX..end];

        let oversize_head = if slot.flags & LEAF_FLAG_OVERSIZED != 0 {
            let head = match self.word {
                4 => self.byte_order.u32_at(body, 0, "oversize head offset")? as u64,
                _ => self.byte_order.u64_at(body, 0, "oversize head offset")?,
            };
            body = &body[self.word..];
            Some(head)
        } else {
            None
        };

        Ok(LeafItem {
            order: slot.order,
            oversize_head,
            body,
        })
    }
}

// ---------------- parent ----------------

/// One child reference of a parent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSlot {
    /// Page index derived from the stored absolute offset.
    pub child: u64,
    /// Bound of the keys below `child`; None = unbounded (first or last slot only).
    pub fence: Option<Vec<u8>>,
}

/// Meaning of the fences of one parent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceBounds {
    /// Open first slot: each fence is the smallest key of its child.
    Lower,
    /// Open last slot (or none): each fence is the largest key of its child.
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentPage {
    /// Stored but not needed to read the tree.
    pub key_offset_list_length: u16,
    pub bounds: FenceBounds,
    pub slots: Vec<ParentSlot>,
}

impl ParentPage {
    pub fn decode(buf: &[u8], info: &UvFileInfo) -> Result<Self> {
        let lay = layout::parent(info.arch);
        let order = info.byte_order;
        let key_offset_list_length = order.u16_at(buf, OFF_PARENT_KEY_LIST_LEN, "parent key list length")?;
        let count = order.u16_at(buf, lay.off_count, "parent key count")? as usize;
        let slots_n = count + 1;
        if slots_n > lay.max_slots {
            return Err(corrupt!(
                "parent key count {} exceeds table capacity {}",
                count,
                lay.max_slots - 1
            ));
        }

        let word = info.arch.word();
        let mut slots = Vec::with_capacity(slots_n);
        let mut last_order = 0u8;
        for i in 0..slots_n {
            let child_off = info.word_at(buf, lay.off_children + i * word, "child pointer")?;
            let child = info.group_index_of(child_off).ok_or_else(|| {
                corrupt!("parent slot {}: child offset {} lies inside the file header", i, child_off)
            })?;

            let key_off = order.u16_at(buf, lay.off_key_offsets + i * TABLE_ENTRY, "fence offset")? as usize;
            let key_len = order.u16_at(buf, lay.off_key_lengths + i * TABLE_ENTRY, "fence length")? as usize;
            let fence = if key_len == 0 {
                if i != 0 && i + 1 != slots_n {
                    return Err(corrupt!("parent slot {} has an empty fence key", i));
                }
                None
            } else {
                let bytes = field(buf, lay.off_key_data + key_off, key_len, "fence key")?;
                if bytes.len() < FENCE_PREFIX {
                    return Err(corrupt!("parent slot {}: fence of {} bytes", i, bytes.len()));
                }
                if bytes[0] < last_order {
                    return Err(corrupt!(
                        "parent fences out of order: slot {} has order byte {:#04x} after {:#04x}",
                        i,
                        bytes[0],
                        last_order
                    ));
                }
                last_order = bytes[0];
                Some(bytes[FENCE_PREFIX..].to_vec())
            };
            slots.push(ParentSlot { child, fence });
        }

        let open = slots.iter().filter(|s| s.fence.is_none()).count();
        if open > 1 {
            return Err(corrupt!("parent page has {} slots without a fence key", open));
        }
        let bounds = if slots_n > 1 && slots[0].fence.is_none() {
            FenceBounds::Lower
        } else {
            FenceBounds::Upper
        };

        Ok(Self {
            key_offset_list_length,
            bounds,
            slots,
        })
    }

    /// Index of the slot to descend into for `key`, or None when no child can
    /// hold it.
    /// - lower bounds: the last slot whose fence is open or <= key;
    /// - upper bounds: the first slot whose fence is open or >= key.
    pub fn route(&self, key: &[u8]) -> Option<usize> {
        match self.bounds {
            FenceBounds::Lower => self.slots.iter().rposition(|s| match &s.fence {
                None => true,
                Some(f) => f.as_slice() <= key,
            }),
            FenceBounds::Upper => self.slots.iter().position(|s| match &s.fence {
                None => true,
                Some(f) => key <= f.as_slice(),
            }),
        }
    }
}

// ---------------- oversize ----------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizePage {
    /// Absolute offset of the next oversize page; 0 ends the chain.
    pub next: u64,
    pub data: Vec<u8>,
}

impl OversizePage {
    pub fn decode(buf: &[u8], info: &UvFileInfo) -> Result<Self> {
        let tag = info.byte_order.u16_at(buf, OFF_PAGE_TYPE, "page type")?;
        if tag != BTREE_PAGE_OVERSIZE {
            return Err(corrupt!("expected oversize page (type {}), found type {}", BTREE_PAGE_OVERSIZE, tag));
        }
        let lay = layout::oversize(info.arch);
        let next = info.word_at(buf, lay.off_next, "oversize next offset")?;
        let len = info.byte_order.u32_at(buf, lay.off_len, "oversize length")? as usize;
        let data = field(buf, lay.off_data, len, "oversize payload")?.to_vec();
        Ok(Self { next, data })
    }
}
