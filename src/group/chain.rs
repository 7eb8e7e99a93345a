//! group/chain — walks the linked list of items of one hashed group.
//!
//! The walker owns no file: it borrows the primary handle and, for dynamic files,
//! the overflow handle for as long as the caller iterates. Each step decodes the
//! item at the cursor, follows its forward pointer (switching to the overflow
//! source when flagged), pulls in continuation items of oversized records and
//! trims padding.
//!
//! Item length: distance to the forward pointer when that pointer lands inside
//! the current group block, otherwise the rest of the block.

use std::io::{Read, Seek};

use log::{debug, trace};

use crate::config::ReaderConfig;
use crate::error::{corrupt, Result};
use crate::group::item::{split_oversize_prefix, split_record, strip_padding, ItemHeader};
use crate::header::UvFileInfo;
use crate::record::Record;
use crate::util::read_up_to;

/// Where the next item lives: absolute offset + "in overflow file".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCursor {
    pub offset: u64,
    pub in_overflow: bool,
}

/// Result of decoding one physical item.
#[derive(Debug)]
pub struct ItemRead {
    /// None when the chain ends after this item.
    pub next: Option<ItemCursor>,
    /// None for free items.
    pub buffer: Option<Vec<u8>>,
}

pub struct ChainWalker<'a, R> {
    info: &'a UvFileInfo,
    cfg: &'a ReaderConfig,
    primary: &'a mut R,
    overflow: Option<&'a mut R>,
    cursor: Option<ItemCursor>,
    visited: usize,
}

impl<'a, R: Read + Seek> ChainWalker<'a, R> {
    pub fn new(
        info: &'a UvFileInfo,
        cfg: &'a ReaderConfig,
        primary: &'a mut R,
        overflow: Option<&'a mut R>,
    ) -> Self {
        Self {
            info,
            cfg,
            primary,
            overflow,
            cursor: None,
            visited: 0,
        }
    }

    /// Position the walker at the first item of group `index` (primary file).
    pub fn start_group(&mut self, index: u64) {
        let offset = self.info.group_offset(index);
        trace!("group {} starts at offset {}", index, offset);
        self.cursor = Some(ItemCursor {
            offset,
            in_overflow: false,
        });
        self.visited = 0;
    }

    /// Next record of the current group, or None once its chain is exhausted.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        while let Some(cur) = self.cursor {
            self.visited += 1;
            if self.visited > self.cfg.max_chain_items {
                self.cursor = None;
                return Err(corrupt!(
                    "item chain longer than {} items (loop?) at offset {}",
                    self.cfg.max_chain_items,
                    cur.offset
                ));
            }

            let item = match self.read_item(cur, false)? {
                Some(item) => item,
                None => {
                    self.cursor = None;
                    return Ok(None);
                }
            };
            self.cursor = item.next;

            match item.buffer {
                Some(buf) if !buf.is_empty() => return split_record(buf).map(Some),
                _ => continue,
            }
        }
        Ok(None)
    }

    fn source(&mut self, in_overflow: bool) -> &mut R {
        if in_overflow {
            if let Some(over) = self.overflow.as_deref_mut() {
                return over;
            }
        }
        &mut *self.primary
    }

    /// Decode the item at `cur`. None means there is no further data at this
    /// position (empty header read, or a free item that ends the chain).
    pub fn read_item(&mut self, cur: ItemCursor, continuation: bool) -> Result<Option<ItemRead>> {
        let info = self.info;
        let hdr_size = ItemHeader::size(info.arch);

        let raw = read_up_to(self.source(cur.in_overflow), cur.offset, hdr_size)?;
        if raw.is_empty() {
            return Ok(None);
        }
        if raw.len() < hdr_size {
            return Err(corrupt!(
                "truncated item header at offset {} ({} of {} bytes)",
                cur.offset,
                raw.len(),
                hdr_size
            ));
        }
        let hdr = ItemHeader::decode(&raw, info)?;
        trace!(
            "item @{}{} fwd={} flags={:#06x}",
            cur.offset,
            if cur.in_overflow { " (overflow)" } else { "" },
            hdr.forward,
            hdr.raw_flags
        );

        let block_index = info
            .group_index_of(cur.offset)
            .ok_or_else(|| corrupt!("item offset {} lies inside the file header", cur.offset))?;
        let block_start = info.group_offset(block_index);
        let block_end = block_start.saturating_add(info.group_length);

        let next = (hdr.forward != 0).then(|| ItemCursor {
            offset: hdr.forward,
            in_overflow: hdr.flags.forward_to_overflow || cur.in_overflow,
        });

        // items inside one block are laid out front to back; a pointer back into
        // the same block (same source) is a reordered or looping chain
        if let Some(n) = next {
            if n.in_overflow == cur.in_overflow && n.offset > block_start && n.offset <= cur.offset {
                return Err(corrupt!(
                    "forward pointer {} does not advance past item at {} in block {}",
                    n.offset,
                    cur.offset,
                    block_index
                ));
            }
        }

        if hdr.flags.free {
            return Ok(next.map(|n| ItemRead {
                next: Some(n),
                buffer: None,
            }));
        }

        let data_start = cur.offset + hdr_size as u64;
        let data_end = match next {
            Some(_) if hdr.forward > block_start && hdr.forward < block_end => hdr.forward,
            _ => block_end,
        };
        let len = data_end.saturating_sub(data_start) as usize;
        let mut buf = if len > 0 {
            read_up_to(self.source(cur.in_overflow), data_start, len)?
        } else {
            Vec::new()
        };
        if buf.len() < len {
            debug!(
                "item at {} cut short by end of file ({} of {} bytes)",
                cur.offset,
                buf.len(),
                len
            );
        }

        if hdr.flags.oversized {
            if continuation {
                return Err(corrupt!(
                    "continuation item at {} is itself oversized",
                    cur.offset
                ));
            }
            buf = self.assemble_oversize(cur.offset, &buf)?;
        }

        if hdr.flags.padded {
            strip_padding(&mut buf, info.byte_order)?;
        }

        Ok(Some(ItemRead {
            next,
            buffer: Some(buf),
        }))
    }

    /// Inline remainder + `count` continuation buffers from the overflow source.
    fn assemble_oversize(&mut self, at: u64, inline: &[u8]) -> Result<Vec<u8>> {
        let (mut os_offset, count, rest) = split_oversize_prefix(inline, self.info)?;
        debug!(
            "oversized item at {}: {} continuation item(s) from offset {}",
            at, count, os_offset
        );
        let mut out = rest.to_vec();

        for i in 0..count {
            if i as usize >= self.cfg.max_chain_items {
                return Err(corrupt!(
                    "oversized item at {} has more than {} continuation items",
                    at,
                    self.cfg.max_chain_items
                ));
            }
            let cur = ItemCursor {
                offset: os_offset,
                in_overflow: true,
            };
            let item = self.read_item(cur, true)?.ok_or_else(|| {
                corrupt!(
                    "oversized item at {}: continuation {} of {} missing at offset {}",
                    at,
                    i + 1,
                    count,
                    os_offset
                )
            })?;
            if let Some(part) = item.buffer {
                out.extend_from_slice(&part);
            }
            if out.len() > self.cfg.max_value_bytes {
                return Err(corrupt!(
                    "oversized item at {} exceeds max_value_bytes {}",
                    at,
                    self.cfg.max_value_bytes
                ));
            }
            match item.next {
                Some(n) => os_offset = n.offset,
                None => break,
            }
        }
        Ok(out)
    }
}
