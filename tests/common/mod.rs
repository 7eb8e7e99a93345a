//! Shared fixture writers for the integration tests.
//!
//! Every writer lays files out byte by byte from the format description, without
//! going through the crate's decoders, so tests compare two independent views.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use mattock::{Arch, Endian, Record};

pub type Dataset = BTreeMap<Vec<u8>, Vec<u8>>;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

pub fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("mattock-test-{prefix}-{pid}-{t}-{id}"))
}

/// Collect records into a map, failing on duplicates.
pub fn collect(records: impl Iterator<Item = mattock::Result<Record>>) -> Result<Dataset> {
    let mut out = Dataset::new();
    for r in records {
        let r = r?;
        if out.insert(r.key.clone(), r.raw).is_some() {
            anyhow::bail!("duplicate key {:?}", String::from_utf8_lossy(&r.key));
        }
    }
    Ok(out)
}

// ---------------- geometry ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geo {
    pub order: Endian,
    pub arch: Arch,
}

impl Geo {
    pub fn all() -> [Geo; 4] {
        [
            Geo { order: Endian::Little, arch: Arch::Bits32 },
            Geo { order: Endian::Big, arch: Arch::Bits32 },
            Geo { order: Endian::Little, arch: Arch::Bits64 },
            Geo { order: Endian::Big, arch: Arch::Bits64 },
        ]
    }

    pub fn word(&self) -> usize {
        match self.arch {
            Arch::Bits32 => 4,
            Arch::Bits64 => 8,
        }
    }

    pub fn put_u16(&self, b: &mut [u8], off: usize, v: u16) {
        match self.order {
            Endian::Little => LittleEndian::write_u16(&mut b[off..off + 2], v),
            Endian::Big => BigEndian::write_u16(&mut b[off..off + 2], v),
        }
    }

    pub fn put_u32(&self, b: &mut [u8], off: usize, v: u32) {
        match self.order {
            Endian::Little => LittleEndian::write_u32(&mut b[off..off + 4], v),
            Endian::Big => BigEndian::write_u32(&mut b[off..off + 4], v),
        }
    }

    pub fn put_u64(&self, b: &mut [u8], off: usize, v: u64) {
        match self.order {
            Endian::Little => LittleEndian::write_u64(&mut b[off..off + 8], v),
            Endian::Big => BigEndian::write_u64(&mut b[off..off + 8], v),
        }
    }

    pub fn put_word(&self, b: &mut [u8], off: usize, v: u64) {
        match self.arch {
            Arch::Bits32 => self.put_u32(b, off, v as u32),
            Arch::Bits64 => self.put_u64(b, off, v),
        }
    }

    pub fn word_bytes(&self, v: u64) -> Vec<u8> {
        let mut b = vec![0u8; self.word()];
        self.put_word(&mut b, 0, v);
        b
    }

    pub fn u32_bytes(&self, v: u32) -> Vec<u8> {
        let mut b = vec![0u8; 4];
        self.put_u32(&mut b, 0, v);
        b
    }
}

pub const FT_STATIC: u32 = 18;
pub const FT_BTREE: u32 = 25;
pub const FT_DYNAMIC: u32 = 30;
pub const HASH_ALG: u32 = 2;

/// 1024-byte file header.
pub fn header_block(geo: Geo, file_type: u32, modulus: u64, separation: u32) -> Vec<u8> {
    let mut b = vec![0u8; 1024];
    let arch_byte = match geo.arch {
        Arch::Bits32 => 1u8,
        Arch::Bits64 => 2u8,
    };
    match geo.order {
        Endian::Little => {
            b[0] = 0x0c;
            b[1] = arch_byte;
            b[2] = 0xEF;
            b[3] = 0xAC;
        }
        Endian::Big => {
            b[2] = arch_byte;
            b[3] = 0x0c;
        }
    }
    geo.put_u32(&mut b, 4, file_type);
    geo.put_u32(&mut b, 16, separation);
    geo.put_u32(&mut b, 0x48, HASH_ALG);
    match (geo.arch, file_type == FT_DYNAMIC) {
        (Arch::Bits32, false) => geo.put_u32(&mut b, 12, modulus as u32),
        (Arch::Bits32, true) => geo.put_u32(&mut b, 0x24, modulus as u32),
        (Arch::Bits64, false) => geo.put_u64(&mut b, 8, modulus),
        (Arch::Bits64, true) => geo.put_u64(&mut b, 0x20, modulus),
    }
    b
}

pub fn header_length(separation: u32) -> usize {
    if separation % 2 == 0 {
        separation as usize * 512
    } else {
        1024
    }
}

// ---------------- hashed files ----------------

#[derive(Debug, Clone, Copy)]
pub enum ItemFlag {
    Free,
    Padded,
    ForwardToOverflow,
    Oversized,
    OversizedBuffer,
}

pub fn item_flags(geo: Geo, flags: &[ItemFlag]) -> u16 {
    let mut raw = 0u16;
    for f in flags {
        let bit = match (geo.order, f) {
            (Endian::Little, ItemFlag::Free) => 1,
            (Endian::Little, ItemFlag::Padded) => 5,
            (Endian::Little, ItemFlag::ForwardToOverflow) => 13,
            (Endian::Little, ItemFlag::Oversized) => 7,
            (Endian::Little, ItemFlag::OversizedBuffer) => 6,
            (Endian::Big, ItemFlag::Free) => 14,
            (Endian::Big, ItemFlag::Padded) => 10,
            (Endian::Big, ItemFlag::ForwardToOverflow) => 2,
            (Endian::Big, ItemFlag::Oversized) => 8,
            (Endian::Big, ItemFlag::OversizedBuffer) => 9,
        };
        raw |= 1 << bit;
    }
    raw
}

pub fn item_header_size(geo: Geo) -> usize {
    match geo.arch {
        Arch::Bits32 => 12,
        Arch::Bits64 => 24,
    }
}

/// Hashed file image under construction: primary file plus, for dynamic files,
/// the overflow file. Item chains are written front to back, each item's forward
/// pointer addressing the byte right after it; the chain ends with a free item.
pub struct HashedBuilder {
    pub geo: Geo,
    pub g: usize,
    pub hdr_len: usize,
    pub groups: u64,
    pub primary: Vec<u8>,
    pub overflow: Option<Vec<u8>>,
    /// (group, in overflow file, offset) of every record item written.
    pub item_offsets: Vec<(u64, bool, usize)>,
}

impl HashedBuilder {
    pub fn new_static(geo: Geo, separation: u32, modulus: u64) -> Self {
        let g = separation as usize * 512;
        let hdr_len = header_length(separation);
        let mut primary = header_block(geo, FT_STATIC, modulus, separation);
        primary.resize(hdr_len + modulus as usize * g, 0);
        Self {
            geo,
            g,
            hdr_len,
            groups: modulus,
            primary,
            overflow: None,
            item_offsets: Vec::new(),
        }
    }

    pub fn new_dynamic(geo: Geo, separation: u32, modulus: u64) -> Self {
        let g = separation as usize * 512;
        let hdr_len = header_length(separation);
        let groups = modulus + 1;
        let mut primary = header_block(geo, FT_DYNAMIC, modulus, separation);
        primary.resize(hdr_len + groups as usize * g, 0);
        Self {
            geo,
            g,
            hdr_len,
            groups,
            primary,
            overflow: Some(vec![0u8; hdr_len]),
            item_offsets: Vec::new(),
        }
    }

    fn dynamic(&self) -> bool {
        self.overflow.is_some()
    }

    fn buf(&mut self, in_overflow: bool) -> &mut Vec<u8> {
        match (in_overflow, self.overflow.as_mut()) {
            (true, Some(o)) => o,
            _ => &mut self.primary,
        }
    }

    fn alloc_block(&mut self, in_overflow: bool) -> usize {
        let g = self.g;
        let buf = self.buf(in_overflow);
        let off = buf.len();
        buf.resize(off + g, 0);
        off
    }

    fn put_item(&mut self, in_overflow: bool, pos: usize, fwd: u64, flags: u16, data: &[u8]) {
        let geo = self.geo;
        let h = item_header_size(geo);
        let flags_off = match geo.arch {
            Arch::Bits32 => 10,
            Arch::Bits64 => 18,
        };
        let buf = self.buf(in_overflow);
        geo.put_word(buf, pos, fwd);
        geo.put_u16(buf, pos + flags_off, flags);
        buf[pos + h..pos + h + data.len()].copy_from_slice(data);
    }

    /// Spread the dataset over the groups (byte-sum hash) and write every chain.
    pub fn write_dataset(&mut self, data: &Dataset) {
        let mut per_group: Vec<Vec<(&Vec<u8>, &Vec<u8>)>> = vec![Vec::new(); self.groups as usize];
        for (k, v) in data {
            let h = k.iter().map(|b| *b as u64).sum::<u64>() % self.groups;
            per_group[h as usize].push((k, v));
        }
        for (i, items) in per_group.into_iter().enumerate() {
            let items: Vec<(Vec<u8>, Vec<u8>)> =
                items.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            self.write_group(i as u64, &items);
        }
    }

    /// Write the chain of group `index`.
    pub fn write_group(&mut self, index: u64, items: &[(Vec<u8>, Vec<u8>)]) {
        let geo = self.geo;
        let g = self.g;
        let h = item_header_size(geo);
        let dynamic = self.dynamic();
        let link_flags = if dynamic {
            item_flags(geo, &[ItemFlag::Free, ItemFlag::ForwardToOverflow])
        } else {
            item_flags(geo, &[ItemFlag::Free])
        };

        let mut in_ovf = false;
        let mut block = self.hdr_len + index as usize * g;
        let mut pos = block;

        for (k, v) in items {
            let mut payload = k.clone();
            payload.push(0xFF);
            payload.extend_from_slice(v);

            if h + payload.len() + 3 + h <= g {
                // regular item, padded to 4 bytes with the one-byte form
                let pad = (4 - payload.len() % 4) % 4;
                let mut flags = Vec::new();
                if pad > 0 {
                    payload.extend(std::iter::repeat(0u8).take(pad - 1));
                    payload.push(pad as u8);
                    flags.push(ItemFlag::Padded);
                }
                if pos + h + payload.len() + h > block + g {
                    let next = self.alloc_block(dynamic);
                    self.put_item(in_ovf, pos, next as u64, link_flags, &[]);
                    block = next;
                    pos = next;
                    in_ovf = dynamic;
                }
                let end = pos + h + payload.len();
                self.put_item(in_ovf, pos, end as u64, item_flags(geo, &flags), &payload);
                self.item_offsets.push((index, in_ovf, pos));
                pos = end;
                continue;
            }

            // oversized: [offset][count][inline prefix] here, the rest in
            // continuation items filling whole blocks
            let prefix = geo.word() + 4;
            let inline = payload.len().min(16);
            if pos + h + prefix + inline + h > block + g {
                let next = self.alloc_block(dynamic);
                self.put_item(in_ovf, pos, next as u64, link_flags, &[]);
                block = next;
                pos = next;
                in_ovf = dynamic;
            }
            let cap = g - h;
            let chunks: Vec<Vec<u8>> = payload[inline..].chunks(cap).map(|c| c.to_vec()).collect();
            let blocks: Vec<usize> = chunks.iter().map(|_| self.alloc_block(dynamic)).collect();
            for (i, chunk) in chunks.iter().enumerate() {
                let fwd = if i + 1 < chunks.len() {
                    blocks[i + 1] as u64
                } else if chunk.len() == cap {
                    0
                } else {
                    (blocks[i] + h + chunk.len()) as u64
                };
                self.put_item(dynamic, blocks[i], fwd, item_flags(geo, &[ItemFlag::OversizedBuffer]), chunk);
            }
            let mut head = geo.word_bytes(blocks[0] as u64);
            head.extend_from_slice(&geo.u32_bytes(chunks.len() as u32));
            head.extend_from_slice(&payload[..inline]);
            let end = pos + h + head.len();
            self.put_item(in_ovf, pos, end as u64, item_flags(geo, &[ItemFlag::Oversized]), &head);
            self.item_offsets.push((index, in_ovf, pos));
            pos = end;
        }

        // terminal free item
        self.put_item(in_ovf, pos, 0, item_flags(geo, &[ItemFlag::Free]), &[]);
    }

    /// Write a static file to `path`.
    pub fn write_static(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.primary)?;
        Ok(())
    }

    /// Write a dynamic file directory (`.Type30`, `DATA.30`, `OVER.30`) at `dir`.
    pub fn write_dynamic(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(".Type30"), b"")?;
        fs::write(dir.join("DATA.30"), &self.primary)?;
        fs::write(dir.join("OVER.30"), self.overflow.as_deref().unwrap_or(&[]))?;
        Ok(())
    }
}

pub fn write_static_file(path: &Path, geo: Geo, separation: u32, modulus: u64, data: &Dataset) -> Result<()> {
    let mut b = HashedBuilder::new_static(geo, separation, modulus);
    b.write_dataset(data);
    b.write_static(path)
}

pub fn write_dynamic_file(dir: &Path, geo: Geo, separation: u32, modulus: u64, data: &Dataset) -> Result<()> {
    let mut b = HashedBuilder::new_dynamic(geo, separation, modulus);
    b.write_dataset(data);
    b.write_dynamic(dir)
}

// ---------------- B-tree files ----------------

pub const BT_SEPARATION: u32 = 16;
pub const BT_PAGE: usize = 8192;
pub const BT_HDR_LEN: usize = 8192;

struct LeafLay {
    count: usize,
    offsets: usize,
    lengths: usize,
    data: usize,
}

struct ParentLay {
    children: usize,
    count: usize,
    key_offsets: usize,
    key_lengths: usize,
    key_data: usize,
}

fn leaf_lay(arch: Arch) -> LeafLay {
    match arch {
        Arch::Bits32 => LeafLay { count: 0x0c, offsets: 0x0e, lengths: 0x10e, data: 0x20e },
        Arch::Bits64 => LeafLay { count: 0x18, offsets: 0x1a, lengths: 0x11a, data: 0x21a },
    }
}

fn parent_lay(arch: Arch) -> ParentLay {
    match arch {
        Arch::Bits32 => ParentLay {
            children: 4,
            count: 0x604,
            key_offsets: 0x606,
            key_lengths: 0x906,
            key_data: 0xc06,
        },
        Arch::Bits64 => ParentLay {
            children: 8,
            count: 0xc08,
            key_offsets: 0xc0a,
            key_lengths: 0xf0a,
            key_data: 0x120a,
        },
    }
}

/// How parent pages bound their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fences {
    /// Empty first slot, then the first key of each further child.
    Lower,
    /// Last key of each child, empty last slot.
    Upper,
}

/// Page of one subtree with the key range below it.
#[derive(Clone)]
struct Child {
    first: Vec<u8>,
    last: Vec<u8>,
    page: usize,
}

pub struct BTreeBuilder {
    pub geo: Geo,
    pub max_leaf_items: usize,
    pub fanout: usize,
    /// Items longer than this go to oversize pages.
    pub oversize_threshold: usize,
    pub fences: Fences,
}

impl BTreeBuilder {
    pub fn new(geo: Geo) -> Self {
        Self {
            geo,
            max_leaf_items: 128,
            fanout: 64,
            oversize_threshold: 1024,
            fences: Fences::Lower,
        }
    }

    pub fn with_fences(mut self, fences: Fences) -> Self {
        self.fences = fences;
        self
    }

    pub fn with_shape(mut self, max_leaf_items: usize, fanout: usize) -> Self {
        self.max_leaf_items = max_leaf_items;
        self.fanout = fanout;
        self
    }

    fn page_offset(index: usize) -> u64 {
        (BT_HDR_LEN + index * BT_PAGE) as u64
    }

    /// Whole file image.
    pub fn build(&self, data: &Dataset) -> Vec<u8> {
        let geo = self.geo;
        let mut pages: Vec<Vec<u8>> = vec![Vec::new()]; // 0 = root, filled last

        // leaf items: [order][flags] | [flags][order], body, padding
        let ll = leaf_lay(geo.arch);
        let leaf_room = BT_PAGE - ll.data;
        // (first key, last key, items)
        let mut leaves: Vec<(Vec<u8>, Vec<u8>, Vec<Vec<u8>>)> = Vec::new();
        let mut cur: Vec<Vec<u8>> = Vec::new();
        let mut cur_first: Vec<u8> = Vec::new();
        let mut cur_last: Vec<u8> = Vec::new();
        let mut cur_bytes = 0usize;

        for (k, v) in data {
            let order = k.first().copied().unwrap_or(0);
            let mut flags = 0u8;
            let mut body = Vec::new();
            if 2 + k.len() + 1 + v.len() > self.oversize_threshold {
                flags |= 1 << 6;
                let inline = v.len().min(8);
                let head = self.write_oversize_chain(&mut pages, &v[inline..]);
                body.extend_from_slice(&geo.word_bytes(head));
                body.extend_from_slice(k);
                body.push(0xFF);
                body.extend_from_slice(&v[..inline]);
            } else {
                body.extend_from_slice(k);
                body.push(0xFF);
                body.extend_from_slice(v);
            }
            if (2 + body.len()) % 2 == 1 {
                flags |= 1 << 5;
                body.push(1);
            }
            let mut item = match geo.order {
                Endian::Little => vec![order, flags],
                Endian::Big => vec![flags, order],
            };
            item.extend_from_slice(&body);

            if !cur.is_empty() && (cur.len() >= self.max_leaf_items || cur_bytes + item.len() > leaf_room) {
                leaves.push((
                    std::mem::take(&mut cur_first),
                    std::mem::take(&mut cur_last),
                    std::mem::take(&mut cur),
                ));
                cur_bytes = 0;
            }
            if cur.is_empty() {
                cur_first = k.clone();
            }
            cur_last = k.clone();
            cur_bytes += item.len();
            cur.push(item);
        }
        if !cur.is_empty() || leaves.is_empty() {
            leaves.push((cur_first, cur_last, cur));
        }

        if leaves.len() == 1 {
            let (_, _, items) = leaves.pop().unwrap_or_default();
            pages[0] = self.leaf_page(&items);
        } else {
            let mut level: Vec<Child> = Vec::new();
            for (first, last, items) in &leaves {
                pages.push(self.leaf_page(items));
                level.push(Child { first: first.clone(), last: last.clone(), page: pages.len() - 1 });
            }
            loop {
                let groups: Vec<Vec<Child>> =
                    level.chunks(self.fanout.max(2)).map(|c| c.to_vec()).collect();
                if groups.len() == 1 {
                    pages[0] = self.parent_page(&groups[0]);
                    break;
                }
                let mut next = Vec::new();
                for grp in &groups {
                    pages.push(self.parent_page(grp));
                    next.push(Child {
                        first: grp[0].first.clone(),
                        last: grp[grp.len() - 1].last.clone(),
                        page: pages.len() - 1,
                    });
                }
                level = next;
            }
        }

        let mut file = header_block(geo, FT_BTREE, 1, BT_SEPARATION);
        file.resize(BT_HDR_LEN, 0);
        for p in pages {
            file.extend_from_slice(&p);
        }
        file
    }

    fn write_oversize_chain(&self, pages: &mut Vec<Vec<u8>>, data: &[u8]) -> u64 {
        let geo = self.geo;
        let (off_next, off_len, off_data) = match geo.arch {
            Arch::Bits32 => (4, 8, 12),
            Arch::Bits64 => (8, 4, 16),
        };
        let cap = BT_PAGE - off_data;
        let chunks: Vec<&[u8]> = if data.is_empty() { vec![&data[..]] } else { data.chunks(cap).collect() };
        let first = pages.len();
        for (i, chunk) in chunks.iter().enumerate() {
            let mut p = vec![0u8; BT_PAGE];
            geo.put_u16(&mut p, 0, 8);
            let next = if i + 1 < chunks.len() { Self::page_offset(first + i + 1) } else { 0 };
            geo.put_word(&mut p, off_next, next);
            geo.put_u32(&mut p, off_len, chunk.len() as u32);
            p[off_data..off_data + chunk.len()].copy_from_slice(chunk);
            pages.push(p);
        }
        Self::page_offset(first)
    }

    fn leaf_page(&self, items: &[Vec<u8>]) -> Vec<u8> {
        let geo = self.geo;
        let ll = leaf_lay(geo.arch);
        let mut p = vec![0u8; BT_PAGE];
        geo.put_u16(&mut p, 0, 2);
        geo.put_u16(&mut p, ll.count, items.len() as u16);
        let mut rel = 0usize;
        for (i, it) in items.iter().enumerate() {
            geo.put_u16(&mut p, ll.offsets + 2 * i, rel as u16);
            geo.put_u16(&mut p, ll.lengths + 2 * i, it.len() as u16);
            p[ll.data + rel..ll.data + rel + it.len()].copy_from_slice(it);
            rel += it.len();
        }
        p
    }

    fn parent_page(&self, children: &[Child]) -> Vec<u8> {
        let geo = self.geo;
        let pl = parent_lay(geo.arch);
        let mut p = vec![0u8; BT_PAGE];
        geo.put_u16(&mut p, 0, 1);
        geo.put_u16(&mut p, 2, (children.len() * 2) as u16);
        geo.put_u16(&mut p, pl.count, (children.len() - 1) as u16);
        let mut rel = 0usize;
        for (i, child) in children.iter().enumerate() {
            geo.put_word(&mut p, pl.children + i * geo.word(), Self::page_offset(child.page));
            let bound = match self.fences {
                Fences::Lower if i == 0 => None,
                Fences::Lower => Some(&child.first),
                Fences::Upper if i + 1 == children.len() => None,
                Fences::Upper => Some(&child.last),
            };
            let fence = match bound {
                None => Vec::new(),
                Some(key) => {
                    let mut f = vec![key.first().copied().unwrap_or(0), 0];
                    f.extend_from_slice(key);
                    f
                }
            };
            geo.put_u16(&mut p, pl.key_offsets + 2 * i, rel as u16);
            geo.put_u16(&mut p, pl.key_lengths + 2 * i, fence.len() as u16);
            p[pl.key_data + rel..pl.key_data + rel + fence.len()].copy_from_slice(&fence);
            rel += fence.len();
        }
        p
    }
}

/// Absolute file offset of leaf item `item` on page `page` (its first byte).
pub fn leaf_item_offset(file: &[u8], geo: Geo, page: usize, item: usize) -> usize {
    let base = BT_HDR_LEN + page * BT_PAGE;
    let ll = leaf_lay(geo.arch);
    let at = base + ll.offsets + 2 * item;
    let rel = match geo.order {
        Endian::Little => LittleEndian::read_u16(&file[at..at + 2]),
        Endian::Big => BigEndian::read_u16(&file[at..at + 2]),
    } as usize;
    base + ll.data + rel
}

/// Absolute file offset of the fence bytes of `slot` on parent page `page`.
pub fn parent_fence_offset(file: &[u8], geo: Geo, page: usize, slot: usize) -> usize {
    let base = BT_HDR_LEN + page * BT_PAGE;
    let pl = parent_lay(geo.arch);
    let at = base + pl.key_offsets + 2 * slot;
    let rel = match geo.order {
        Endian::Little => LittleEndian::read_u16(&file[at..at + 2]),
        Endian::Big => BigEndian::read_u16(&file[at..at + 2]),
    } as usize;
    base + pl.key_data + rel
}

/// Absolute file offset of the child pointer of `slot` on parent page `page`.
pub fn parent_child_offset(geo: Geo, page: usize, slot: usize) -> usize {
    BT_HDR_LEN + page * BT_PAGE + parent_lay(geo.arch).children + slot * geo.word()
}

// ---------------- directory files ----------------

/// Escape one path segment.
pub fn escape(seg: &[u8]) -> Vec<u8> {
    if seg.is_empty() {
        return b"?".to_vec();
    }
    let mut out = Vec::new();
    if seg[0] == b'.' {
        out.push(b'?');
    }
    for &b in seg {
        match b {
            b'?' => out.extend_from_slice(b"??"),
            b'/' => out.extend_from_slice(b"?\\"),
            _ => out.push(b),
        }
    }
    out
}

fn nested_segments(key: &[u8]) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    let mut rest = key;
    loop {
        let mut n = rest.len().min(14);
        while n > 1 && escape(&rest[..n]).len() > 14 {
            n -= 1;
        }
        let seg = escape(&rest[..n]);
        rest = &rest[n..];
        let exact = seg.len() == 14;
        parts.push(seg);
        if rest.is_empty() {
            if exact {
                parts.push(b"?".to_vec());
            }
            return parts;
        }
    }
}

/// Fixture keys are ASCII, so segments convert losslessly.
fn seg_path(segs: Vec<Vec<u8>>) -> PathBuf {
    segs.into_iter()
        .map(|s| String::from_utf8_lossy(&s).into_owned())
        .collect()
}

fn text_value(v: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len());
    for &b in v {
        if b == 0xFE {
            out.extend_from_slice(b"\r\n");
        } else {
            out.push(b);
        }
    }
    out
}

pub fn write_type1(dir: &Path, data: &Dataset) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(".Type1"), b"")?;
    for (k, v) in data {
        let p = dir.join(seg_path(nested_segments(k)));
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&p, text_value(v))?;
    }
    Ok(())
}

pub fn write_type19(dir: &Path, data: &Dataset) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (k, v) in data {
        fs::write(dir.join(seg_path(vec![escape(k)])), text_value(v))?;
    }
    Ok(())
}

// ---------------- account ----------------

/// VOC catalog as a static hashed file. entries: (name, field 0, field 1).
pub fn write_voc(account: &Path, geo: Geo, entries: &[(&str, &str, &str)]) -> Result<()> {
    fs::create_dir_all(account)?;
    let mut data = Dataset::new();
    for (name, f0, f1) in entries {
        let mut v = f0.as_bytes().to_vec();
        if !f1.is_empty() {
            v.push(0xFE);
            v.extend_from_slice(f1.as_bytes());
        }
        data.insert(name.as_bytes().to_vec(), v);
    }
    write_static_file(&account.join("VOC"), geo, 1, 3, &data)
}

// ---------------- datasets ----------------

pub fn small() -> Dataset {
    let mut d = Dataset::new();
    d.insert(b"1".to_vec(), b"ONE".to_vec());
    d.insert(b"2".to_vec(), b"TWO\xFEsecond field".to_vec());
    d.insert(b"CUST*100".to_vec(), b"Smith\xFEJohn\xFD Jack\xFE42 Main St\xFCApt 1".to_vec());
    d.insert(b"ALPHA".to_vec(), Vec::new());
    d.insert(b"Zed".to_vec(), b"last".to_vec());
    d.insert(b"mid-key".to_vec(), b"x\xFE\xFEy".to_vec());
    d
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| match i % 97 {
            0 => 0xFE,
            50 => 0xFD,
            _ => b'a' + ((i as u8).wrapping_add(seed) % 26),
        })
        .collect()
}

/// Values larger than any block or page used in the tests.
pub fn oversize() -> Dataset {
    let mut d = Dataset::new();
    d.insert(b"BIG1".to_vec(), pattern(1500, 1));
    d.insert(b"BIG2".to_vec(), pattern(5000, 2));
    d.insert(b"BIG3".to_vec(), pattern(20000, 3));
    d.insert(b"BIG4".to_vec(), pattern(2 * 8192 + 7, 4));
    d.insert(b"small".to_vec(), b"between the big ones".to_vec());
    d.insert(b"tiny".to_vec(), b"t".to_vec());
    d
}

/// Keys that need every part of the directory escaping grammar.
pub fn escaping() -> Dataset {
    let keys: [&[u8]; 16] = [
        b"",
        b".",
        b"..",
        b"?",
        b"??",
        b"/",
        b"a/b",
        b".hidden",
        b"K?3",
        b"ABC023642/98734256",
        b"ABCDEFGHIJKLMN",
        b"ABCDEFGHIJKLMNOP",
        b"?/?/?/?/?/?/?/?/",
        b"x.y",
        b"?0",
        b"trailing?",
    ];
    keys.iter()
        .enumerate()
        .map(|(i, k)| {
            let mut v = format!("value {}", i).into_bytes();
            v.push(0xFE);
            v.extend_from_slice(b"tail");
            (k.to_vec(), v)
        })
        .collect()
}

/// Pseudo-random alphanumeric keys (no escaping needed) and text values with marks.
pub fn random(seed: u64, n: usize) -> Dataset {
    const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = oorandom::Rand64::new(seed as u128);
    let mut d = Dataset::new();
    while d.len() < n {
        let klen = 1 + rng.rand_range(0..30) as usize;
        let key: Vec<u8> = (0..klen)
            .map(|_| ALNUM[rng.rand_range(0..ALNUM.len() as u64) as usize])
            .collect();
        let vlen = rng.rand_range(0..200) as usize;
        let val: Vec<u8> = (0..vlen)
            .map(|_| match rng.rand_range(0..40) {
                0 => 0xFE,
                1 => 0xFD,
                2 => 0xFC,
                _ => 0x20 + rng.rand_range(0..95) as u8,
            })
            .collect();
        d.insert(key, val);
    }
    d
}
