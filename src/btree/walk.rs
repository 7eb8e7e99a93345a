//! btree/walk — B-tree file reader: depth-first enumeration and point lookup.
//!
//! Pages are read on demand and dropped when done. Enumeration keeps an explicit
//! stack of (parent, next slot) / (leaf, next item) frames; lookup is a recursive
//! descent. Both are bounded by `max_btree_depth`.

use std::fs::File;
use std::io::{Read, Seek};

use log::{debug, trace};

use crate::btree::page::{BTreePage, LeafItem, LeafPage, ParentPage};
use crate::config::ReaderConfig;
use crate::error::{corrupt, Result};
use crate::header::UvFileInfo;
use crate::record::Record;
use crate::util::{read_exact_at, read_up_to};

/// Root page index.
const ROOT_PAGE: u64 = 0;

pub struct BTreeFile<R = File> {
    src: R,
    info: UvFileInfo,
    cfg: ReaderConfig,
}

impl<R: Read + Seek> BTreeFile<R> {
    pub fn new(src: R, info: UvFileInfo, cfg: ReaderConfig) -> Self {
        debug!(
            "btree file: page {} B, header {} B, modulus {}",
            info.group_length, info.header_length, info.modulus
        );
        Self { src, info, cfg }
    }

    pub fn info(&self) -> &UvFileInfo {
        &self.info
    }

    /// All records in ascending key order.
    pub fn records(&mut self) -> BTreeRecords<'_, R> {
        BTreeRecords {
            src: &mut self.src,
            info: &self.info,
            cfg: &self.cfg,
            stack: Vec::new(),
            started: false,
            done: false,
        }
    }

    /// Value stored under `key`, or None.
    pub fn get_record(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.lookup(ROOT_PAGE, key, 1)
    }

    fn lookup(&mut self, index: u64, key: &[u8], depth: usize) -> Result<Option<Vec<u8>>> {
        if depth > self.cfg.max_btree_depth {
            return Err(corrupt!(
                "B-tree deeper than {} levels at page {}",
                self.cfg.max_btree_depth,
                index
            ));
        }
        match read_tree_page(&mut self.src, &self.info, index)? {
            Tree::Parent(parent) => match parent.route(key) {
                Some(slot) => {
                    let child = parent.slots[slot].child;
                    trace!("lookup: page {} slot {} -> page {}", index, slot, child);
                    self.lookup(child, key, depth + 1)
                }
                None => Ok(None),
            },
            Tree::Leaf(leaf) => {
                for i in 0..leaf.len() {
                    let item = leaf.item(i)?;
                    let (k, v) = item.split()?;
                    if k == key {
                        let rec = finish_item(&mut self.src, &self.info, &self.cfg, &item, k, v)?;
                        return Ok(Some(rec.raw));
                    }
                }
                Ok(None)
            }
        }
    }
}

enum Tree {
    Leaf(LeafPage),
    Parent(ParentPage),
}

/// Read page `index` and require a leaf or parent.
fn read_tree_page<R: Read + Seek>(src: &mut R, info: &UvFileInfo, index: u64) -> Result<Tree> {
    let buf = read_exact_at(src, info.group_offset(index), info.group_length as usize)?;
    match BTreePage::decode(buf, info)? {
        BTreePage::Leaf(p) => Ok(Tree::Leaf(p)),
        BTreePage::Parent(p) => Ok(Tree::Parent(p)),
        other => Err(corrupt!(
            "page {} is a {} page, expected leaf or parent",
            index,
            other.kind()
        )),
    }
}

/// Follow an oversize page chain from `head` and concatenate the payloads.
fn read_oversize_chain<R: Read + Seek>(
    src: &mut R,
    info: &UvFileInfo,
    cfg: &ReaderConfig,
    head: u64,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut next = head;
    let mut pages = 0usize;
    while next != 0 {
        pages += 1;
        if pages > cfg.max_chain_items {
            return Err(corrupt!(
                "oversize chain from {} longer than {} pages",
                head,
                cfg.max_chain_items
            ));
        }
        let buf = read_up_to(src, next, info.group_length as usize)?;
        let page = match BTreePage::decode(buf, info)? {
            BTreePage::Oversize(p) => p,
            other => {
                return Err(corrupt!(
                    "oversize chain from {}: page at {} is a {} page",
                    head,
                    next,
                    other.kind()
                ))
            }
        };
        out.extend_from_slice(&page.data);
        if out.len() > cfg.max_value_bytes {
            return Err(corrupt!(
                "oversize value from {} exceeds max_value_bytes {}",
                head,
                cfg.max_value_bytes
            ));
        }
        next = page.next;
    }
    trace!("oversize chain from {}: {} page(s), {} bytes", head, pages, out.len());
    Ok(out)
}

/// Build the record of a leaf item, pulling in its oversize chain if any.
fn finish_item<R: Read + Seek>(
    src: &mut R,
    info: &UvFileInfo,
    cfg: &ReaderConfig,
    item: &LeafItem<'_>,
    key: &[u8],
    value: &[u8],
) -> Result<Record> {
    let mut raw = value.to_vec();
    if let Some(head) = item.oversize_head {
        raw.extend_from_slice(&read_oversize_chain(src, info, cfg, head)?);
    }
    Ok(Record::new(key.to_vec(), raw))
}

enum Frame {
    Parent { children: Vec<u64>, next: usize },
    Leaf { page: LeafPage, next: usize },
}

/// Lazy depth-first record stream. Fuses after the first error.
pub struct BTreeRecords<'a, R> {
    src: &'a mut R,
    info: &'a UvFileInfo,
    cfg: &'a ReaderConfig,
    stack: Vec<Frame>,
    started: bool,
    done: bool,
}

impl<'a, R: Read + Seek> BTreeRecords<'a, R> {
    fn push(&mut self, index: u64) -> Result<()> {
        if self.stack.len() >= self.cfg.max_btree_depth {
            return Err(corrupt!(
                "B-tree deeper than {} levels at page {}",
                self.cfg.max_btree_depth,
                index
            ));
        }
        let frame = match read_tree_page(self.src, self.info, index)? {
            Tree::Parent(p) => {
                trace!("page {}: parent with {} children", index, p.slots.len());
                Frame::Parent {
                    children: p.slots.into_iter().map(|s| s.child).collect(),
                    next: 0,
                }
            }
            Tree::Leaf(page) => {
                trace!("page {}: leaf with {} items", index, page.len());
                Frame::Leaf { page, next: 0 }
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        if !self.started {
            self.started = true;
            self.push(ROOT_PAGE)?;
        }
        loop {
            let step = match self.stack.last_mut() {
                None => return Ok(None),
                Some(Frame::Parent { children, next }) => match children.get(*next) {
                    Some(&child) => {
                        *next += 1;
                        Step::Descend(child)
                    }
                    None => Step::Pop,
                },
                Some(Frame::Leaf { page, next }) => {
                    if *next < page.len() {
                        let item = page.item(*next)?;
                        *next += 1;
                        let (k, v) = item.split()?;
                        let rec = finish_item(self.src, self.info, self.cfg, &item, k, v)?;
                        return Ok(Some(rec));
                    }
                    Step::Pop
                }
            };
            match step {
                Step::Descend(child) => self.push(child)?,
                Step::Pop => {
                    self.stack.pop();
                }
            }
        }
    }
}

enum Step {
    Descend(u64),
    Pop,
}

impl<'a, R: Read + Seek> Iterator for BTreeRecords<'a, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
