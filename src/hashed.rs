//! hashed — static and dynamic hashed files.
//!
//! Both enumerate groups in index order and hand each one to the chain walker:
//! - static:  groups 0..modulus, single file;
//! - dynamic: groups 0..=modulus (one extra reserved group), primary `DATA.30`
//!   plus overflow `OVER.30` for items whose pointers are flagged as overflow.
//!
//! Hashed files have no key order to descend, so there is no point lookup;
//! callers scan.

use std::fs::File;
use std::io::{Read, Seek};

use log::debug;

use crate::config::ReaderConfig;
use crate::error::{corrupt, Result};
use crate::group::ChainWalker;
use crate::header::UvFileInfo;
use crate::record::Record;

pub struct StaticHashedFile<R = File> {
    src: R,
    info: UvFileInfo,
    cfg: ReaderConfig,
}

impl<R: Read + Seek> StaticHashedFile<R> {
    pub fn new(src: R, info: UvFileInfo, cfg: ReaderConfig) -> Self {
        debug!(
            "static hashed file: type {}, modulus {}, group {} B",
            info.file_type, info.modulus, info.group_length
        );
        Self { src, info, cfg }
    }

    pub fn info(&self) -> &UvFileInfo {
        &self.info
    }

    pub fn group_count(&self) -> u64 {
        self.info.modulus
    }

    /// All records, group by group.
    pub fn records(&mut self) -> HashedRecords<'_, R> {
        let end = self.group_count();
        HashedRecords::new(
            ChainWalker::new(&self.info, &self.cfg, &mut self.src, None),
            0,
            end,
        )
    }

    /// Records of a single group.
    pub fn group(&mut self, index: u64) -> HashedRecords<'_, R> {
        HashedRecords::new(
            ChainWalker::new(&self.info, &self.cfg, &mut self.src, None),
            index,
            index.saturating_add(1).min(self.info.modulus),
        )
    }
}

pub struct DynamicHashedFile<R = File> {
    src: R,
    over: R,
    info: UvFileInfo,
    cfg: ReaderConfig,
    dyn_hash_alg: u32,
}

impl<R: Read + Seek> DynamicHashedFile<R> {
    /// `src` is the primary data file, `over` the overflow file; `info` must come
    /// from a type 30 header (it carries the hash algorithm id).
    pub fn new(src: R, over: R, info: UvFileInfo, cfg: ReaderConfig) -> Result<Self> {
        let dyn_hash_alg = info
            .dyn_hash_alg
            .ok_or_else(|| corrupt!("dynamic file header has no hash algorithm id (type {})", info.file_type))?;
        debug!(
            "dynamic hashed file: modulus {}, group {} B, hash alg {}",
            info.modulus, info.group_length, dyn_hash_alg
        );
        Ok(Self {
            src,
            over,
            info,
            cfg,
            dyn_hash_alg,
        })
    }

    pub fn info(&self) -> &UvFileInfo {
        &self.info
    }

    pub fn dyn_hash_alg(&self) -> u32 {
        self.dyn_hash_alg
    }

    /// modulus + 1: the last group is reserved but may hold items.
    pub fn group_count(&self) -> u64 {
        self.info.modulus.saturating_add(1)
    }

    pub fn records(&mut self) -> HashedRecords<'_, R> {
        let end = self.group_count();
        HashedRecords::new(
            ChainWalker::new(&self.info, &self.cfg, &mut self.src, Some(&mut self.over)),
            0,
            end,
        )
    }

    pub fn group(&mut self, index: u64) -> HashedRecords<'_, R> {
        let end = index.saturating_add(1).min(self.group_count());
        HashedRecords::new(
            ChainWalker::new(&self.info, &self.cfg, &mut self.src, Some(&mut self.over)),
            index,
            end,
        )
    }
}

/// Lazy record stream over a range of groups. Fuses after the first error.
pub struct HashedRecords<'a, R> {
    walker: ChainWalker<'a, R>,
    next_group: u64,
    end_group: u64,
    done: bool,
}

impl<'a, R: Read + Seek> HashedRecords<'a, R> {
    fn new(walker: ChainWalker<'a, R>, first: u64, end: u64) -> Self {
        Self {
            walker,
            next_group: first,
            end_group: end,
            done: false,
        }
    }
}

impl<'a, R: Read + Seek> Iterator for HashedRecords<'a, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.walker.next_record() {
                Ok(Some(rec)) => return Some(Ok(rec)),
                Ok(None) => {
                    if self.next_group >= self.end_group {
                        self.done = true;
                        return None;
                    }
                    self.walker.start_group(self.next_group);
                    self.next_group += 1;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
