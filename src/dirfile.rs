//! dirfile — directory-based files: one filesystem entry per record.
//!
//! - type 1 (`File1`): nested; keys are cut into escaped segments of at most 14
//!   bytes, every segment but the last is a directory. Marked by `.Type1`.
//! - type 19 (`File19`): flat; one escaped file name per key.
//!
//! Values are stored as text: each line ending in the file stands for a field
//! mark, so reading translates it back (`ReaderConfig::line_ending`).
//! Entries are visited in byte-wise name order per directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::config::ReaderConfig;
use crate::consts::{FIELD_MARK, TYPE1_MARKER};
use crate::error::Result;
use crate::path_codec::{key_to_type1_path, key_to_type19_path, os_to_bytes, path_to_key};
use crate::record::Record;
use crate::util::replace_pair;

pub struct File1 {
    root: PathBuf,
    cfg: ReaderConfig,
}

impl File1 {
    pub fn new(root: impl Into<PathBuf>, cfg: ReaderConfig) -> Self {
        let root = root.into();
        debug!("type 1 directory file {}", root.display());
        Self { root, cfg }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> DirRecords {
        DirRecords::new(self.root.clone(), true, &self.cfg)
    }

    pub fn get_record(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_value(&self.root.join(key_to_type1_path(key)), &self.cfg)
    }
}

pub struct File19 {
    root: PathBuf,
    cfg: ReaderConfig,
}

impl File19 {
    pub fn new(root: impl Into<PathBuf>, cfg: ReaderConfig) -> Self {
        let root = root.into();
        debug!("type 19 directory file {}", root.display());
        Self { root, cfg }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> DirRecords {
        DirRecords::new(self.root.clone(), false, &self.cfg)
    }

    pub fn get_record(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_value(&self.root.join(key_to_type19_path(key)), &self.cfg)
    }
}

/// Read one stored value; None if no regular file exists at `path`.
fn read_value(path: &Path, cfg: &ReaderConfig) -> Result<Option<Vec<u8>>> {
    match fs::metadata(path) {
        Ok(md) if md.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let data = fs::read(path)?;
    Ok(Some(replace_pair(&data, cfg.line_ending.as_bytes(), FIELD_MARK)))
}

/// Sorted entries of `dir` as paths relative to the file root, marker skipped.
fn sorted_entries(dir: &Path, rel: &Path) -> Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if name == TYPE1_MARKER {
            continue;
        }
        names.push(name);
    }
    names.sort_by(|a, b| os_to_bytes(a).cmp(&os_to_bytes(b)));
    Ok(names.into_iter().map(|n| rel.join(n)).collect())
}

/// Lazy record stream over a directory file. Fuses after the first error.
pub struct DirRecords {
    root: PathBuf,
    nested: bool,
    cfg: ReaderConfig,
    /// Relative paths still to visit, in reverse order (next at the end).
    pending: Vec<PathBuf>,
    started: bool,
    done: bool,
}

impl DirRecords {
    fn new(root: PathBuf, nested: bool, cfg: &ReaderConfig) -> Self {
        Self {
            root,
            nested,
            cfg: cfg.clone(),
            pending: Vec::new(),
            started: false,
            done: false,
        }
    }

    fn enqueue(&mut self, rel: &Path) -> Result<()> {
        let mut entries = sorted_entries(&self.root.join(rel), rel)?;
        entries.reverse();
        self.pending.extend(entries);
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        if !self.started {
            self.started = true;
            self.enqueue(Path::new(""))?;
        }
        while let Some(rel) = self.pending.pop() {
            let full = self.root.join(&rel);
            let md = fs::metadata(&full)?;
            if md.is_dir() {
                if self.nested {
                    self.enqueue(&rel)?;
                }
                continue;
            }
            if !md.is_file() {
                continue;
            }
            trace!("record file {}", rel.display());
            let data = fs::read(&full)?;
            let raw = replace_pair(&data, self.cfg.line_ending.as_bytes(), FIELD_MARK);
            return Ok(Some(Record::new(path_to_key(&rel), raw)));
        }
        Ok(None)
    }
}

impl Iterator for DirRecords {
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
