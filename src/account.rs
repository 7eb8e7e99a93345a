//! account — an account directory and its VOC catalog.
//!
//! Catalog entries describing files have field 0 starting with `F` and the data
//! path (relative to the account, or absolute) in field 1. The VOC itself is an
//! ordinary hashed file, so lookups are a scan.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::ReaderConfig;
use crate::consts::VOC_FILE;
use crate::error::{corrupt, Result, UvError};
use crate::files::{open_uv_file_with, UvFile};
use crate::path_codec::segment_to_os;
use crate::record::Record;

/// Marker that field 0 of a file entry starts with.
const FILE_ENTRY_TAG: u8 = b'F';

pub struct Account {
    root: PathBuf,
    cfg: ReaderConfig,
}

impl Account {
    /// Account at `root`, limits from the environment.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, ReaderConfig::from_env())
    }

    pub fn with_config(root: impl Into<PathBuf>, cfg: ReaderConfig) -> Self {
        Self {
            root: root.into(),
            cfg,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn open_voc(&self) -> Result<UvFile> {
        open_uv_file_with(self.root.join(VOC_FILE), self.cfg.clone())
    }

    /// Data path of catalog entry `name`; None when the catalog has no such entry.
    pub fn get_filepath(&self, name: &str) -> Result<Option<PathBuf>> {
        let mut voc = self.open_voc()?;
        for rec in voc.records() {
            let rec = rec?;
            if rec.key != name.as_bytes() {
                continue;
            }
            if !is_file_entry(&rec) {
                return Err(corrupt!("catalog entry {} is not a file entry", name));
            }
            let rel = rec
                .field(1)
                .ok_or_else(|| corrupt!("catalog entry {} has no data path", name))?;
            let path = self.root.join(segment_to_os(rel.as_bytes().to_vec()));
            debug!("catalog: {} -> {}", name, path.display());
            return Ok(Some(path));
        }
        Ok(None)
    }

    /// Names of every file entry, in catalog order.
    pub fn files(&self) -> Result<Vec<String>> {
        let mut voc = self.open_voc()?;
        let mut names = Vec::new();
        for rec in voc.records() {
            let rec = rec?;
            if !is_file_entry(&rec) {
                continue;
            }
            match String::from_utf8(rec.key) {
                Ok(name) => names.push(name),
                Err(e) => warn!(
                    "catalog: skipping file entry with non UTF-8 name {:?}",
                    String::from_utf8_lossy(e.as_bytes())
                ),
            }
        }
        Ok(names)
    }

    /// Open the data file of catalog entry `name`. `FileNotFound` when the entry
    /// or its data path is missing.
    pub fn open_file(&self, name: &str) -> Result<UvFile> {
        let path = self
            .get_filepath(name)?
            .ok_or_else(|| UvError::FileNotFound(self.root.join(VOC_FILE).join(name)))?;
        open_uv_file_with(path, self.cfg.clone())
    }
}

fn is_file_entry(rec: &Record) -> bool {
    rec.field(0)
        .map(|f| f.as_bytes().iter().find(|b| !b.is_ascii_whitespace()) == Some(&FILE_ENTRY_TAG))
        .unwrap_or(false)
}
