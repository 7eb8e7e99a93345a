//! files — format dispatcher and the closed set of file kinds.
//!
//! `open_uv_file` inspects a path and returns the matching reader:
//! - regular file: header decides, type 25 -> B-tree, anything else -> static hashed;
//! - directory with `.Type1`  -> nested directory file;
//! - directory with `.Type30` -> dynamic hashed (`DATA.30` + `OVER.30`);
//! - any other directory      -> flat (type 19) directory file.
//!
//! Callers work with `UvFile` and never need the concrete reader type.

use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use log::debug;

use crate::btree::{BTreeFile, BTreeRecords};
use crate::config::ReaderConfig;
use crate::consts::{FILE_TYPE_BTREE, TYPE1_MARKER, TYPE30_DATA, TYPE30_MARKER, TYPE30_OVER};
use crate::dirfile::{DirRecords, File1, File19};
use crate::error::{Result, UvError};
use crate::hashed::{DynamicHashedFile, HashedRecords, StaticHashedFile};
use crate::header::{read_file_header, UvFileInfo};
use crate::record::Record;

/// Buffered file handle used by every binary reader opened here.
pub type Handle = BufReader<File>;

/// Kind of an opened file, as reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Hashed or B-tree file; carries the header file-type code.
    Typed(u32),
    Type1,
    Type19,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Typed(code) => write!(f, "{}", code),
            FileKind::Type1 => write!(f, "1"),
            FileKind::Type19 => write!(f, "19"),
        }
    }
}

pub enum UvFile {
    Static(StaticHashedFile<Handle>),
    Dynamic(DynamicHashedFile<Handle>),
    BTree(BTreeFile<Handle>),
    Type1(File1),
    Type19(File19),
}

impl UvFile {
    pub fn records(&mut self) -> UvRecords<'_> {
        match self {
            UvFile::Static(f) => UvRecords::Hashed(f.records()),
            UvFile::Dynamic(f) => UvRecords::Hashed(f.records()),
            UvFile::BTree(f) => UvRecords::BTree(f.records()),
            UvFile::Type1(f) => UvRecords::Dir(f.records()),
            UvFile::Type19(f) => UvRecords::Dir(f.records()),
        }
    }

    /// Point lookup. Hashed files only support enumeration and return
    /// `LookupUnsupported`.
    pub fn get_record(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            UvFile::Static(_) => Err(UvError::LookupUnsupported("static hashed")),
            UvFile::Dynamic(_) => Err(UvError::LookupUnsupported("dynamic hashed")),
            UvFile::BTree(f) => f.get_record(key),
            UvFile::Type1(f) => f.get_record(key),
            UvFile::Type19(f) => f.get_record(key),
        }
    }

    pub fn supports_lookup(&self) -> bool {
        !matches!(self, UvFile::Static(_) | UvFile::Dynamic(_))
    }

    pub fn kind(&self) -> FileKind {
        match self {
            UvFile::Static(f) => FileKind::Typed(f.info().file_type),
            UvFile::Dynamic(f) => FileKind::Typed(f.info().file_type),
            UvFile::BTree(f) => FileKind::Typed(f.info().file_type),
            UvFile::Type1(_) => FileKind::Type1,
            UvFile::Type19(_) => FileKind::Type19,
        }
    }

    /// Header geometry; None for directory files.
    pub fn info(&self) -> Option<&UvFileInfo> {
        match self {
            UvFile::Static(f) => Some(f.info()),
            UvFile::Dynamic(f) => Some(f.info()),
            UvFile::BTree(f) => Some(f.info()),
            UvFile::Type1(_) | UvFile::Type19(_) => None,
        }
    }
}

/// Record stream of any file kind.
pub enum UvRecords<'a> {
    Hashed(HashedRecords<'a, Handle>),
    BTree(BTreeRecords<'a, Handle>),
    Dir(DirRecords),
}

impl<'a> Iterator for UvRecords<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            UvRecords::Hashed(it) => it.next(),
            UvRecords::BTree(it) => it.next(),
            UvRecords::Dir(it) => it.next(),
        }
    }
}

/// Open `path` with limits taken from the environment.
pub fn open_uv_file(path: impl AsRef<Path>) -> Result<UvFile> {
    open_uv_file_with(path, ReaderConfig::from_env())
}

pub fn open_uv_file_with(path: impl AsRef<Path>, cfg: ReaderConfig) -> Result<UvFile> {
    let path = path.as_ref();
    let md = match fs::metadata(path) {
        Ok(md) => md,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UvError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    if md.is_file() {
        let mut fd = open_handle(path)?;
        let info = read_file_header(&mut fd)?;
        debug!("{}: file type {}", path.display(), info.file_type);
        return Ok(if info.file_type == FILE_TYPE_BTREE {
            UvFile::BTree(BTreeFile::new(fd, info, cfg))
        } else {
            UvFile::Static(StaticHashedFile::new(fd, info, cfg))
        });
    }

    if md.is_dir() {
        if path.join(TYPE1_MARKER).is_file() {
            debug!("{}: {} marker", path.display(), TYPE1_MARKER);
            return Ok(UvFile::Type1(File1::new(path, cfg)));
        }
        if path.join(TYPE30_MARKER).is_file() {
            debug!("{}: {} marker", path.display(), TYPE30_MARKER);
            let mut fd = open_handle(&path.join(TYPE30_DATA))?;
            let info = read_file_header(&mut fd)?;
            let over = open_handle(&path.join(TYPE30_OVER))?;
            return DynamicHashedFile::new(fd, over, info, cfg).map(UvFile::Dynamic);
        }
        return Ok(UvFile::Type19(File19::new(path, cfg)));
    }

    Err(UvError::UnsupportedFileKind(path.to_path_buf()))
}

fn open_handle(path: &Path) -> Result<Handle> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(UvError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}
