//! error — error kinds surfaced by the decoders.
//!
//! `FileNotFound` is the only kind a caller is expected to recover from (e.g. skip
//! a catalog member whose data path is gone). Everything else means the file
//! cannot be decoded and the enclosing operation should stop.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UvError>;

#[derive(Debug, Error)]
pub enum UvError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported header revision 0x{0:02x} (expected 0x0c)")]
    UnsupportedRevision(u8),

    #[error("structural corruption: {0}")]
    StructuralCorruption(String),

    #[error("point lookup is not supported by {0} files")]
    LookupUnsupported(&'static str),

    #[error("not a regular file or directory: {}", .0.display())]
    UnsupportedFileKind(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl UvError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        UvError::StructuralCorruption(msg.into())
    }

    /// True for the recoverable "target absent" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UvError::FileNotFound(_))
    }
}

/// Shorthand for returning `StructuralCorruption` with a formatted message.
macro_rules! corrupt {
    ($($arg:tt)*) => {
        $crate::error::UvError::StructuralCorruption(format!($($arg)*))
    };
}
pub(crate) use corrupt;
