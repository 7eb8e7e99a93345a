// Формат и базовые типы
pub mod consts;
pub mod error;
pub mod config;
pub mod header;
pub mod record;

// Декодеры
pub mod group;     // src/group/{mod,item,chain}.rs
pub mod hashed;
pub mod btree;     // src/btree/{mod,layout,page,walk}.rs
pub mod path_codec;
pub mod dirfile;

// Диспетчер и каталог аккаунта
pub mod files;
pub mod account;

// Утилиты (field, read_exact_at, replace_pair)
pub mod util;      // src/util/mod.rs

// Удобные реэкспорты
pub use account::Account;
pub use btree::BTreeFile;
pub use config::{LineEnding, ReaderConfig};
pub use dirfile::{File1, File19};
pub use error::{Result, UvError};
pub use files::{open_uv_file, open_uv_file_with, FileKind, UvFile, UvRecords};
pub use hashed::{DynamicHashedFile, StaticHashedFile};
pub use header::{parse_file_header, read_file_header, Arch, Endian, UvFileInfo};
pub use record::{Field, Record, Value};
