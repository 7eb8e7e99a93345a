//! btree — B-tree files (file type 25).
//! - layout.rs — fixed page field offsets per architecture
//! - page.rs   — BTreePage { Leaf, Parent, Oversize } decoders and validation
//! - walk.rs   — BTreeFile: depth-first record stream, point lookup
pub mod layout;
pub mod page;
pub mod walk;

pub use page::{BTreePage, FenceBounds, LeafItem, LeafPage, OversizePage, ParentPage, ParentSlot};
pub use walk::{BTreeFile, BTreeRecords};
