//! group — hashed-file groups (buckets).
//! - item.rs  — item header, flags, padding / oversize prefix / key split helpers
//! - chain.rs — ChainWalker: item chain of one group, overflow forwarding, oversize reassembly

pub mod chain;
pub mod item;

pub use chain::{ChainWalker, ItemCursor, ItemRead};
pub use item::{ItemFlags, ItemHeader};
