//! Centralized reader configuration.
//!
//! Goals:
//! - Single place for the decoder limits instead of scattering env lookups.
//! - `ReaderConfig::from_env()` reads the `MATTOCK_*` variables; fluent setters
//!   override individual fields afterwards.
//!
//! The limits only bound how far a decoder follows pointers it found in a file;
//! a well-formed file never comes near them. Exceeding one is reported as
//! structural corruption.

use std::fmt;

/// Byte pair that directory layouts store in place of a field mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEnding {
    /// `\r\n`
    Crlf,
    /// `\n`
    Lf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Crlf => b"\r\n",
            LineEnding::Lf => b"\n",
        }
    }

    /// Parse "crlf" / "lf" (case-insensitive). Unknown values return None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crlf" | "\\r\\n" => Some(LineEnding::Crlf),
            "lf" | "\\n" => Some(LineEnding::Lf),
            _ => None,
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineEnding::Crlf => write!(f, "crlf"),
            LineEnding::Lf => write!(f, "lf"),
        }
    }
}

/// Top-level configuration shared by every reader opened through the dispatcher.
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Upper bound for one reassembled oversize value (hash items and B-tree
    /// continuation chains).
    /// Env: MATTOCK_MAX_VALUE_BYTES (default 1 GiB)
    pub max_value_bytes: usize,

    /// Maximum number of items visited in one bucket chain or one continuation
    /// chain before the chain is treated as a loop.
    /// Env: MATTOCK_MAX_CHAIN_ITEMS (default 1_000_000)
    pub max_chain_items: usize,

    /// Maximum B-tree depth (root = 1) followed during descent.
    /// Env: MATTOCK_MAX_BTREE_DEPTH (default 64)
    pub max_btree_depth: usize,

    /// Line ending translated to a field mark by the directory layouts.
    /// Env: MATTOCK_LINE_ENDING = crlf|lf (default crlf)
    pub line_ending: LineEnding,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_value_bytes: 1usize << 30,
            max_chain_items: 1_000_000,
            max_btree_depth: 64,
            line_ending: LineEnding::Crlf,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables; unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MATTOCK_MAX_VALUE_BYTES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_value_bytes = n;
            }
        }

        if let Ok(v) = std::env::var("MATTOCK_MAX_CHAIN_ITEMS") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_chain_items = n.max(1);
            }
        }

        if let Ok(v) = std::env::var("MATTOCK_MAX_BTREE_DEPTH") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_btree_depth = n.max(1);
            }
        }

        if let Ok(v) = std::env::var("MATTOCK_LINE_ENDING") {
            if let Some(le) = LineEnding::parse(&v) {
                cfg.line_ending = le;
            }
        }

        cfg
    }

    pub fn with_max_value_bytes(mut self, n: usize) -> Self {
        self.max_value_bytes = n;
        self
    }

    pub fn with_max_chain_items(mut self, n: usize) -> Self {
        self.max_chain_items = n.max(1);
        self
    }

    pub fn with_max_btree_depth(mut self, n: usize) -> Self {
        self.max_btree_depth = n.max(1);
        self
    }

    pub fn with_line_ending(mut self, le: LineEnding) -> Self {
        self.line_ending = le;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReaderConfig {{ \
             max_value_bytes: {}, \
             max_chain_items: {}, \
             max_btree_depth: {}, \
             line_ending: {} \
             }}",
            self.max_value_bytes, self.max_chain_items, self.max_btree_depth, self.line_ending,
        )
    }
}
