use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Mattock reads Universe and Unidata databases
#[derive(Parser, Debug)]
#[command(name = "mattock", version, about = "Read-only dump of a U2 account")]
#[command(group(ArgGroup::new("mode").args(["keys", "values"])))]
pub struct Cli {
    /// Print record keys
    #[arg(long)]
    pub keys: bool,

    /// Print record keys and values
    #[arg(long)]
    pub values: bool,

    /// One JSON object per file instead of text lines
    #[arg(long)]
    pub json: bool,

    /// Only this catalog file (repeatable)
    #[arg(long = "file", value_name = "NAME")]
    pub files: Vec<String>,

    /// Account directory containing a VOC file
    pub account: PathBuf,
}

/// What to print for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    Summary,
    Keys,
    Values,
}

impl Cli {
    pub fn detail(&self) -> Detail {
        if self.values {
            Detail::Values
        } else if self.keys {
            Detail::Keys
        } else {
            Detail::Summary
        }
    }
}
