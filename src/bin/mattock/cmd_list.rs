use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::Serialize;
use std::path::PathBuf;

use mattock::{Account, Record, UvFile};

use super::cli::Detail;
use super::util::{display_text, to_hex};

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    kind: String,
    records: u64,
    bytes: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entries: Vec<EntryReport>,
}

#[derive(Debug, Serialize)]
struct EntryReport {
    key: String,
    key_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_hex: Option<String>,
}

pub fn exec(account: PathBuf, only: Vec<String>, detail: Detail, json: bool) -> Result<()> {
    if !account.is_dir() {
        return Err(anyhow!("not a directory: {}", account.display()));
    }
    let acc = Account::new(&account);
    let names = if only.is_empty() {
        acc.files()
            .with_context(|| format!("read catalog of {}", account.display()))?
    } else {
        only
    };

    for name in names {
        let mut file = match acc.open_file(&name) {
            Ok(f) => f,
            Err(e) if e.is_not_found() => {
                warn!("{}: skipped ({})", name, e);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("open {}", name)),
        };
        let report = list_file(&name, &mut file, detail, json)?;
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else if detail == Detail::Summary {
            println!(
                "{} ({}) has {} records and {} bytes",
                report.file, report.kind, report.records, report.bytes
            );
        }
    }
    Ok(())
}

fn list_file(name: &str, file: &mut UvFile, detail: Detail, json: bool) -> Result<FileReport> {
    let mut report = FileReport {
        file: name.to_string(),
        kind: file.kind().to_string(),
        records: 0,
        bytes: 0,
        entries: Vec::new(),
    };
    for rec in file.records() {
        let rec = rec.with_context(|| format!("read {}", name))?;
        report.records += 1;
        report.bytes += rec.byte_len() as u64;
        if detail == Detail::Summary {
            continue;
        }
        if json {
            report.entries.push(entry(&rec, detail));
        } else {
            print_record(name, &rec, detail);
        }
    }
    Ok(report)
}

fn entry(rec: &Record, detail: Detail) -> EntryReport {
    EntryReport {
        key: display_text(&rec.key),
        key_hex: to_hex(&rec.key),
        value_hex: (detail == Detail::Values).then(|| to_hex(&rec.raw)),
    }
}

fn print_record(name: &str, rec: &Record, detail: Detail) {
    if detail == Detail::Values {
        println!(
            "{} has record {} with value {}",
            name,
            display_text(&rec.key),
            display_text(&rec.raw)
        );
    } else {
        println!("{} has record {}", name, display_text(&rec.key));
    }
}
