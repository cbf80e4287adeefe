//! Reader for installed-file manifests (`RECORD`).
//!
//! A manifest is a comma-separated table with one row per installed file;
//! only the first column (the path) is used here. Bytes that are not valid
//! UTF-8 are replaced rather than rejected.

use crate::error::{SyncError, SyncResult};
use std::fs;
use std::path::Path;

/// Reads the path column of a manifest, in file order.
///
/// Blank or malformed rows are skipped. Fails only when the file cannot be
/// read at all.
pub fn read_manifest(path: &Path) -> SyncResult<Vec<String>> {
    let bytes = fs::read(path).map_err(|source| SyncError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_manifest(&String::from_utf8_lossy(&bytes)))
}

/// Parses manifest text into its path column.
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines().filter_map(first_field).collect()
}

/// Extracts the first CSV field of a row.
///
/// Quoted fields may contain commas and doubled quotes. Returns `None` for
/// empty rows, empty paths and unterminated quotes.
fn first_field(row: &str) -> Option<String> {
    let row = row.trim_end_matches('\r');

    let field = match row.strip_prefix('"') {
        Some(quoted) => {
            let mut value = String::new();
            let mut chars = quoted.chars().peekable();
            loop {
                match chars.next()? {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        value.push('"');
                    }
                    '"' => break,
                    ch => value.push(ch),
                }
            }
            value
        }
        None => row.split(',').next().unwrap_or_default().to_string(),
    };

    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}
