//! Discovery of packages already present in an installation directory.

use crate::error::{SyncError, SyncResult};
use crate::manifest::read_manifest;
use crate::naming::{is_metadata_dir, libs_dir_name, path_segments, MANIFEST_NAME};
use crate::types::{InstalledState, PackageId, PackageRecord};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Builds the installed state of `dir`.
///
/// Every immediate child directory whose name ends in the metadata suffix
/// and contains a manifest becomes one package. A missing `dir` yields an
/// empty state.
///
/// A manifest that exists but cannot be read is passed to `on_error` and its
/// package is left out, so its files show up as unowned.
pub fn scan_installed(
    dir: &Path,
    on_error: &mut dyn FnMut(SyncError),
) -> SyncResult<InstalledState> {
    let mut state = InstalledState::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(state),
        Err(source) => {
            return Err(SyncError::Scan {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SyncError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.path().is_dir();
        names.push((name, is_dir));
    }
    names.sort();

    for (name, is_dir) in &names {
        state.unowned.insert(name.clone());

        if !is_dir || !is_metadata_dir(name) {
            continue;
        }
        let manifest_path = dir.join(name).join(MANIFEST_NAME);
        if !manifest_path.is_file() {
            debug!("Metadata directory without manifest: {}", name);
            continue;
        }

        match read_manifest(&manifest_path) {
            Ok(rows) => {
                let record = record_from_manifest(name, &rows);
                state.packages.insert(record.id.clone(), record);
            }
            Err(err) => {
                warn!("Skipping installed package {}: {}", name, err);
                on_error(err);
            }
        }
    }

    for record in state.packages.values() {
        state.unowned.remove(record.id.as_str());
        for path in &record.top_level {
            state.unowned.remove(path);
        }
    }

    Ok(state)
}

/// Reduces manifest rows to the top-level names a package owns.
///
/// Rows pointing above the directory or into the metadata directory itself
/// are dropped. The `<base>.libs` directory is always included because
/// manifests do not list it; removal skips it when absent.
pub fn record_from_manifest(metadata_dir: &str, rows: &[String]) -> PackageRecord {
    let mut record = PackageRecord::new(PackageId::new(metadata_dir));

    for row in rows {
        let Some(first) = path_segments(row).first().copied() else {
            continue;
        };
        if first == ".." || first == metadata_dir {
            continue;
        }
        record.insert(first);
    }

    record.insert(&libs_dir_name(metadata_dir));
    record
}
