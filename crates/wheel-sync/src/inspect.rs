//! Archive inspection without extraction.

use crate::error::{SyncError, SyncResult};
use crate::naming::{is_manifest_name, is_metadata_dir, path_segments};
use crate::types::{PackageId, PackageRecord};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Opens a wheel file as a zip archive.
pub fn open_archive(path: &Path) -> SyncResult<ZipArchive<File>> {
    let file = File::open(path).map_err(|err| SyncError::ArchiveOpen {
        path: path.to_path_buf(),
        source: ZipError::Io(err),
    })?;
    ZipArchive::new(file).map_err(|source| SyncError::ArchiveOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Lists the package id and top-level names of the archive at `path`.
///
/// Returns `Ok(None)` when the archive holds no metadata directory with a
/// manifest; such archives are not packages and callers ignore them.
pub fn inspect_archive(path: &Path) -> SyncResult<Option<PackageRecord>> {
    let archive = open_archive(path)?;
    Ok(inspect_archive_reader(&archive))
}

/// Same as [`inspect_archive`] for an already opened archive.
///
/// Only the central directory is read; no member payload is decompressed.
pub fn inspect_archive_reader<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<PackageRecord> {
    let mut metadata_dir: Option<String> = None;
    let mut top_level: BTreeSet<String> = BTreeSet::new();

    for name in archive.file_names() {
        let segments = path_segments(name);
        let Some(first) = segments.first().copied() else {
            continue;
        };
        if first == ".." {
            continue;
        }

        if segments.len() == 2 && is_manifest_name(segments[1]) && is_metadata_dir(first) {
            metadata_dir = Some(first.to_string());
        }
        top_level.insert(first.to_string());
    }

    let metadata_dir = metadata_dir?;
    let mut record = PackageRecord::new(PackageId::new(metadata_dir.as_str()));
    for name in top_level.iter().filter(|name| **name != metadata_dir) {
        record.insert(name);
    }
    Some(record)
}
