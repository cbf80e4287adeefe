//! Removal of an installed package's paths.

use crate::error::{SyncError, SyncResult};
use crate::report::Reporter;
use crate::safety::{ensure_contained, escaping_symlink};
use crate::types::{PackageRecord, SyncOptions};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of removing one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// Paths deleted
    pub removed: Vec<PathBuf>,

    /// Paths that could not be deleted and were reported stale
    pub stale: Vec<PathBuf>,

    /// Symlink above `site_packages` leading out of the boundary; nothing
    /// was deleted when this is set
    pub blocked: Option<PathBuf>,
}

/// Deletes the metadata directory and every top-level path of `record`.
///
/// Paths are resolved against `site_packages` and must stay inside
/// `boundary`; all of them are checked before anything is deleted and a
/// violation aborts with [`SyncError::Containment`]. Paths that are already
/// gone are skipped. Paths that cannot be deleted are handed to the stale
/// callback and the remaining paths are still processed.
///
/// When `site_packages` is reached through a symlink that leads outside
/// `boundary`, nothing is deleted and the symlink is returned in
/// [`RemoveOutcome::blocked`].
pub fn remove_package(
    site_packages: &Path,
    boundary: &Path,
    record: &PackageRecord,
    options: &SyncOptions,
    reporter: &mut Reporter<'_>,
) -> SyncResult<RemoveOutcome> {
    let targets: Vec<(&str, PathBuf)> = record
        .owned_paths()
        .map(|rel| (rel, site_packages.join(rel)))
        .collect();
    for (_, path) in &targets {
        ensure_contained(path, boundary)?;
    }

    let mut outcome = RemoveOutcome::default();

    if let Some(link) = escaping_symlink(site_packages, boundary) {
        warn!(
            "Not removing {}: {} leads outside {}",
            record.id,
            link.display(),
            boundary.display()
        );
        outcome.blocked = Some(link);
        return Ok(outcome);
    }

    for (rel, path) in targets {
        match fs::symlink_metadata(&path) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => debug!("Cannot stat {}: {}", path.display(), err),
        }

        if options.debug {
            info!("removing wheel: {}", rel);
        }

        match remove_path(&path) {
            Ok(()) => outcome.removed.push(path),
            Err(source) => {
                warn!("Failed to remove {}, setting stale: {}", path.display(), source);
                reporter.stale(
                    &path,
                    SyncError::Remove {
                        path: path.clone(),
                        source,
                    },
                );
                outcome.stale.push(path);
            }
        }
    }

    Ok(outcome)
}

/// Removes a file, symlink or directory tree.
///
/// Directory removal falls back to a single-entry removal so that links to
/// directories are handled as well.
fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(err) => fs::remove_file(path).map_err(|_| err),
        }
    } else {
        fs::remove_file(path)
    }
}
