//! Archive extraction with containment and rollback.
//!
//! Members are written one at a time in archive order. The first member
//! that fails stops the extraction, and every file written by the members
//! before it is deleted again so a package is never left half installed.
//! The run is driven by [`ExtractState`]:
//!
//! ```text
//! Extracting --(all members done)--> Done
//! Extracting --(member fails)------> Failed -> RollingBack -> Done
//! ```

use crate::error::{SyncError, SyncResult};
use crate::report::Reporter;
use crate::safety::{ensure_contained, escaping_symlink, relative_segments, resolve_member};
use crate::types::SyncOptions;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use zip::ZipArchive;

/// Progress of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    /// Extracting the member at `next`
    Extracting { next: usize },
    /// The member at `index` failed to extract
    Failed { index: usize },
    /// Undoing every member with an index below `undo_before`
    RollingBack { undo_before: usize },
    Done,
}

/// What a member wrote to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrittenKind {
    File,
    Directory,
}

/// A member that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenMember {
    /// Index of the member within the archive
    pub index: usize,
    pub path: PathBuf,
    pub kind: WrittenKind,
}

/// Result of extracting one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOutcome {
    /// Members left on disk when the extraction finished
    pub written: Vec<WrittenMember>,

    /// Member names skipped because they resolve outside the boundary,
    /// either by name or through an existing symlink
    pub skipped: Vec<String>,

    /// Index of the member that failed, if any
    pub failed_at: Option<usize>,

    /// Files deleted while rolling back
    pub rolled_back: Vec<PathBuf>,
}

impl ExtractOutcome {
    pub fn is_success(&self) -> bool {
        self.failed_at.is_none()
    }
}

/// Result of one member extraction attempt.
enum MemberResult {
    Written,
    Skipped,
    Failed {
        /// Destination, when it was resolved before the failure
        dest: Option<PathBuf>,
        err: SyncError,
    },
}

/// Bookkeeping for one extraction run.
struct Extraction<'p> {
    boundary: &'p Path,
    prefix: Vec<String>,
    written: Vec<WrittenMember>,
    created_dirs: Vec<PathBuf>,
    skipped: Vec<String>,
    remove_file: fn(&Path) -> io::Result<()>,
}

impl<'p> Extraction<'p> {
    /// Extracts member `index`.
    ///
    /// A containment violation is returned as an error since it is fatal;
    /// ordinary failures come back as `MemberResult::Failed`.
    fn extract_member<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        index: usize,
    ) -> SyncResult<MemberResult> {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(source) => {
                return Ok(MemberResult::Failed {
                    dest: None,
                    err: SyncError::ArchiveRead { index, source },
                })
            }
        };
        let name = entry.name().to_string();

        let Some(rel) = resolve_member(&self.prefix, &name) else {
            warn!(
                "Skipping path {} that escapes {}",
                name,
                self.boundary.display()
            );
            self.skipped.push(name);
            return Ok(MemberResult::Skipped);
        };
        let dest = self.boundary.join(rel);
        ensure_contained(&dest, self.boundary)?;

        if let Some(link) = escaping_symlink(&dest, self.boundary) {
            warn!(
                "Skipping path {} behind symlink {} that leaves {}",
                name,
                link.display(),
                self.boundary.display()
            );
            self.skipped.push(name);
            return Ok(MemberResult::Skipped);
        }

        let result = if entry.is_dir() {
            self.create_dirs(&dest).map(|()| WrittenKind::Directory)
        } else {
            let parent_ready = match dest.parent() {
                Some(parent) => self.create_dirs(parent),
                None => Ok(()),
            };
            parent_ready
                .and_then(|()| File::create(&dest))
                .and_then(|mut out| io::copy(&mut entry, &mut out))
                .map(|_| WrittenKind::File)
        };

        match result {
            Ok(kind) => {
                debug!("Extracted {}", dest.display());
                self.written.push(WrittenMember {
                    index,
                    path: dest,
                    kind,
                });
                Ok(MemberResult::Written)
            }
            Err(source) => Ok(MemberResult::Failed {
                err: SyncError::Extract {
                    member: name,
                    path: dest.clone(),
                    source,
                },
                dest: Some(dest),
            }),
        }
    }

    /// Creates `dir` and its missing ancestors, remembering which were new.
    fn create_dirs(&mut self, dir: &Path) -> io::Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path == self.boundary || !path.starts_with(self.boundary) || path.exists() {
                break;
            }
            missing.push(path.to_path_buf());
            current = path.parent();
        }

        fs::create_dir_all(dir)?;
        self.created_dirs.extend(missing.into_iter().rev());
        Ok(())
    }

    /// Deletes whatever a failed member left at `dest`.
    fn discard_partial(&self, dest: &Path, reporter: &mut Reporter<'_>) {
        let is_file = fs::symlink_metadata(dest)
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return;
        }
        if let Err(source) = (self.remove_file)(dest) {
            reporter.stale(
                dest,
                SyncError::Remove {
                    path: dest.to_path_buf(),
                    source,
                },
            );
        }
    }

    /// Deletes the files of every member written before `undo_before`.
    fn roll_back(
        &mut self,
        undo_before: usize,
        options: &SyncOptions,
        reporter: &mut Reporter<'_>,
    ) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        let (undo, keep): (Vec<_>, Vec<_>) = self
            .written
            .drain(..)
            .partition(|member| member.index < undo_before);
        self.written = keep;

        for member in undo {
            if member.kind != WrittenKind::File {
                continue;
            }
            match (self.remove_file)(&member.path) {
                Ok(()) => removed.push(member.path),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(source) => reporter.stale(
                    &member.path,
                    SyncError::Remove {
                        path: member.path.clone(),
                        source,
                    },
                ),
            }
        }

        if options.prune_empty_dirs {
            // Deepest first; non-empty directories are left alone
            for dir in self.created_dirs.iter().rev() {
                if fs::remove_dir(dir).is_ok() {
                    debug!("Pruned {}", dir.display());
                }
            }
        }

        removed
    }
}

/// Extracts every member of `archive` into `site_packages`.
///
/// Member names are resolved relative to `site_packages` and may use `..`
/// to reach other directories, as long as the normalized result stays inside
/// `boundary`; members that leave it are skipped. `site_packages` must be a
/// strict descendant of `boundary`, otherwise nothing is written and
/// [`SyncError::Containment`] is returned.
///
/// On the first failing member the error is reported, the member's partial
/// file is deleted (or reported stale), later members are not attempted,
/// and the files of earlier members are deleted again.
pub fn extract_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    site_packages: &Path,
    boundary: &Path,
    options: &SyncOptions,
    reporter: &mut Reporter<'_>,
) -> SyncResult<ExtractOutcome> {
    extract_with(
        archive,
        site_packages,
        boundary,
        options,
        reporter,
        |path: &Path| fs::remove_file(path),
    )
}

/// [`extract_package`] with the file removal used by rollback supplied.
fn extract_with<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    site_packages: &Path,
    boundary: &Path,
    options: &SyncOptions,
    reporter: &mut Reporter<'_>,
    remove_file: fn(&Path) -> io::Result<()>,
) -> SyncResult<ExtractOutcome> {
    let mut run = Extraction {
        boundary,
        prefix: relative_segments(site_packages, boundary)?,
        written: Vec::new(),
        created_dirs: Vec::new(),
        skipped: Vec::new(),
        remove_file,
    };
    let mut outcome = ExtractOutcome::default();
    let mut state = ExtractState::Extracting { next: 0 };

    loop {
        state = match state {
            ExtractState::Extracting { next } if next >= archive.len() => ExtractState::Done,
            ExtractState::Extracting { next } => match run.extract_member(archive, next)? {
                MemberResult::Written | MemberResult::Skipped => {
                    ExtractState::Extracting { next: next + 1 }
                }
                MemberResult::Failed { dest, err } => {
                    error!("Failed to extract member #{}: {}", next, err);
                    reporter.error(err);
                    if let Some(dest) = dest {
                        run.discard_partial(&dest, reporter);
                    }
                    ExtractState::Failed { index: next }
                }
            },
            ExtractState::Failed { index } => {
                outcome.failed_at = Some(index);
                ExtractState::RollingBack { undo_before: index }
            }
            ExtractState::RollingBack { undo_before } => {
                outcome.rolled_back = run.roll_back(undo_before, options, reporter);
                ExtractState::Done
            }
            ExtractState::Done => break,
        };
    }

    outcome.written = run.written;
    outcome.skipped = run.skipped;
    Ok(outcome)
}
