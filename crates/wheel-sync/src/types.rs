//! Type definitions for reconciliation.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One logical provider's set of candidate archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSource {
    /// Opaque handle identifying the provider
    pub key: String,

    /// Absolute archive file paths, in priority order
    pub archives: Vec<PathBuf>,
}

impl ArchiveSource {
    pub fn new(key: impl Into<String>, archives: Vec<PathBuf>) -> Self {
        Self {
            key: key.into(),
            archives,
        }
    }
}

/// Reads a JSON list of [`ArchiveSource`] values from disk.
pub fn load_sources(path: &Path) -> SyncResult<Vec<ArchiveSource>> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| SyncError::Sources {
        path: path.to_path_buf(),
        source,
    })
}

/// Canonical metadata-directory name of a package, e.g. `six-1.16.0.dist-info`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A package and the top-level paths it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Metadata directory name
    pub id: PackageId,

    /// Top-level names installed by the package, excluding the metadata
    /// directory. Never contains `..` or empty names.
    pub top_level: BTreeSet<String>,
}

impl PackageRecord {
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            top_level: BTreeSet::new(),
        }
    }

    /// Adds a top-level name, ignoring names that could leave the directory.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return false;
        }
        self.top_level.insert(name.to_string())
    }

    /// Every path owned by the package, metadata directory first.
    pub fn owned_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str())
            .chain(self.top_level.iter().map(String::as_str))
    }
}

/// Packages currently present in the installation directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstalledState {
    pub packages: BTreeMap<PackageId, PackageRecord>,

    /// Top-level entries claimed by no package. Informational only.
    pub unowned: BTreeSet<String>,
}

/// Packages that should be present after reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    pub packages: BTreeMap<PackageId, PackageRecord>,

    /// Archive supplying each desired package
    pub archives: BTreeMap<PackageId, PathBuf>,
}

impl DesiredState {
    /// Records a package; a later insert for the same id replaces the earlier.
    pub fn insert(&mut self, record: PackageRecord, archive: PathBuf) {
        self.archives.insert(record.id.clone(), archive);
        self.packages.insert(record.id.clone(), record);
    }
}

/// Archive paths excluded because another archive supplies the same base name.
pub type SkipSet = BTreeSet<PathBuf>;

/// The add/remove delta between installed and desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    /// Installed packages absent from the desired state
    pub removals: Vec<PackageId>,

    /// Desired packages absent from the installed state
    pub installs: Vec<PackageId>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.installs.is_empty()
    }
}

/// Options controlling a reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Log every path added or removed at info level
    pub debug: bool,

    /// Remove directories created by an extraction that was rolled back
    pub prune_empty_dirs: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debug: false,
            prune_empty_dirs: true,
        }
    }
}

/// Inputs of a reconciliation run.
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    /// Managed directory; nothing outside it is ever written or deleted
    pub local_dir: PathBuf,

    /// Directory packages are extracted into, a descendant of `local_dir`
    pub site_packages: PathBuf,

    /// Candidate archives in priority order
    pub sources: Vec<ArchiveSource>,

    pub options: SyncOptions,
}

/// Summary of a completed reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Packages whose paths were removed (some may have been reported stale)
    pub removed: Vec<PackageId>,

    /// Packages extracted successfully
    pub installed: Vec<PackageId>,

    /// Packages whose archive failed to open or extract
    pub failed: Vec<PackageId>,

    /// Number of paths handed to the stale callback
    pub stale_paths: usize,

    /// Number of errors handed to the error callback
    pub errors: usize,
}
