//! # Wheel Sync
//!
//! Reconciles a managed `site-packages` directory with a desired set of wheel
//! archives.
//!
//! A run scans the installed packages (their `*-info` metadata directories
//! and `RECORD` manifests), inspects the candidate wheels without extracting
//! them, keeps the newest wheel per package base name, and then removes the
//! packages that are no longer wanted before extracting the missing ones.
//!
//! Every path is checked against the managed directory before it is written
//! or deleted:
//!
//! - Removal only touches paths listed by a package's manifest.
//! - Extraction skips members whose names land outside the managed directory.
//! - Existing symlinks that lead out of the managed directory are not written
//!   or removed through.
//! - A member that fails to extract rolls back the whole package.
//!
//! The checks run just before each operation. A directory that is swapped
//! for a symlink by another process in between is not detected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use wheel_sync::{apply, ApplyRequest, ArchiveSource, SyncError, SyncOptions};
//!
//! # fn main() -> Result<(), SyncError> {
//! let request = ApplyRequest {
//!     local_dir: PathBuf::from("/home/me/.config/app/extensions/.local"),
//!     site_packages: PathBuf::from(
//!         "/home/me/.config/app/extensions/.local/lib/python3.11/site-packages",
//!     ),
//!     sources: vec![ArchiveSource::new(
//!         "my_extension",
//!         vec![PathBuf::from("/home/me/wheels/six-1.16.0-py2.py3-none-any.whl")],
//!     )],
//!     options: SyncOptions::default(),
//! };
//!
//! let mut on_error = |err: SyncError| eprintln!("error: {err}");
//! let mut on_stale = |path: &Path, err: SyncError| {
//!     eprintln!("retry later: {} ({err})", path.display());
//! };
//!
//! let report = apply(&request, &mut on_error, &mut on_stale)?;
//! println!("installed {} package(s)", report.installed.len());
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod manifest;
pub mod naming;
pub mod plan;
pub mod remove;
pub mod report;
pub mod safety;
pub mod scan;
pub mod types;
pub mod version;

// Re-export main types
pub use apply::{apply, plan_only, PlanPreview};
pub use dedup::deduplicate_as_skip_set;
pub use error::{SyncError, SyncResult};
pub use extract::{extract_package, ExtractOutcome, ExtractState};
pub use inspect::{inspect_archive, inspect_archive_reader, open_archive};
pub use manifest::read_manifest;
pub use plan::build_desired_state;
pub use remove::{remove_package, RemoveOutcome};
pub use report::{ErrorCallback, Reporter, StaleCallback};
pub use scan::scan_installed;
pub use types::{
    load_sources, ApplyReport, ApplyRequest, ArchiveSource, DesiredState, InstalledState,
    PackageId, PackageRecord, ReconciliationPlan, SkipSet, SyncOptions,
};
pub use version::WheelVersion;
