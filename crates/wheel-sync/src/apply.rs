//! One full reconciliation run.

use crate::dedup::deduplicate_as_skip_set;
use crate::error::SyncResult;
use crate::extract::extract_package;
use crate::inspect::open_archive;
use crate::plan::build_desired_state;
use crate::remove::remove_package;
use crate::report::{ErrorCallback, Reporter, StaleCallback};
use crate::safety::ensure_strict_descendant;
use crate::scan::scan_installed;
use crate::types::{
    ApplyReport, ApplyRequest, DesiredState, InstalledState, ReconciliationPlan, SkipSet,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Everything a run would do, computed without touching the filesystem.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanPreview {
    pub plan: ReconciliationPlan,

    /// Archives dropped by deduplication
    pub skipped_archives: SkipSet,

    /// Top-level entries of the installation directory owned by no package
    pub unowned: BTreeSet<String>,

    #[serde(skip)]
    pub installed: InstalledState,

    #[serde(skip)]
    pub desired: DesiredState,
}

/// Scans, inspects and plans without removing or extracting anything.
///
/// Unreadable manifests and archives are passed to `on_error`.
pub fn plan_only(
    request: &ApplyRequest,
    on_error: &mut ErrorCallback<'_>,
) -> SyncResult<PlanPreview> {
    ensure_strict_descendant(&request.site_packages, &request.local_dir)?;

    // Only paths recorded in manifests are ever removed, never a blanket
    // sweep of the installation directory.
    let installed = scan_installed(&request.site_packages, on_error)?;
    let skipped_archives = deduplicate_as_skip_set(&request.sources);
    let desired = build_desired_state(&request.sources, &skipped_archives, on_error);
    let plan = ReconciliationPlan::compute(&installed, &desired);

    debug!(
        "Plan: {} removal(s), {} install(s), {} archive(s) skipped",
        plan.removals.len(),
        plan.installs.len(),
        skipped_archives.len()
    );

    Ok(PlanPreview {
        plan,
        skipped_archives,
        unowned: installed.unowned.clone(),
        installed,
        desired,
    })
}

/// Reconciles `request.site_packages` with the archives in `request.sources`.
///
/// Obsolete packages are removed first, then missing packages are extracted.
/// Per-item failures go to `on_error` (and `on_stale` for paths left behind)
/// and never stop the run. The only error returned is a containment
/// violation, which is raised before the filesystem is modified; a failure
/// to list the installation directory is reported and ends the run early.
pub fn apply(
    request: &ApplyRequest,
    on_error: &mut ErrorCallback<'_>,
    on_stale: &mut StaleCallback<'_>,
) -> SyncResult<ApplyReport> {
    let mut reporter = Reporter::new(on_error, on_stale);
    let mut report = ApplyReport::default();

    let preview = match plan_only(request, &mut |err| reporter.error(err)) {
        Ok(preview) => preview,
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            warn!("Aborting reconciliation: {}", err);
            reporter.error(err);
            report.errors = reporter.error_count();
            return Ok(report);
        }
    };

    let options = &request.options;

    for id in &preview.plan.removals {
        let Some(record) = preview.installed.packages.get(id) else {
            continue;
        };
        let outcome = remove_package(
            &request.site_packages,
            &request.local_dir,
            record,
            options,
            &mut reporter,
        )?;
        if outcome.blocked.is_some() {
            continue;
        }
        debug!(
            "Removed {}: {} path(s), {} stale",
            id,
            outcome.removed.len(),
            outcome.stale.len()
        );
        report.removed.push(id.clone());
    }

    for id in &preview.plan.installs {
        let (Some(record), Some(archive_path)) = (
            preview.desired.packages.get(id),
            preview.desired.archives.get(id),
        ) else {
            continue;
        };

        if options.debug {
            for path in &record.top_level {
                info!("adding wheel: {}", path);
            }
        }

        let mut archive = match open_archive(archive_path) {
            Ok(archive) => archive,
            Err(err) => {
                warn!("Error opening archive {}: {}", archive_path.display(), err);
                reporter.error(err);
                report.failed.push(id.clone());
                continue;
            }
        };

        let outcome = extract_package(
            &mut archive,
            &request.site_packages,
            &request.local_dir,
            options,
            &mut reporter,
        )?;

        if outcome.is_success() {
            report.installed.push(id.clone());
        } else {
            warn!(
                "Rolled back {} after a failed member, {} file(s) removed",
                id,
                outcome.rolled_back.len()
            );
            report.failed.push(id.clone());
        }
    }

    report.errors = reporter.error_count();
    report.stale_paths = reporter.stale_count();
    Ok(report)
}
