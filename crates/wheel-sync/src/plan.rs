//! Desired-state construction and the add/remove plan.

use crate::error::SyncError;
use crate::inspect::inspect_archive;
use crate::types::{ArchiveSource, DesiredState, InstalledState, ReconciliationPlan, SkipSet};
use tracing::{debug, warn};

/// Inspects every archive not in `skip`, in source order.
///
/// Archives that fail to open are passed to `on_error`; archives without a
/// metadata directory are dropped silently. When two archives yield the same
/// package id the later one replaces the earlier.
pub fn build_desired_state(
    sources: &[ArchiveSource],
    skip: &SkipSet,
    on_error: &mut dyn FnMut(SyncError),
) -> DesiredState {
    let mut desired = DesiredState::default();

    for source in sources {
        for archive in &source.archives {
            if skip.contains(archive) {
                continue;
            }
            match inspect_archive(archive) {
                Ok(Some(record)) => {
                    if let Some(previous) = desired.archives.get(&record.id) {
                        debug!(
                            "{} from {} replaces {}",
                            record.id,
                            archive.display(),
                            previous.display()
                        );
                    }
                    desired.insert(record, archive.clone());
                }
                Ok(None) => {
                    debug!("No package metadata in {}", archive.display());
                }
                Err(err) => {
                    warn!("Ignoring archive from source {}: {}", source.key, err);
                    on_error(err);
                }
            }
        }
    }

    desired
}

impl ReconciliationPlan {
    /// Computes removals and installs; packages in both states are untouched.
    pub fn compute(installed: &InstalledState, desired: &DesiredState) -> Self {
        let removals = installed
            .packages
            .keys()
            .filter(|id| !desired.packages.contains_key(*id))
            .cloned()
            .collect();
        let installs = desired
            .packages
            .keys()
            .filter(|id| !installed.packages.contains_key(*id))
            .cloned()
            .collect();
        Self { removals, installs }
    }
}
