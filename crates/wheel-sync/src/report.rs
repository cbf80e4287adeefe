//! Callback plumbing for non-fatal failures.

use crate::error::SyncError;
use std::path::Path;

/// Callback receiving errors that did not stop the run.
pub type ErrorCallback<'a> = dyn FnMut(SyncError) + 'a;

/// Callback receiving paths that could not be cleaned up.
///
/// The caller should treat these paths as stale and retry removing them
/// later, for example on the next start once file locks are released.
pub type StaleCallback<'a> = dyn FnMut(&Path, SyncError) + 'a;

/// Routes failures to the caller's callbacks and counts them.
pub struct Reporter<'a> {
    on_error: &'a mut ErrorCallback<'a>,
    on_stale: &'a mut StaleCallback<'a>,
    errors: usize,
    stale: usize,
}

impl<'a> Reporter<'a> {
    pub fn new(on_error: &'a mut ErrorCallback<'a>, on_stale: &'a mut StaleCallback<'a>) -> Self {
        Self {
            on_error,
            on_stale,
            errors: 0,
            stale: 0,
        }
    }

    pub fn error(&mut self, err: SyncError) {
        self.errors += 1;
        (self.on_error)(err);
    }

    pub fn stale(&mut self, path: &Path, err: SyncError) {
        self.stale += 1;
        (self.on_stale)(path, err);
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Number of stale paths reported so far.
    pub fn stale_count(&self) -> usize {
        self.stale
    }
}
