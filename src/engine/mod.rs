pub mod cart;
pub mod code;
pub mod ledger;
pub mod projections;
pub mod routing;
pub mod session;

use std::sync::atomic::{AtomicBool, Ordering};

/// Raises a loading flag and lowers it again when dropped, whichever way the
/// load ends.
pub(crate) struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
