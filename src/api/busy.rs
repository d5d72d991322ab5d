//! Re-entrancy guard for outbound fetches

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag marking a fetch as outstanding
///
/// Clones share the same flag. Action and camera fetches use one flag so
/// they never overlap.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    inner: Arc<AtomicBool>,
}

impl BusyFlag {
    /// Claim the flag, or `None` if a fetch is already outstanding
    #[must_use]
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.inner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                inner: Arc::clone(&self.inner),
            })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

/// Releases the busy flag when dropped
#[derive(Debug)]
pub struct BusyGuard {
    inner: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.store(false, Ordering::Release);
    }
}
