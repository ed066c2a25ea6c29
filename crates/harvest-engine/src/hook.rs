//! One-shot pre-action hook.
//!
//! Item pages often need a throwaway interaction (closing a newsletter
//! pop-up, accepting cookies) before anything can be read. The orchestrator
//! arms a [`PendingHook`] after each navigation; the next extraction step
//! wrapped by [`with_pending_hook`] fires it exactly once.

use std::future::Future;

use harvest_core::LocatorSpec;

use crate::driver::Driver;

/// Single-slot holder for the next hook to fire.
#[derive(Debug, Clone, Default)]
pub struct PendingHook {
    slot: Option<LocatorSpec>,
}

impl PendingHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the hook, replacing anything already pending.
    pub fn set(&mut self, locator: LocatorSpec) {
        self.slot = Some(locator);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Empties the slot and returns what was in it.
    pub fn take(&mut self) -> Option<LocatorSpec> {
        self.slot.take()
    }
}

/// Fires the pending hook (if any) and then runs `step`.
///
/// The slot is emptied before the hook is resolved, so a hook fires at most
/// once per [`PendingHook::set`] whether it succeeds, misses or errors.
/// Hook failures are logged at debug level and never reach `step`.
pub async fn with_pending_hook<D, F, Fut, T>(hook: &mut PendingHook, driver: &D, step: F) -> T
where
    D: Driver + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    if let Some(locator) = hook.take() {
        match driver.resolve(&locator).await {
            Ok(Some(_)) => tracing::debug!(hook = %locator.label(), "pending hook fired"),
            Ok(None) => tracing::debug!(hook = %locator.label(), "pending hook matched nothing"),
            Err(e) => {
                tracing::debug!(hook = %locator.label(), error = %e, "pending hook failed");
            }
        }
    }
    step().await
}
