//! The browser-automation port.

use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{LocatorSpec, Resolved};

use crate::error::DriverError;

/// What the engine needs from a browser.
///
/// Implementations apply the locator's multiplicity policy and event
/// themselves. A locator that matches nothing within its timeout resolves to
/// `Ok(None)`, mandatory or not; deciding what a miss means is the caller's
/// job.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Loads `url`. `Ok(false)` means the page could not be loaded but the
    /// session is still usable.
    async fn navigate(&self, url: &str) -> Result<bool, DriverError>;

    async fn resolve(&self, locator: &LocatorSpec) -> Result<Option<Resolved>, DriverError>;

    async fn wait(&self, duration: Duration) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;
}
