//! Category pagination.
//!
//! Walks a listing from its first page, collecting item links and following
//! the next-page locator until there is no next page, the next page was
//! already visited, navigation fails, or the advance cap is hit.
//!
//! ```text
//! AtPage -> Collecting -> Advancing -> AtPage (next page loaded)
//!                                   -> Done   (no next / revisit / cap / nav failure)
//! ```

use std::collections::HashSet;

use harvest_core::{Event, LocatorSpec, SupplierCatalog};
use url::Url;

use crate::driver::Driver;
use crate::error::{DriverError, EngineError};

/// Default cap on next-page advances per scenario.
pub const DEFAULT_MAX_PAGES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    AtPage,
    Collecting,
    Advancing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoNextPage,
    /// The next-page locator pointed at a page already visited.
    Revisited,
    CapReached,
    NavigationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerResult {
    /// Absolute item URLs in first-seen order, without duplicates.
    pub item_urls: Vec<String>,
    pub pages_visited: usize,
    pub stop: StopReason,
}

pub struct CategoryPager<'a> {
    item_links: &'a LocatorSpec,
    next_page: Option<&'a LocatorSpec>,
    max_pages: usize,
}

impl<'a> CategoryPager<'a> {
    #[must_use]
    pub fn new(
        item_links: &'a LocatorSpec,
        next_page: Option<&'a LocatorSpec>,
        max_pages: usize,
    ) -> Self {
        Self {
            item_links,
            next_page,
            max_pages,
        }
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the catalog's item-links locator
    /// is missing.
    pub fn from_catalog(catalog: &'a SupplierCatalog, max_pages: usize) -> Result<Self, EngineError> {
        let item_links = catalog
            .item_links_locator()
            .ok_or_else(|| EngineError::Catalog {
                reason: format!(
                    "listing.item_links locator '{}' is not defined",
                    catalog.listing.item_links
                ),
            })?;
        Ok(Self::new(item_links, catalog.next_page_locator(), max_pages))
    }

    /// Collects item URLs starting from the page the driver is on.
    ///
    /// # Errors
    ///
    /// Returns the driver error only when it is fatal.
    pub async fn collect<D>(&self, driver: &D) -> Result<PagerResult, DriverError>
    where
        D: Driver + ?Sized,
    {
        let mut current = driver.current_url().await?;
        let mut visited: HashSet<String> = HashSet::from([canonical(&current)]);
        let mut seen: HashSet<String> = HashSet::new();
        let mut item_urls = Vec::new();
        let mut advances = 0usize;
        let mut stop = StopReason::NoNextPage;
        let mut state = PagerState::AtPage;

        while state != PagerState::Done {
            tracing::trace!(page = %current, ?state, "pager step");
            state = match state {
                PagerState::AtPage => PagerState::Collecting,
                PagerState::Collecting => {
                    for link in self.links_on_page(driver, &current).await? {
                        if seen.insert(link.clone()) {
                            item_urls.push(link);
                        }
                    }
                    PagerState::Advancing
                }
                PagerState::Advancing => {
                    match self.advance(driver, &current, &visited, advances).await? {
                        Ok(next) => {
                            advances += 1;
                            visited.insert(canonical(&next));
                            current = next;
                            PagerState::AtPage
                        }
                        Err(reason) => {
                            stop = reason;
                            PagerState::Done
                        }
                    }
                }
                PagerState::Done => PagerState::Done,
            };
        }

        tracing::debug!(
            pages = advances + 1,
            items = item_urls.len(),
            stop = ?stop,
            "pagination finished"
        );

        Ok(PagerResult {
            item_urls,
            pages_visited: advances + 1,
            stop,
        })
    }

    async fn links_on_page<D>(&self, driver: &D, page: &str) -> Result<Vec<String>, DriverError>
    where
        D: Driver + ?Sized,
    {
        let resolved = match driver.resolve(self.item_links).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                tracing::debug!(page = %page, "no item links on page");
                return Ok(Vec::new());
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(page = %page, error = %e, "failed to read item links");
                return Ok(Vec::new());
            }
        };

        Ok(resolved
            .into_vec()
            .iter()
            .filter_map(|raw| {
                let absolute = absolutize(page, raw);
                if absolute.is_none() {
                    tracing::debug!(page = %page, link = %raw, "ignoring unusable item link");
                }
                absolute
            })
            .collect())
    }

    /// Moves to the next page. The inner `Err` is why pagination stops.
    async fn advance<D>(
        &self,
        driver: &D,
        current: &str,
        visited: &HashSet<String>,
        advances: usize,
    ) -> Result<Result<String, StopReason>, DriverError>
    where
        D: Driver + ?Sized,
    {
        let Some(next_page) = self.next_page else {
            return Ok(Err(StopReason::NoNextPage));
        };

        if advances >= self.max_pages {
            tracing::warn!(
                page = %current,
                max_pages = self.max_pages,
                "pagination cap reached; stopping"
            );
            return Ok(Err(StopReason::CapReached));
        }

        let resolved = match driver.resolve(next_page).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return Ok(Err(StopReason::NoNextPage)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(page = %current, error = %e, "failed to resolve next page");
                return Ok(Err(StopReason::NoNextPage));
            }
        };

        // A clicked next-page control has already moved the browser.
        if next_page.event == Some(Event::Click) {
            let landed = driver.current_url().await?;
            if visited.contains(&canonical(&landed)) {
                return Ok(Err(StopReason::Revisited));
            }
            return Ok(Ok(landed));
        }

        let Some(target) = resolved.first().and_then(|raw| absolutize(current, raw)) else {
            return Ok(Err(StopReason::NoNextPage));
        };
        if visited.contains(&canonical(&target)) {
            tracing::debug!(page = %current, next = %target, "next page already visited");
            return Ok(Err(StopReason::Revisited));
        }

        if !driver.navigate(&target).await? {
            tracing::warn!(page = %current, next = %target, "failed to load next page; stopping");
            return Ok(Err(StopReason::NavigationFailed));
        }
        Ok(Ok(target))
    }
}

/// Resolves `raw` against `base` and drops the fragment. Falls back to
/// parsing `raw` alone when `base` is not a URL.
fn absolutize(base: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("javascript:") {
        return None;
    }
    let mut url = Url::parse(base)
        .and_then(|base| base.join(raw))
        .or_else(|_| Url::parse(raw))
        .ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

/// Key for the visited set.
fn canonical(url: &str) -> String {
    Url::parse(url).map_or_else(
        |_| url.trim().to_string(),
        |mut u| {
            u.set_fragment(None);
            u.into()
        },
    )
}

#[cfg(test)]
#[path = "pager_test.rs"]
mod tests;
