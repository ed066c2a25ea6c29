//! The run loop: scenarios → listing pages → item pages → records.
//!
//! Everything is sequential on a single task. Failures are contained at the
//! smallest level that can absorb them: a field miss stays on the record, an
//! unreachable item is skipped, an unreachable or empty listing skips its
//! scenario. Only a fatal driver error ends the run early, and even then the
//! records gathered so far are returned.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use harvest_core::{Record, ScenarioDescriptor, SupplierCatalog};
use serde::Serialize;

use crate::aggregate::RecordAggregator;
use crate::driver::Driver;
use crate::error::{DriverError, EngineError};
use crate::hook::PendingHook;
use crate::pager::{CategoryPager, DEFAULT_MAX_PAGES};
use crate::sink::RecordSink;

/// Cooperative stop signal, checked between scenarios and between items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// Cap on next-page advances per scenario.
    pub max_pages: usize,
    /// Pause between item pages, spent through [`Driver::wait`].
    pub item_delay: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            item_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: ScenarioDescriptor,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scenarios_total: usize,
    pub scenarios_completed: usize,
    pub scenarios_skipped: usize,
    pub pages_visited: usize,
    pub items_visited: usize,
    pub items_failed: usize,
    pub records_valid: usize,
    pub records_flagged: usize,
    pub sink_failures: usize,
}

impl RunSummary {
    fn start(scenarios_total: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            scenarios_total,
            scenarios_completed: 0,
            scenarios_skipped: 0,
            pages_visited: 0,
            items_visited: 0,
            items_failed: 0,
            records_valid: 0,
            records_flagged: 0,
            sink_failures: 0,
        }
    }

    #[must_use]
    pub fn records_total(&self) -> usize {
        self.records_valid + self.records_flagged
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    /// One entry per scenario whose listing was reachable and non-empty, in
    /// input order.
    pub results: Vec<ScenarioResult>,
    pub summary: RunSummary,
    /// The fatal driver error that ended the run, if any.
    pub aborted: Option<DriverError>,
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.results.iter().flat_map(|r| r.records.iter())
    }
}

enum ScenarioStatus {
    Completed,
    Skipped,
    Cancelled,
}

pub struct Orchestrator<'a, D: Driver + ?Sized> {
    driver: &'a D,
    catalog: &'a SupplierCatalog,
    aggregator: RecordAggregator,
    pager: CategoryPager<'a>,
    sink: Option<&'a dyn RecordSink>,
    options: OrchestratorOptions,
    cancel: CancelFlag,
}

impl<'a, D: Driver + ?Sized> Orchestrator<'a, D> {
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the catalog cannot drive
    /// extraction (dangling locator references).
    pub fn new(
        driver: &'a D,
        catalog: &'a SupplierCatalog,
        options: OrchestratorOptions,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            driver,
            catalog,
            aggregator: RecordAggregator::from_catalog(catalog)?,
            pager: CategoryPager::from_catalog(catalog, options.max_pages)?,
            sink: None,
            options,
            cancel: CancelFlag::new(),
        })
    }

    #[must_use]
    pub fn with_sink(mut self, sink: &'a dyn RecordSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self, scenarios: &[ScenarioDescriptor]) -> RunOutcome {
        let mut summary = RunSummary::start(scenarios.len());
        let mut results = Vec::new();
        let mut aborted = None;
        let mut cancelled = false;

        for scenario in scenarios {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let mut records = Vec::new();
            let status = self
                .run_scenario(scenario, &mut records, &mut summary)
                .await;

            let keep = match &status {
                Ok(ScenarioStatus::Completed) => {
                    summary.scenarios_completed += 1;
                    true
                }
                Ok(ScenarioStatus::Skipped) => {
                    summary.scenarios_skipped += 1;
                    false
                }
                Ok(ScenarioStatus::Cancelled) | Err(_) => !records.is_empty(),
            };
            if keep {
                results.push(ScenarioResult {
                    scenario: scenario.clone(),
                    records,
                });
            }

            match status {
                Ok(ScenarioStatus::Completed | ScenarioStatus::Skipped) => {}
                Ok(ScenarioStatus::Cancelled) => {
                    tracing::warn!(scenario = %scenario.name, "run cancelled");
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::error!(
                        scenario = %scenario.name,
                        error = %e,
                        "driver failure; aborting run"
                    );
                    aborted = Some(e);
                    break;
                }
            }
        }

        summary.finished_at = Utc::now();
        tracing::info!(
            scenarios = summary.scenarios_completed,
            skipped = summary.scenarios_skipped,
            records = summary.records_total(),
            flagged = summary.records_flagged,
            "run finished"
        );

        RunOutcome {
            results,
            summary,
            aborted,
            cancelled,
        }
    }

    async fn run_scenario(
        &self,
        scenario: &ScenarioDescriptor,
        records: &mut Vec<Record>,
        summary: &mut RunSummary,
    ) -> Result<ScenarioStatus, DriverError> {
        if !self.driver.navigate(&scenario.source_url).await? {
            tracing::warn!(
                scenario = %scenario.name,
                url = %scenario.source_url,
                "failed to load listing; skipping scenario"
            );
            return Ok(ScenarioStatus::Skipped);
        }

        let listing = self.pager.collect(self.driver).await?;
        summary.pages_visited += listing.pages_visited;
        if listing.item_urls.is_empty() {
            tracing::warn!(
                scenario = %scenario.name,
                url = %scenario.source_url,
                "no items found; skipping scenario"
            );
            return Ok(ScenarioStatus::Skipped);
        }

        tracing::info!(
            scenario = %scenario.name,
            items = listing.item_urls.len(),
            pages = listing.pages_visited,
            "collecting items"
        );

        let explicit = BTreeMap::new();
        for (idx, item_url) in listing.item_urls.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(ScenarioStatus::Cancelled);
            }
            if idx > 0 && !self.options.item_delay.is_zero() {
                self.driver.wait(self.options.item_delay).await?;
            }

            summary.items_visited += 1;
            let mut hook = PendingHook::new();
            if let Some(locator) = self.catalog.hook_locator() {
                hook.set(locator.clone());
            }

            let Some(mut record) = self
                .aggregator
                .collect(self.driver, &mut hook, item_url, None, &explicit)
                .await?
            else {
                summary.items_failed += 1;
                continue;
            };

            record.attach_categories(
                scenario.default_category_id,
                &scenario.additional_category_ids,
            );
            if record.is_valid() {
                summary.records_valid += 1;
            } else {
                summary.records_flagged += 1;
                tracing::warn!(
                    scenario = %scenario.name,
                    item = %item_url,
                    missing = ?record.missing_required,
                    "record flagged invalid"
                );
            }

            if let Some(sink) = self.sink {
                if let Err(e) = sink.upsert(&record).await {
                    summary.sink_failures += 1;
                    tracing::error!(item = %item_url, error = %e, "failed to persist record");
                }
            }
            records.push(record);
        }

        Ok(ScenarioStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use harvest_core::{parse_catalog, ScenarioOrigin};

    use super::*;
    use crate::sink::MemorySink;
    use crate::testing::{many, one, ScriptedDriver};

    const CATALOG: &str = r"
supplier_id: acme
listing:
  item_links: links
locators:
  links: { by: css, selector: a.item, attribute: href, if_list: all }
  sku: { by: css, selector: .sku }
fields:
  - { name: sku, locator: sku, normalizer: sku, required: true }
";

    fn scenario(url: &str) -> ScenarioDescriptor {
        ScenarioDescriptor {
            name: url.to_string(),
            source_url: url.to_string(),
            default_category_id: Some(4),
            additional_category_ids: vec![9],
            origin: ScenarioOrigin::Inline,
        }
    }

    fn shop() -> ScriptedDriver {
        ScriptedDriver::new()
            .page(
                "https://shop.test/c",
                &[("a.item", many(&["/p/1", "/p/2", "/p/3"]))],
            )
            .page("https://shop.test/p/1", &[(".sku", one("S1"))])
            .page("https://shop.test/p/2", &[(".sku", one("S2"))])
            .page("https://shop.test/p/3", &[(".sku", one("S3"))])
    }

    #[tokio::test]
    async fn item_delay_goes_through_driver_wait() {
        let driver = shop();
        let catalog = parse_catalog(CATALOG, "test").unwrap();
        let options = OrchestratorOptions {
            item_delay: Duration::from_millis(250),
            ..OrchestratorOptions::default()
        };

        let outcome = Orchestrator::new(&driver, &catalog, options)
            .unwrap()
            .run(&[scenario("https://shop.test/c")])
            .await;

        assert_eq!(outcome.records().count(), 3);
        assert_eq!(driver.waits(), vec![Duration::from_millis(250); 2]);
    }

    #[tokio::test]
    async fn cancelled_run_returns_without_touching_driver() {
        let driver = shop();
        let catalog = parse_catalog(CATALOG, "test").unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = Orchestrator::new(&driver, &catalog, OrchestratorOptions::default())
            .unwrap()
            .with_cancel_flag(cancel)
            .run(&[scenario("https://shop.test/c")])
            .await;

        assert!(outcome.cancelled);
        assert!(outcome.results.is_empty());
        assert!(driver.navigations().is_empty());
    }

    #[tokio::test]
    async fn records_are_persisted_with_categories() {
        let driver = shop();
        let catalog = parse_catalog(CATALOG, "test").unwrap();
        let sink = MemorySink::new();

        let outcome = Orchestrator::new(&driver, &catalog, OrchestratorOptions::default())
            .unwrap()
            .with_sink(&sink)
            .run(&[scenario("https://shop.test/c")])
            .await;

        assert_eq!(sink.len(), 3);
        assert!(sink.records().iter().all(|r| r.category_ids == vec![4, 9]));
        assert_eq!(outcome.summary.records_valid, 3);
        assert_eq!(outcome.summary.scenarios_completed, 1);
        assert!(outcome.aborted.is_none());
    }
}
