//! Locator-driven extraction engine.
//!
//! The engine never talks to a browser directly; everything goes through
//! the [`Driver`] port. [`webdriver::WebDriverClient`] is the production
//! implementation, tests script their own.

pub mod aggregate;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod hook;
pub mod orchestrator;
pub mod pager;
pub mod scenario_source;
pub mod sink;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::RecordAggregator;
pub use driver::Driver;
pub use error::{DriverError, EngineError};
pub use extractor::{ExtractorRegistry, FieldExtractor, MissReason, Outcome};
pub use hook::{with_pending_hook, PendingHook};
pub use orchestrator::{
    CancelFlag, Orchestrator, OrchestratorOptions, RunOutcome, RunSummary, ScenarioResult,
};
pub use pager::{CategoryPager, PagerResult, PagerState, StopReason};
pub use scenario_source::{
    InlineScenarios, ScenarioBatch, ScenarioDirectory, ScenarioProvider, ScenarioSource,
};
pub use sink::{JsonFileSink, MemorySink, RecordSink};
pub use webdriver::{WebDriverClient, WebDriverConfig};
