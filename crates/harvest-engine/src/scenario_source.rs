//! Scenario sources.
//!
//! Providers are tried in order and the first one that yields at least one
//! valid scenario wins. Bad entries and unreadable files are logged and
//! skipped; finding nothing at all is an empty batch, not an error.

use std::path::{Path, PathBuf};

use harvest_core::{parse_scenario_document, ScenarioDescriptor, ScenarioOrigin};
use serde_json::Value;

/// Valid scenarios plus a count of what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioBatch {
    pub scenarios: Vec<ScenarioDescriptor>,
    /// Entries and files that were skipped.
    pub rejected: usize,
}

impl ScenarioBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

pub trait ScenarioProvider: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    fn load(&self) -> ScenarioBatch;
}

/// Caller-supplied scenarios: one descriptor object, a list of them, or a
/// `{"scenarios": {...}}` map.
#[derive(Debug, Clone)]
pub struct InlineScenarios {
    document: Value,
}

impl InlineScenarios {
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

impl ScenarioProvider for InlineScenarios {
    fn name(&self) -> &str {
        "inline"
    }

    fn load(&self) -> ScenarioBatch {
        if self.document.is_null() {
            return ScenarioBatch::default();
        }
        let (scenarios, rejected) =
            parse_scenario_document(&self.document, "inline", ScenarioOrigin::Inline);
        for err in &rejected {
            tracing::warn!(error = %err, "skipping inline scenario");
        }
        ScenarioBatch {
            scenarios,
            rejected: rejected.len(),
        }
    }
}

/// Discovers `<root>/<supplier>/*.json`, read in file-name order.
#[derive(Debug, Clone)]
pub struct ScenarioDirectory {
    root: PathBuf,
    supplier: String,
}

impl ScenarioDirectory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, supplier: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            supplier: supplier.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.supplier)
    }

    fn scenario_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl ScenarioProvider for ScenarioDirectory {
    fn name(&self) -> &str {
        "directory"
    }

    fn load(&self) -> ScenarioBatch {
        let dir = self.dir();
        let files = match Self::scenario_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "no scenario directory");
                return ScenarioBatch::default();
            }
        };

        let mut batch = ScenarioBatch::default();
        for path in files {
            let label = path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

            let document = match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
                }) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable scenario file");
                    batch.rejected += 1;
                    continue;
                }
            };

            let (scenarios, rejected) =
                parse_scenario_document(&document, &label, ScenarioOrigin::Discovered);
            for err in &rejected {
                tracing::warn!(file = %path.display(), error = %err, "skipping scenario");
            }
            batch.rejected += rejected.len();
            batch.scenarios.extend(scenarios);
        }
        batch
    }
}

/// Ordered list of providers.
#[derive(Default)]
pub struct ScenarioSource {
    providers: Vec<Box<dyn ScenarioProvider>>,
}

impl ScenarioSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl ScenarioProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Result of the first provider that yields any valid scenario. Rejection
    /// counts from providers passed over are carried along.
    #[must_use]
    pub fn load(&self) -> ScenarioBatch {
        let mut rejected = 0;
        for provider in &self.providers {
            let batch = provider.load();
            rejected += batch.rejected;
            if !batch.is_empty() {
                tracing::info!(
                    source = provider.name(),
                    scenarios = batch.scenarios.len(),
                    rejected = batch.rejected,
                    "loaded scenarios"
                );
                return ScenarioBatch {
                    scenarios: batch.scenarios,
                    rejected,
                };
            }
        }
        tracing::info!("no scenarios found");
        ScenarioBatch {
            scenarios: Vec::new(),
            rejected,
        }
    }
}

#[cfg(test)]
#[path = "scenario_source_test.rs"]
mod tests;
