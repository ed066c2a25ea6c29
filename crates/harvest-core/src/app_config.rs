use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory holding one catalog file per supplier (`<supplier>.yaml`).
    pub suppliers_dir: PathBuf,
    /// Root of the scenario tree; discovery reads `<root>/<supplier>/*.json`.
    pub scenarios_dir: PathBuf,
    pub output_path: PathBuf,
    pub webdriver_url: String,
    /// Hard cap on next-page transitions per listing.
    pub max_pages: usize,
    /// Politeness delay between item pages, in milliseconds.
    pub item_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl AppConfig {
    /// Path of the catalog file for `supplier`. Prefers `.yaml`, then `.yml`,
    /// then `.json`; returns the `.yaml` path when none exist so the caller
    /// reports a sensible "not found" path.
    #[must_use]
    pub fn catalog_path(&self, supplier: &str) -> PathBuf {
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| self.suppliers_dir.join(format!("{supplier}.{ext}")))
            .find(|p| p.exists())
            .unwrap_or_else(|| self.suppliers_dir.join(format!("{supplier}.yaml")))
    }
}
