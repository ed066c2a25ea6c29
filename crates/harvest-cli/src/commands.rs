//! Sub-command handlers.
//!
//! Catalog and config problems abort before a browser session is opened.
//! Once a session exists it is always closed, even when the run aborts.

use std::path::Path;
use std::time::Duration;

use harvest_core::{AppConfig, ScenarioDescriptor, SupplierCatalog};
use harvest_engine::{
    CancelFlag, EngineError, InlineScenarios, JsonFileSink, Orchestrator, OrchestratorOptions,
    RunOutcome, ScenarioBatch, ScenarioDirectory, ScenarioSource, WebDriverClient,
    WebDriverConfig,
};

fn load_supplier_catalog(config: &AppConfig, supplier: &str) -> anyhow::Result<SupplierCatalog> {
    let path = config.catalog_path(supplier);
    harvest_core::load_catalog(&path)
        .map_err(|e| anyhow::anyhow!("supplier catalog '{supplier}' is unusable: {e}"))
}

/// Reads an inline scenario document from disk.
pub(crate) fn read_scenario_file(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {e}", path.display()))
}

/// Inline scenarios first when a file is given, discovery otherwise (and as
/// the fallback when the file yields nothing valid).
pub(crate) fn load_scenarios(
    config: &AppConfig,
    supplier: &str,
    scenario_file: Option<&Path>,
) -> anyhow::Result<ScenarioBatch> {
    let mut source = ScenarioSource::new();
    if let Some(path) = scenario_file {
        source = source.with_provider(InlineScenarios::new(read_scenario_file(path)?));
    }
    source = source.with_provider(ScenarioDirectory::new(&config.scenarios_dir, supplier));
    Ok(source.load())
}

fn print_scenarios(scenarios: &[ScenarioDescriptor]) {
    for scenario in scenarios {
        let categories: Vec<String> = scenario
            .category_ids()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{}\t{}\t[{}]",
            scenario.name,
            scenario.source_url,
            categories.join(", ")
        );
    }
}

/// `harvest validate`: loads the catalog and reports what it defines.
pub(crate) fn run_validate(config: &AppConfig, supplier: &str) -> anyhow::Result<()> {
    let catalog = load_supplier_catalog(config, supplier)?;
    println!(
        "catalog '{supplier}' is valid: supplier_id {}, {} locators, {} fields",
        catalog.supplier_id,
        catalog.locators.len(),
        catalog.fields.len()
    );
    Ok(())
}

/// `harvest scenarios`: lists discovered scenarios.
pub(crate) fn run_list_scenarios(config: &AppConfig, supplier: &str) -> anyhow::Result<()> {
    let batch = load_scenarios(config, supplier, None)?;
    print_scenarios(&batch.scenarios);
    println!(
        "{} scenarios, {} rejected",
        batch.scenarios.len(),
        batch.rejected
    );
    Ok(())
}

/// `harvest run`.
///
/// # Errors
///
/// Returns an error if the catalog is invalid, the scenario file cannot be
/// read, the browser session cannot be opened, or the run was aborted by a
/// fatal driver failure (after the summary has been printed).
pub(crate) async fn run_harvest(
    config: &AppConfig,
    supplier: &str,
    scenario_file: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let catalog = load_supplier_catalog(config, supplier)?;
    let batch = load_scenarios(config, supplier, scenario_file)?;

    if dry_run {
        println!(
            "dry-run: would run {} scenarios for supplier {}",
            batch.scenarios.len(),
            catalog.supplier_id
        );
        print_scenarios(&batch.scenarios);
        return Ok(());
    }

    if batch.is_empty() {
        tracing::warn!(supplier = %supplier, "no scenarios to run");
        return Ok(());
    }

    let sink = JsonFileSink::open(&config.output_path).await?;
    let client = WebDriverClient::connect(&WebDriverConfig::from_app_config(config)).await?;
    tracing::info!(
        supplier = %supplier,
        session = %client.session_id(),
        scenarios = batch.scenarios.len(),
        "browser session opened"
    );

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing current item");
            signal_flag.cancel();
        }
    });

    let options = OrchestratorOptions {
        max_pages: config.max_pages,
        item_delay: Duration::from_millis(config.item_delay_ms),
    };
    let result = orchestrate(&client, &catalog, &sink, options, cancel, &batch.scenarios).await;
    close_best_effort(client).await;
    report(&result?, sink.path())
}

async fn orchestrate(
    client: &WebDriverClient,
    catalog: &SupplierCatalog,
    sink: &JsonFileSink,
    options: OrchestratorOptions,
    cancel: CancelFlag,
    scenarios: &[ScenarioDescriptor],
) -> Result<RunOutcome, EngineError> {
    Ok(Orchestrator::new(client, catalog, options)?
        .with_sink(sink)
        .with_cancel_flag(cancel)
        .run(scenarios)
        .await)
}

async fn close_best_effort(client: WebDriverClient) {
    if let Err(e) = client.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
}

fn report(outcome: &RunOutcome, output: &Path) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    println!("records written to {}", output.display());

    if outcome.cancelled {
        tracing::warn!("run cancelled before all scenarios finished");
    }
    if let Some(e) = &outcome.aborted {
        anyhow::bail!("run aborted by driver failure: {e}");
    }
    Ok(())
}
