//! Collect-data command implementation

use super::output::{OutputTarget, print_outcome};
use super::workspace::{Workspace, WorkspaceConfig};
use anyhow::{Context, Result};
use octofhir_measure_eval::CollectDataRequest;

/// Configuration for the collect-data command
pub struct CollectConfig {
    pub workspace: WorkspaceConfig,
    pub request: CollectDataRequest,
    pub output: OutputTarget,
}

pub async fn collect_data(config: CollectConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let parameters = workspace
        .service
        .collect_data(&config.request)
        .await
        .with_context(|| format!("Failed to collect data for Measure/{}", config.request.measure_id))?;

    print_outcome(&parameters);
    if config.workspace.verbose {
        let collected = parameters
            .parameter
            .iter()
            .filter(|p| p.name == "resource")
            .count();
        eprintln!("Collected {} resource(s)", collected);
    }
    config.output.emit(&parameters)
}
