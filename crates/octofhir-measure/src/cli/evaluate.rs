//! Evaluate command implementation

use super::output::OutputTarget;
use super::workspace::{Workspace, WorkspaceConfig};
use anyhow::{Context, Result};
use octofhir_measure_eval::EvaluateMeasureRequest;

/// Configuration for the evaluate command
pub struct EvaluateConfig {
    pub workspace: WorkspaceConfig,
    pub request: EvaluateMeasureRequest,
    pub output: OutputTarget,
}

/// Evaluate a measure and print the MeasureReport
pub async fn evaluate(config: EvaluateConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let report = workspace
        .service
        .evaluate_measure(&config.request)
        .await
        .with_context(|| format!("Failed to evaluate Measure/{}", config.request.measure_id))?;

    if config.workspace.verbose {
        eprintln!(
            "Evaluated {} with {} group(s)",
            report.measure,
            report.group.len()
        );
    }
    config.output.emit(&report)
}
