//! Submit-data command implementation

use super::loader;
use super::output::{self, OutputTarget};
use super::workspace::{Workspace, WorkspaceConfig};
use anyhow::{Context, Result};
use octofhir_measure_model::MeasureReport;
use std::path::PathBuf;

/// Configuration for the submit-data command
pub struct SubmitConfig {
    pub workspace: WorkspaceConfig,
    pub measure_id: String,
    /// MeasureReport file
    pub report: PathBuf,
    /// Resource or Bundle files submitted with the report
    pub resources: Vec<PathBuf>,
    pub output: OutputTarget,
}

/// Submit a report and resources as one transaction and print the response
pub async fn submit_data(config: SubmitConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;

    let report: MeasureReport = loader::read_resource(&config.report)?
        .to_typed()
        .with_context(|| format!("Not a MeasureReport: {}", config.report.display()))?;
    let resources = config
        .resources
        .iter()
        .map(|path| loader::read_resource(path))
        .collect::<Result<Vec<_>>>()?;

    let response = workspace
        .service
        .submit_data(&config.measure_id, Some(&report), resources)
        .await
        .context("Submission rejected")?;

    if config.workspace.verbose {
        eprintln!(
            "{}",
            output::format_warning(&format!(
                "Applied {} entries to the in-memory store only",
                response.entry.len()
            ))
        );
    }
    config.output.emit(&response)
}
