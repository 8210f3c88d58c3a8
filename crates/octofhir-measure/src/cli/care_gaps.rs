//! Care-gaps command implementation

use super::output::{OutputTarget, print_outcome};
use super::workspace::{Workspace, WorkspaceConfig};
use anyhow::{Context, Result};
use octofhir_measure_eval::{CARE_GAP_PARAMETER_PREFIX, CareGapsRequest};

/// Configuration for the care-gaps command
pub struct CareGapsConfig {
    pub workspace: WorkspaceConfig,
    pub request: CareGapsRequest,
    pub output: OutputTarget,
}

/// Build the care-gap documents and print them as Parameters
pub async fn care_gaps(config: CareGapsConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let parameters = workspace
        .service
        .care_gaps(&config.request)
        .await
        .context("Failed to build care-gap report")?;

    print_outcome(&parameters);
    if config.workspace.verbose {
        let documents = parameters
            .parameter
            .iter()
            .filter(|p| p.name.starts_with(CARE_GAP_PARAMETER_PREFIX))
            .count();
        eprintln!("Built {} care-gap document(s)", documents);
    }
    config.output.emit(&parameters)
}
