//! Data-requirements, refresh and narrative commands

use super::output::OutputTarget;
use super::workspace::{Workspace, WorkspaceConfig};
use anyhow::{Context, Result};

/// Configuration shared by the measure content commands
pub struct ContentConfig {
    pub workspace: WorkspaceConfig,
    pub measure_id: String,
    pub output: OutputTarget,
}

/// Print the data requirements Library of a measure
pub async fn data_requirements(
    config: ContentConfig,
    period_start: Option<String>,
    period_end: Option<String>,
) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let library = workspace
        .service
        .data_requirements(&config.measure_id, period_start.as_deref(), period_end.as_deref())
        .await
        .with_context(|| format!("Failed to compute data requirements of Measure/{}", config.measure_id))?;
    config.output.emit(&library)
}

/// Refresh generated content and print the updated measure
pub async fn refresh(config: ContentConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let measure = workspace
        .service
        .refresh_generated_content(&config.measure_id)
        .await
        .with_context(|| format!("Failed to refresh Measure/{}", config.measure_id))?;

    if config.workspace.verbose {
        eprintln!(
            "Measure/{} now lists {} related artifact(s)",
            config.measure_id,
            measure.related_artifact.len()
        );
    }
    config.output.emit(&measure)
}

/// Print the generated narrative as Parameters
pub async fn narrative(config: ContentConfig) -> Result<()> {
    let workspace = Workspace::load(&config.workspace)?;
    let parameters = workspace
        .service
        .get_narrative(&config.measure_id)
        .await
        .with_context(|| format!("Failed to generate narrative of Measure/{}", config.measure_id))?;
    config.output.emit(&parameters)
}
