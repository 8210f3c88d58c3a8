//! Measure service wiring for CLI commands

use super::loader;
use crate::replay::ReplayEngine;
use anyhow::{Context, Result};
use octofhir_measure_eval::{MeasureConfig, MeasureService};
use octofhir_measure_model::InMemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Inputs shared by every command
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    /// Resource files or directories
    pub data: Vec<PathBuf>,
    /// Files of pre-computed MeasureReports
    pub reports: Vec<PathBuf>,
    /// Service configuration file
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Loaded store and engine with the service over them
pub struct Workspace {
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<ReplayEngine>,
    pub service: MeasureService,
}

impl Workspace {
    pub fn load(config: &WorkspaceConfig) -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        for path in &config.data {
            let loaded = loader::load_into(&store, path)?;
            if config.verbose {
                eprintln!("Loaded {} resources from {}", loaded, path.display());
            }
        }

        let engine = Arc::new(ReplayEngine::new());
        for path in &config.reports {
            for file in loader::json_files(path)? {
                let resource = loader::read_resource(&file)?;
                let loaded = engine
                    .load(&resource)
                    .with_context(|| format!("Invalid MeasureReport: {}", file.display()))?;
                if config.verbose {
                    eprintln!("Loaded {} reports from {}", loaded, file.display());
                }
            }
        }

        let measure_config = match &config.config {
            Some(path) => MeasureConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => MeasureConfig::default(),
        }
        .with_env_overrides();

        let service = MeasureService::builder(store.clone(), engine.clone())
            .config(measure_config)
            .build()
            .context("Failed to set up measure service")?;

        Ok(Self {
            store,
            engine,
            service,
        })
    }
}
