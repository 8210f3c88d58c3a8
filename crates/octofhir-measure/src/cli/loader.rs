//! Resource file loading

use anyhow::{Context, Result};
use octofhir_measure_model::{Bundle, FhirResource, InMemoryStore, Resource};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a single JSON resource from a file
pub fn read_resource(path: &Path) -> Result<Resource> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))?;
    Resource::from_value(value)
        .with_context(|| format!("Not a FHIR resource: {}", path.display()))
}

/// JSON files under `path`, sorted by name; `path` itself when it is a file
pub fn json_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;
    for entry in entries {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            files.extend(json_files(&entry_path)?);
        } else if entry_path.extension().is_some_and(|ext| ext == "json") {
            files.push(entry_path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load resources from a file or directory into the store
///
/// Bundles contribute their entries; any other resource is stored as is.
/// Returns how many resources were stored.
pub fn load_into(store: &InMemoryStore, path: &Path) -> Result<usize> {
    let mut loaded = 0;
    for file in json_files(path)? {
        let resource = read_resource(&file)?;
        let stored = if resource.is_type(Bundle::RESOURCE_TYPE) {
            let bundle: Bundle = resource
                .to_typed()
                .with_context(|| format!("Invalid Bundle: {}", file.display()))?;
            store.load_bundle(&bundle)
        } else {
            store.insert(resource).map(|_| 1)
        };
        loaded += stored.with_context(|| format!("Failed to load {}", file.display()))?;
        log::debug!("Loaded {}", file.display());
    }
    Ok(loaded)
}
