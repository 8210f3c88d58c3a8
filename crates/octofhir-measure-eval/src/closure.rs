//! Reference closure resolution
//!
//! Collects every resource transitively reachable from a set of seed
//! resources through their reference fields. Each identity is added at most
//! once, which is also what makes cyclic graphs terminate.

use crate::error::{MeasureError, MeasureResult};
use indexmap::IndexMap;
use octofhir_measure_diagnostics::{Diagnostic, MEA0503};
use octofhir_measure_model::{
    Bundle, ReferenceFields, Resource, ResourceKey, ResourceStore,
};

/// Resource type never added to a closure as a seed
pub const LIST_RESOURCE_TYPE: &str = "List";

/// Deduplicated resources in discovery order
#[derive(Debug, Clone, Default)]
pub struct ClosureSet {
    resources: IndexMap<ResourceKey, Resource>,
    warnings: Vec<Diagnostic>,
}

impl ClosureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.contains_key(key)
    }

    /// Add a resource unless its identity is already present
    pub fn insert(&mut self, key: ResourceKey, resource: Resource) -> bool {
        if self.resources.contains_key(&key) {
            return false;
        }
        self.resources.insert(key, resource);
        true
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.resources.keys()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Seeds that could not be added
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources.into_values().collect()
    }
}

/// Walks reference fields, fetching missing resources from storage
pub struct ReferenceResolver<'a> {
    store: &'a dyn ResourceStore,
    fields: &'a dyn ReferenceFields,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(store: &'a dyn ResourceStore, fields: &'a dyn ReferenceFields) -> Self {
        Self { store, fields }
    }

    /// Closure of every top-level resource in a bundle
    pub async fn resolve_bundle(&self, bundle: &Bundle) -> MeasureResult<ClosureSet> {
        let mut closure = ClosureSet::new();
        for resource in bundle.resources() {
            self.add_seed(&mut closure, resource).await?;
        }
        Ok(closure)
    }

    /// Closure of a single root resource, the root included
    pub async fn resolve_resource(&self, root: &Resource) -> MeasureResult<ClosureSet> {
        let mut closure = ClosureSet::new();
        self.add_seed(&mut closure, root).await?;
        Ok(closure)
    }

    /// Add a seed and everything reachable from it
    pub async fn add_seed(&self, closure: &mut ClosureSet, seed: &Resource) -> MeasureResult<()> {
        if seed.is_type(LIST_RESOURCE_TYPE) {
            return Ok(());
        }
        let Some(key) = seed.key() else {
            let resource_type = seed.resource_type().unwrap_or("Resource");
            log::warn!("Skipping {} without an id while collecting references", resource_type);
            closure.warnings.push(Diagnostic::warning(
                MEA0503,
                format!("{} without an id was not collected", resource_type),
            ));
            return Ok(());
        };
        if !closure.insert(key, seed.clone()) {
            return Ok(());
        }
        self.expand(closure, seed).await
    }

    /// Depth-first walk from `start`, visiting fields in declaration order
    async fn expand(&self, closure: &mut ClosureSet, start: &Resource) -> MeasureResult<()> {
        let mut stack = vec![self.targets(start).into_iter()];

        while let Some(pending) = stack.last_mut() {
            let Some(key) = pending.next() else {
                stack.pop();
                continue;
            };
            if closure.contains(&key) {
                continue;
            }

            log::debug!("Fetching referenced {}", key);
            let resource = self
                .store
                .read(&key)
                .await?
                .ok_or_else(|| MeasureError::UnresolvedReference { key: key.clone() })?;

            let next = self.targets(&resource);
            closure.insert(key, resource);
            stack.push(next.into_iter());
        }

        Ok(())
    }

    fn targets(&self, resource: &Resource) -> Vec<ResourceKey> {
        self.fields
            .reference_fields(resource)
            .into_iter()
            .filter_map(|field| field.target)
            .collect()
    }
}
