//! Reporting organization resolution

use async_trait::async_trait;
use octofhir_measure_model::{
    OrganizationResolver, Reference, ResourceStore, SearchParams, StoreError,
};
use std::sync::Arc;

/// An explicitly configured reporting organization
#[derive(Debug, Clone)]
pub struct ConfiguredOrganization {
    reference: Reference,
}

impl ConfiguredOrganization {
    /// Accepts `Organization/<id>` or a bare id
    pub fn new(organization: &str) -> Self {
        let organization = organization.trim();
        let reference = if organization.starts_with("Organization/") {
            organization.to_string()
        } else {
            format!("Organization/{}", organization)
        };
        Self {
            reference: Reference::new(reference),
        }
    }
}

#[async_trait]
impl OrganizationResolver for ConfiguredOrganization {
    async fn resolve(&self) -> Result<Option<Reference>, StoreError> {
        Ok(Some(self.reference.clone()))
    }
}

/// Attributes reports to the first Organization storage returns
///
/// Not deterministic when organizations are created concurrently; prefer
/// [`ConfiguredOrganization`].
pub struct FirstOrganization {
    store: Arc<dyn ResourceStore>,
}

impl FirstOrganization {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrganizationResolver for FirstOrganization {
    async fn resolve(&self) -> Result<Option<Reference>, StoreError> {
        let found = self
            .store
            .search("Organization", &SearchParams::new().with_count(1))
            .await?;
        Ok(found
            .first()
            .and_then(|organization| organization.id())
            .map(|id| Reference::new(format!("Organization/{}", id))))
    }
}
