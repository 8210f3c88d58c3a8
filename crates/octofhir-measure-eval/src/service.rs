//! Measure operation service
//!
//! [`MeasureService`] owns the collaborators every operation needs. The
//! operations themselves live in their own modules (`evaluate`, `care_gaps`,
//! `collect`, `submit`, `content`) as further `impl MeasureService` blocks.

use crate::closure::ReferenceResolver;
use crate::config::MeasureConfig;
use crate::error::{MeasureError, MeasureResult};
use crate::narrative::SummaryNarrative;
use crate::organization::{ConfiguredOrganization, FirstOrganization};
use crate::requirements::RelatedArtifactRequirements;
use octofhir_measure_model::{
    DataRequirementsProvider, Measure, MeasureEngine, NarrativeProvider, OrganizationResolver,
    ReferenceFields, ResourceKey, ResourceStore, fhir_r4_reference_model,
};
use std::sync::Arc;

/// Entry point for all measure operations
pub struct MeasureService {
    pub(crate) store: Arc<dyn ResourceStore>,
    pub(crate) engine: Arc<dyn MeasureEngine>,
    pub(crate) organization: Arc<dyn OrganizationResolver>,
    pub(crate) requirements: Arc<dyn DataRequirementsProvider>,
    pub(crate) narrative: Arc<dyn NarrativeProvider>,
    pub(crate) reference_fields: Arc<dyn ReferenceFields>,
    pub(crate) config: MeasureConfig,
}

impl MeasureService {
    pub fn builder(
        store: Arc<dyn ResourceStore>,
        engine: Arc<dyn MeasureEngine>,
    ) -> MeasureServiceBuilder {
        MeasureServiceBuilder::new(store, engine)
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Read a measure by id
    pub async fn read_measure(&self, measure_id: &str) -> MeasureResult<Measure> {
        let key = ResourceKey::new("Measure", measure_id);
        let resource = self
            .store
            .read(&key)
            .await?
            .ok_or_else(|| MeasureError::measure_not_found(measure_id))?;
        Ok(resource.to_typed()?)
    }

    pub fn reference_resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(self.store.as_ref(), self.reference_fields.as_ref())
    }
}

/// Prefix a bare subject id with `Patient/`
pub fn normalize_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.contains('/') {
        subject.to_string()
    } else {
        format!("Patient/{}", subject)
    }
}

/// Builder for [`MeasureService`]
pub struct MeasureServiceBuilder {
    store: Arc<dyn ResourceStore>,
    engine: Arc<dyn MeasureEngine>,
    organization: Option<Arc<dyn OrganizationResolver>>,
    requirements: Option<Arc<dyn DataRequirementsProvider>>,
    narrative: Option<Arc<dyn NarrativeProvider>>,
    reference_fields: Option<Arc<dyn ReferenceFields>>,
    config: MeasureConfig,
}

impl MeasureServiceBuilder {
    pub fn new(store: Arc<dyn ResourceStore>, engine: Arc<dyn MeasureEngine>) -> Self {
        Self {
            store,
            engine,
            organization: None,
            requirements: None,
            narrative: None,
            reference_fields: None,
            config: MeasureConfig::default(),
        }
    }

    pub fn config(mut self, config: MeasureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn organization(mut self, resolver: Arc<dyn OrganizationResolver>) -> Self {
        self.organization = Some(resolver);
        self
    }

    pub fn requirements(mut self, provider: Arc<dyn DataRequirementsProvider>) -> Self {
        self.requirements = Some(provider);
        self
    }

    pub fn narrative(mut self, provider: Arc<dyn NarrativeProvider>) -> Self {
        self.narrative = Some(provider);
        self
    }

    pub fn reference_fields(mut self, fields: Arc<dyn ReferenceFields>) -> Self {
        self.reference_fields = Some(fields);
        self
    }

    /// Build the service, filling unset collaborators with the defaults
    pub fn build(self) -> MeasureResult<MeasureService> {
        let organization = match (self.organization, &self.config.reporting_organization) {
            (Some(resolver), _) => resolver,
            (None, Some(configured)) => Arc::new(ConfiguredOrganization::new(configured)),
            (None, None) => {
                log::warn!(
                    "No reporting organization configured; reports are attributed to the first Organization found"
                );
                Arc::new(FirstOrganization::new(self.store.clone()))
            }
        };

        let reference_fields = match self.reference_fields {
            Some(fields) => fields,
            None => Arc::new(fhir_r4_reference_model()?),
        };

        Ok(MeasureService {
            store: self.store,
            engine: self.engine,
            organization,
            requirements: self
                .requirements
                .unwrap_or_else(|| Arc::new(RelatedArtifactRequirements)),
            narrative: self.narrative.unwrap_or_else(|| Arc::new(SummaryNarrative)),
            reference_fields,
            config: self.config,
        })
    }
}
