//! `$submit-data`
//!
//! Flattens a report plus caller-supplied resources and bundles into a single
//! transaction bundle, then hands it to storage to apply atomically. Nothing
//! is retried: a failed transaction has to be resubmitted as a whole.

use crate::error::{MeasureError, MeasureResult};
use crate::service::MeasureService;
use octofhir_measure_model::{
    Bundle, BundleEntry, BundleRequest, BundleType, HttpVerb, MeasureReport, Resource,
};

/// Upsert entry for a resource: `PUT Type/id` when it has an id, else `POST Type`
pub fn upsert_entry(resource: Resource) -> MeasureResult<BundleEntry> {
    let resource_type = resource
        .resource_type()
        .ok_or_else(|| MeasureError::invalid_resource("resource has no resourceType"))?
        .to_string();
    let request = match resource.id() {
        Some(id) => BundleRequest::new(HttpVerb::Put, format!("{}/{}", resource_type, id)),
        None => BundleRequest::new(HttpVerb::Post, resource_type),
    };
    Ok(BundleEntry {
        resource: Some(resource),
        request: Some(request),
        ..Default::default()
    })
}

/// Builds a transaction bundle, preserving the order entries are added in
#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    bundle: Bundle,
}

impl SubmissionBuilder {
    /// Start a transaction whose first entry is the report
    pub fn new(report: &MeasureReport) -> MeasureResult<Self> {
        let mut bundle = Bundle::new(BundleType::Transaction);
        bundle.entry.push(upsert_entry(Resource::from_typed(report)?)?);
        Ok(Self { bundle })
    }

    /// Add a plain resource, or flatten a bundle into its entries
    pub fn add(&mut self, resource: Resource) -> MeasureResult<&mut Self> {
        if !resource.is_type("Bundle") {
            self.bundle.entry.push(upsert_entry(resource)?);
            return Ok(self);
        }

        let nested: Bundle = resource.to_typed()?;
        if nested.is_type(BundleType::Transaction) {
            self.bundle.entry.extend(nested.entry);
        } else {
            for entry in nested.entry {
                if let Some(resource) = entry.resource {
                    self.bundle.entry.push(upsert_entry(resource)?);
                }
            }
        }
        Ok(self)
    }

    pub fn build(self) -> Bundle {
        self.bundle
    }
}

impl MeasureService {
    /// Submit a report and its supporting resources in one transaction
    ///
    /// Returns the transaction-response bundle from storage.
    pub async fn submit_data(
        &self,
        measure_id: &str,
        report: Option<&MeasureReport>,
        resources: Vec<Resource>,
    ) -> MeasureResult<Bundle> {
        let report = report.ok_or(MeasureError::EmptyReport)?;

        let mut builder = SubmissionBuilder::new(report)?;
        for resource in resources {
            builder.add(resource)?;
        }
        let transaction = builder.build();
        let entries = transaction.entry.len();

        let response = self.store.apply_transaction(transaction).await?;
        log::info!(
            "Submitted {} entries for Measure/{}",
            entries,
            measure_id
        );
        Ok(response)
    }
}
