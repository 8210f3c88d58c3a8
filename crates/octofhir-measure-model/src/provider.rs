//! Collaborator traits for measure operations
//!
//! Storage, the clinical-logic engine, organization resolution, data
//! requirements and narrative generation are external to measure evaluation.
//! This module defines the boundary each of them is consumed through.

use crate::fhir::{Bundle, Library, Measure, MeasureReport, Narrative, Reference};
use crate::period::MeasurementPeriod;
use crate::resource::{Resource, ResourceKey};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Default page size for searches issued by measure operations
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Search criteria for a resource search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// (parameter name, value) pairs, all of which must match
    pub criteria: Vec<(String, String)>,
    /// Maximum number of results returned
    pub count: usize,
}

impl SearchParams {
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            count: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.criteria.push((name.into(), value.into()));
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn by_url(url: impl Into<String>) -> Self {
        Self::new().with("url", url)
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for clinical resource storage
///
/// `apply_transaction` must be all-or-nothing: either every entry of the
/// bundle is applied or none is.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Read a resource by type and id, `None` when absent
    async fn read(&self, key: &ResourceKey) -> Result<Option<Resource>, StoreError>;

    /// Search resources of a type, in storage order
    async fn search(
        &self,
        resource_type: &str,
        params: &SearchParams,
    ) -> Result<Vec<Resource>, StoreError>;

    /// Create or replace a resource that carries an id
    async fn update(&self, resource: Resource) -> Result<Resource, StoreError>;

    /// Atomically apply a transaction bundle, returning the transaction-response bundle
    async fn apply_transaction(&self, bundle: Bundle) -> Result<Bundle, StoreError>;
}

/// Storage error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported search parameter '{parameter}' for {resource_type}")]
    UnsupportedSearchParameter {
        resource_type: String,
        parameter: String,
    },

    #[error("Transaction rejected at entry {index}: {message}")]
    TransactionRejected { index: usize, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Report shape requested from the evaluation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportType {
    #[default]
    Patient,
    PatientList,
    Population,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Patient => "patient",
            ReportType::PatientList => "patient-list",
            ReportType::Population => "population",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid report type: {0}")]
pub struct UnknownReportType(pub String);

impl FromStr for ReportType {
    type Err = UnknownReportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(ReportType::Patient),
            "patient-list" => Ok(ReportType::PatientList),
            "population" => Ok(ReportType::Population),
            other => Err(UnknownReportType(other.to_string())),
        }
    }
}

/// Who a measure is evaluated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationTarget {
    /// A single subject (`Patient/<id>`)
    Patient { subject: Option<String> },
    /// The subjects attributed to a practitioner
    SubjectList { practitioner: Option<String> },
    /// The whole population
    Population,
}

impl EvaluationTarget {
    pub fn report_type(&self) -> ReportType {
        match self {
            EvaluationTarget::Patient { .. } => ReportType::Patient,
            EvaluationTarget::SubjectList { .. } => ReportType::PatientList,
            EvaluationTarget::Population => ReportType::Population,
        }
    }
}

/// A single evaluation call into the clinical-logic engine
#[derive(Debug, Clone)]
pub struct EvaluationRequest<'a> {
    pub measure: &'a Measure,
    pub period: &'a MeasurementPeriod,
    pub target: EvaluationTarget,
    pub last_received_on: Option<&'a str>,
}

/// Trait for the external clinical-logic engine that runs population criteria
#[async_trait]
pub trait MeasureEngine: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<MeasureReport, EngineError>;
}

/// Evaluation engine error, treated opaquely by measure operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Evaluation failed: {0}")]
    Failed(String),
}

/// Trait resolving the organization a report is attributed to
#[async_trait]
pub trait OrganizationResolver: Send + Sync {
    /// Reference to the reporting organization, `None` when there is none
    async fn resolve(&self) -> Result<Option<Reference>, StoreError>;
}

/// Trait computing the data requirements of a measure
#[async_trait]
pub trait DataRequirementsProvider: Send + Sync {
    async fn data_requirements(
        &self,
        measure: &Measure,
        period: Option<&MeasurementPeriod>,
    ) -> Result<Library, EngineError>;
}

/// Trait generating human-readable narrative for a measure
pub trait NarrativeProvider: Send + Sync {
    fn narrative(&self, measure: &Measure) -> Result<Narrative, NarrativeError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Narrative generation failed: {0}")]
pub struct NarrativeError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_from_str() {
        assert_eq!("patient".parse::<ReportType>(), Ok(ReportType::Patient));
        assert_eq!("patient-list".parse::<ReportType>(), Ok(ReportType::PatientList));
        assert_eq!("population".parse::<ReportType>(), Ok(ReportType::Population));
        assert_eq!(
            "summary".parse::<ReportType>(),
            Err(UnknownReportType("summary".into()))
        );
        assert_eq!(ReportType::default(), ReportType::Patient);
    }

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new().with("topic", "diabetes").with_count(10);
        assert_eq!(params.criteria, vec![("topic".to_string(), "diabetes".to_string())]);
        assert_eq!(params.count, 10);
        assert_eq!(SearchParams::default().count, DEFAULT_PAGE_SIZE);
    }
}
