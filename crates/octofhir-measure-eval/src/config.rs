//! Service configuration

use crate::error::{MeasureError, MeasureResult};
use octofhir_measure_model::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the reporting organization
pub const REPORTING_ORGANIZATION_ENV: &str = "MEASURE_REPORTING_ORGANIZATION";

/// Profile tagged onto every individual report in a care-gap document
pub const DEQM_INDIVIDUAL_REPORT_PROFILE: &str =
    "http://hl7.org/fhir/us/davinci-deqm/StructureDefinition/indv-measurereport-deqm";

/// Code system of the `care-gap` detected issue code
pub const DEQM_DETECTED_ISSUE_CATEGORY: &str =
    "http://hl7.org/fhir/us/davinci-deqm/CodeSystem/detectedissue-category";

/// How unrecognized scoring methods are treated when computing a proportion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Unrecognized scoring yields a proportion of 0.0
    #[default]
    Lenient,
    /// Unrecognized scoring with a zero denominator fails with
    /// `InvalidMeasureScoring`
    Strict,
}

/// Configuration for [`MeasureService`](crate::MeasureService)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasureConfig {
    /// Organization reports are attributed to (`Organization/<id>` or a bare id)
    pub reporting_organization: Option<String>,
    /// Maximum number of measures evaluated per care-gap request
    pub measure_page_size: usize,
    pub scoring_policy: ScoringPolicy,
    pub care_gap_profile: String,
    pub detected_issue_category_system: String,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            reporting_organization: None,
            measure_page_size: DEFAULT_PAGE_SIZE,
            scoring_policy: ScoringPolicy::default(),
            care_gap_profile: DEQM_INDIVIDUAL_REPORT_PROFILE.to_string(),
            detected_issue_category_system: DEQM_DETECTED_ISSUE_CATEGORY.to_string(),
        }
    }
}

impl MeasureConfig {
    pub fn builder() -> MeasureConfigBuilder {
        MeasureConfigBuilder::new()
    }

    /// Load from a JSON file; missing members take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> MeasureResult<Self> {
        let path = path.as_ref();
        let invalid = |message: String| MeasureError::InvalidConfig {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Apply `MEASURE_REPORTING_ORGANIZATION` when it is set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(organization) = std::env::var(REPORTING_ORGANIZATION_ENV) {
            if !organization.trim().is_empty() {
                self.reporting_organization = Some(organization.trim().to_string());
            }
        }
        self
    }
}

/// Builder for [`MeasureConfig`]
#[derive(Debug, Default)]
pub struct MeasureConfigBuilder {
    config: MeasureConfig,
}

impl MeasureConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting_organization(mut self, organization: impl Into<String>) -> Self {
        self.config.reporting_organization = Some(organization.into());
        self
    }

    pub fn measure_page_size(mut self, size: usize) -> Self {
        self.config.measure_page_size = size;
        self
    }

    pub fn scoring_policy(mut self, policy: ScoringPolicy) -> Self {
        self.config.scoring_policy = policy;
        self
    }

    pub fn care_gap_profile(mut self, profile: impl Into<String>) -> Self {
        self.config.care_gap_profile = profile.into();
        self
    }

    pub fn detected_issue_category_system(mut self, system: impl Into<String>) -> Self {
        self.config.detected_issue_category_system = system.into();
        self
    }

    pub fn build(self) -> MeasureConfig {
        self.config
    }
}
