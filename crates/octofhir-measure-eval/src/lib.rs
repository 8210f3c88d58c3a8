//! Measure Evaluation
//!
//! This crate implements the measure operations on top of the collaborator
//! traits from `octofhir-measure-model`:
//!
//! - **Scoring**: numerator/denominator extraction, proportion and the
//!   improvement-notation care-gap rule
//! - **Reference closure**: transitive collection of referenced resources,
//!   each identity once
//! - **Care gaps**: per-subject document bundles of gap reports and detected issues
//! - **Submission**: flattening reports and resources into one atomic transaction
//! - **Evaluation**: `$evaluate-measure`, `$collect-data`, `$data-requirements`,
//!   `$refresh-generated-content` and `$get-narrative`
//!
//! # Example
//!
//! ```ignore
//! use octofhir_measure_eval::{CareGapsRequest, MeasureService};
//!
//! let service = MeasureService::builder(store, engine).build()?;
//! let gaps = service
//!     .care_gaps(&CareGapsRequest::new("2021-01-01", "2021-12-31").with_subject("Patient/p1"))
//!     .await?;
//! ```
//!
//! # Architecture
//!
//! [`MeasureService`] holds the storage, engine and the other collaborators.
//! Each operation module adds its methods to it; scoring and submission
//! building are also usable on their own as plain functions and builders.

pub mod care_gaps;
pub mod closure;
pub mod collect;
pub mod config;
pub mod content;
pub mod error;
pub mod evaluate;
pub mod narrative;
pub mod organization;
pub mod outcome;
pub mod requirements;
pub mod scoring;
pub mod service;
pub mod submit;

pub use care_gaps::{CARE_GAP_CODE, CARE_GAP_PARAMETER_PREFIX, CareGapDocument, CareGapsRequest};
pub use closure::{ClosureSet, LIST_RESOURCE_TYPE, ReferenceResolver};
pub use collect::CollectDataRequest;
pub use config::{
    DEQM_DETECTED_ISSUE_CATEGORY, DEQM_INDIVIDUAL_REPORT_PROFILE, MeasureConfig,
    MeasureConfigBuilder, REPORTING_ORGANIZATION_ENV, ScoringPolicy,
};
pub use error::{ErrorKind, MeasureError, MeasureResult};
pub use evaluate::{EvaluateMeasureRequest, PRODUCT_LINE_EXTENSION};
pub use narrative::SummaryNarrative;
pub use organization::{ConfiguredOrganization, FirstOrganization};
pub use outcome::{OUTCOME_PARAMETER, add_warnings, to_outcome, warning_codes};
pub use requirements::RelatedArtifactRequirements;
pub use scoring::{
    GapDecision, ImprovementNotation, MeasureScore, PopulationCounts, ScoringMethod, decide_gap,
    extract_counts, proportion, score_report,
};
pub use service::{MeasureService, MeasureServiceBuilder, normalize_subject};
pub use submit::{SubmissionBuilder, upsert_entry};
