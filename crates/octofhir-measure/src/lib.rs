//! Clinical quality measure evaluation for Rust
//!
//! This crate bundles the measure crates behind one dependency:
//! - Scoring of evaluated measure reports and improvement-notation care gaps
//! - Transitive reference closure over clinical resources
//! - Care-gap document bundles per patient
//! - Transaction bundles for data submission
//! - `$evaluate-measure`, `$collect-data`, `$data-requirements` and
//!   `$refresh-generated-content`
//!
//! # Example
//!
//! ```ignore
//! use octofhir_measure::{CareGapsRequest, InMemoryStore, MeasureService};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let service = MeasureService::builder(store, engine).build()?;
//! let gaps = service
//!     .care_gaps(&CareGapsRequest::new("2021-01-01", "2021-12-31").with_subject("p1"))
//!     .await?;
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_measure_diagnostics as diagnostics;
pub use octofhir_measure_eval as eval;
pub use octofhir_measure_model as model;

// Convenience re-exports
pub use octofhir_measure_diagnostics::{Diagnostic, ErrorCode, Severity};
pub use octofhir_measure_eval::{
    CareGapsRequest, CollectDataRequest, EvaluateMeasureRequest, MeasureConfig, MeasureError,
    MeasureResult, MeasureService,
};
pub use octofhir_measure_model::{InMemoryStore, MeasureEngine, Resource, ResourceStore};

pub mod replay;

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
