//! FHIR R4 reference model
//!
//! Embedded reference model for the R4 resource types that show up as
//! evaluation byproducts.

use crate::reference_model::ReferenceModel;
use crate::resource::ModelError;
use once_cell::sync::Lazy;

/// FHIR R4 reference model JSON (embedded at compile time)
pub const FHIR_R4_REFERENCE_MODEL_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/fhir-r4-references.json"
));

/// Lazily parsed FHIR R4 reference model
pub static FHIR_R4_REFERENCE_MODEL: Lazy<Result<ReferenceModel, ModelError>> =
    Lazy::new(|| ReferenceModel::from_json(FHIR_R4_REFERENCE_MODEL_JSON));

/// Get the FHIR R4 reference model
pub fn fhir_r4_reference_model() -> Result<ReferenceModel, ModelError> {
    (*FHIR_R4_REFERENCE_MODEL).clone()
}
