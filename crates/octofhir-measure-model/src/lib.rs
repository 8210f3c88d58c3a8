//! FHIR resource model for measure evaluation
//!
//! This crate provides:
//! - A JSON-backed [`Resource`] plus typed FHIR R4 resources used by measure operations
//! - Reference parsing and the per-type reference field model
//! - Collaborator traits (storage, evaluation engine, organization, requirements, narrative)
//! - An in-memory [`InMemoryStore`] implementing [`ResourceStore`]

pub mod fhir;
pub mod period;
pub mod provider;
pub mod reference_model;
pub mod resource;
pub mod store;

pub use fhir::*;
pub use period::*;
pub use provider::*;
pub use reference_model::*;
pub use resource::*;
pub use store::*;
