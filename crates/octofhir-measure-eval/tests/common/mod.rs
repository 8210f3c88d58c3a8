//! Common test utilities for measure operation tests
//!
//! - Mock evaluation engine and narrative provider
//! - FHIR resource builders for measures and clinical data
//! - A service wired to an in-memory store

#![allow(dead_code)]

pub mod fhir_data;
pub mod mocks;

pub use fhir_data::*;
pub use mocks::*;

use octofhir_measure_eval::{MeasureConfig, MeasureService};
use octofhir_measure_model::InMemoryStore;
use std::sync::Arc;

pub const ORGANIZATION: &str = "org-1";

/// Service over `store` and `engine`, reporting as [`ORGANIZATION`]
pub fn service(store: &Arc<InMemoryStore>, engine: &Arc<MockEngine>) -> MeasureService {
    MeasureService::builder(store.clone(), engine.clone())
        .config(
            MeasureConfig::builder()
                .reporting_organization(ORGANIZATION)
                .build(),
        )
        .build()
        .unwrap()
}
