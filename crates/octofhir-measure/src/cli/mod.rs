//! CLI functionality for the measure tool
//!
//! This module contains all CLI-related functionality including:
//! - Loading resources and pre-computed reports from files
//! - Wiring a measure service over an in-memory store
//! - One module per measure operation
//! - Output formatting

pub mod care_gaps;
pub mod collect;
pub mod content;
pub mod evaluate;
pub mod loader;
pub mod output;
pub mod submit;
pub mod workspace;
