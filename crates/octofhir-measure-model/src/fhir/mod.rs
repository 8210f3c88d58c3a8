//! Typed FHIR R4 resources used by measure operations
//!
//! Only the members the measure operations read or write are modelled.
//! Types that carry caller or engine data keep every other member in a
//! flattened `extra` map, so passing through the typed form loses nothing.

pub mod bundle;
pub mod datatypes;
pub mod document;
pub mod measure;
pub mod r4;

pub use bundle::*;
pub use datatypes::*;
pub use document::*;
pub use measure::*;
pub use r4::*;
