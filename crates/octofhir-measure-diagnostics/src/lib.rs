//! Measure diagnostics
//!
//! This crate provides the error code registry and diagnostic records shared by
//! the measure evaluation crates. Error types themselves live next to the code
//! that raises them; every one of them maps onto an [`ErrorCode`] from here.

mod diagnostic;
mod error_code;

pub use diagnostic::*;
pub use error_code::*;
