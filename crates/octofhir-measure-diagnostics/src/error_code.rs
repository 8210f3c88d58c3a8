//! Measure error codes following a structured numbering system
//!
//! Error code ranges:
//! - MEA0001-MEA0099: Not found (measure, organization, resource)
//! - MEA0100-MEA0199: Invalid input (subject, report type, scoring, period, configuration)
//! - MEA0200-MEA0299: Reference resolution
//! - MEA0300-MEA0399: Evaluation engine failures
//! - MEA0400-MEA0499: Storage and transaction failures
//! - MEA0500-MEA0599: Warnings about known simplifications

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_not_found(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_invalid_input(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_reference_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_storage_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    pub const fn is_warning(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MEA{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Not found (0001-0099)
    map.insert(1, ErrorInfo::new("Measure not found"));
    map.insert(2, ErrorInfo::new("Reporting organization not found")
        .with_help("Set `reporting_organization` in the measure configuration"));
    map.insert(3, ErrorInfo::new("Resource not found"));

    // Invalid input (0100-0199)
    map.insert(100, ErrorInfo::new("Missing subject")
        .with_help("Provide `subject` or a non-empty comma separated `subjectGroup`"));
    map.insert(101, ErrorInfo::new("Invalid report type")
        .with_help("Expected one of: patient, patient-list, population"));
    map.insert(102, ErrorInfo::new("Invalid measure scoring"));
    map.insert(103, ErrorInfo::new("Invalid measurement period"));
    map.insert(104, ErrorInfo::new("Invalid resource"));
    map.insert(105, ErrorInfo::new("Missing measure report"));
    map.insert(106, ErrorInfo::new("Invalid configuration")
        .with_help("The configuration file must be a JSON object of MeasureConfig members"));

    // Reference resolution (0200-0299)
    map.insert(200, ErrorInfo::new("Unresolved reference"));

    // Evaluation (0300-0399)
    map.insert(300, ErrorInfo::new("Measure evaluation failed"));
    map.insert(301, ErrorInfo::new("Narrative generation failed"));

    // Storage (0400-0499)
    map.insert(400, ErrorInfo::new("Transaction failed")
        .with_help("The bundle was rejected as a whole; resubmit the complete bundle"));
    map.insert(401, ErrorInfo::new("Storage error"));

    // Warnings (0500-0599)
    map.insert(500, ErrorInfo::new("Duplicate numerator population ignored"));
    map.insert(501, ErrorInfo::new("Duplicate denominator population ignored"));
    map.insert(502, ErrorInfo::new("Improvement notation not specified"));
    map.insert(503, ErrorInfo::new("Resource without id skipped"));

    map
});

// Not found
pub const MEA0001: ErrorCode = ErrorCode::new(1);
pub const MEA0002: ErrorCode = ErrorCode::new(2);
pub const MEA0003: ErrorCode = ErrorCode::new(3);

// Invalid input
pub const MEA0100: ErrorCode = ErrorCode::new(100);
pub const MEA0101: ErrorCode = ErrorCode::new(101);
pub const MEA0102: ErrorCode = ErrorCode::new(102);
pub const MEA0103: ErrorCode = ErrorCode::new(103);
pub const MEA0104: ErrorCode = ErrorCode::new(104);
pub const MEA0105: ErrorCode = ErrorCode::new(105);
pub const MEA0106: ErrorCode = ErrorCode::new(106);

// Reference resolution
pub const MEA0200: ErrorCode = ErrorCode::new(200);

// Evaluation
pub const MEA0300: ErrorCode = ErrorCode::new(300);
pub const MEA0301: ErrorCode = ErrorCode::new(301);

// Storage
pub const MEA0400: ErrorCode = ErrorCode::new(400);
pub const MEA0401: ErrorCode = ErrorCode::new(401);

// Warnings
pub const MEA0500: ErrorCode = ErrorCode::new(500);
pub const MEA0501: ErrorCode = ErrorCode::new(501);
pub const MEA0502: ErrorCode = ErrorCode::new(502);
pub const MEA0503: ErrorCode = ErrorCode::new(503);
