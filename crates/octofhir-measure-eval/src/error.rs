//! Errors surfaced by measure operations

use octofhir_measure_diagnostics::{
    Diagnostic, ErrorCode, MEA0001, MEA0002, MEA0003, MEA0100, MEA0101, MEA0102, MEA0103, MEA0104,
    MEA0105, MEA0106, MEA0200, MEA0300, MEA0301, MEA0400, MEA0401,
};
use octofhir_measure_model::{
    EngineError, ModelError, NarrativeError, PeriodError, ResourceKey, StoreError,
    UnknownReportType,
};
use thiserror::Error;

/// Result type for measure operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Error family, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    UnresolvedReference,
    EvaluationFailed,
    TransactionFailed,
}

/// Errors that can occur during measure operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasureError {
    #[error("Could not find Measure/{id}")]
    MeasureNotFound { id: String },

    #[error("No reporting organization found")]
    OrganizationNotFound,

    #[error("Could not find {key}")]
    ResourceNotFound { key: ResourceKey },

    #[error("Subject is required")]
    MissingSubject,

    #[error("Invalid report type: {value}")]
    InvalidReportType { value: String },

    /// Scoring method present but not recognized, under the strict scoring policy
    #[error("Invalid measure scoring '{scoring}' for {measure}")]
    InvalidMeasureScoring { measure: String, scoring: String },

    #[error("Invalid measurement period: {message}")]
    InvalidPeriod { message: String },

    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    #[error("A MeasureReport is required")]
    EmptyReport,

    #[error("Invalid configuration {path}: {message}")]
    InvalidConfig { path: String, message: String },

    /// Closure resolution hit a reference that storage cannot resolve
    #[error("Unresolved reference to {key}")]
    UnresolvedReference { key: ResourceKey },

    #[error("Evaluation failed: {message}")]
    EvaluationFailed { message: String },

    #[error("Transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Narrative generation failed: {message}")]
    Narrative { message: String },
}

impl MeasureError {
    pub fn measure_not_found(id: impl Into<String>) -> Self {
        Self::MeasureNotFound { id: id.into() }
    }

    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    pub fn invalid_scoring(measure: impl Into<String>, scoring: impl Into<String>) -> Self {
        Self::InvalidMeasureScoring {
            measure: measure.into(),
            scoring: scoring.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MeasureNotFound { .. }
            | Self::OrganizationNotFound
            | Self::ResourceNotFound { .. } => ErrorKind::NotFound,
            Self::MissingSubject
            | Self::InvalidReportType { .. }
            | Self::InvalidMeasureScoring { .. }
            | Self::InvalidPeriod { .. }
            | Self::InvalidResource { .. }
            | Self::EmptyReport
            | Self::InvalidConfig { .. } => ErrorKind::InvalidInput,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Self::EvaluationFailed { .. } | Self::Narrative { .. } => ErrorKind::EvaluationFailed,
            Self::TransactionFailed { .. } | Self::Storage { .. } => ErrorKind::TransactionFailed,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MeasureNotFound { .. } => MEA0001,
            Self::OrganizationNotFound => MEA0002,
            Self::ResourceNotFound { .. } => MEA0003,
            Self::MissingSubject => MEA0100,
            Self::InvalidReportType { .. } => MEA0101,
            Self::InvalidMeasureScoring { .. } => MEA0102,
            Self::InvalidPeriod { .. } => MEA0103,
            Self::InvalidResource { .. } => MEA0104,
            Self::EmptyReport => MEA0105,
            Self::InvalidConfig { .. } => MEA0106,
            Self::UnresolvedReference { .. } => MEA0200,
            Self::EvaluationFailed { .. } => MEA0300,
            Self::Narrative { .. } => MEA0301,
            Self::TransactionFailed { .. } => MEA0400,
            Self::Storage { .. } => MEA0401,
        }
    }

    /// Convert to a diagnostic, attaching the resource the error concerns
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.code(), self.to_string());
        match self {
            Self::MeasureNotFound { id } => diagnostic.with_resource(format!("Measure/{}", id)),
            Self::ResourceNotFound { key } | Self::UnresolvedReference { key } => {
                diagnostic.with_resource(key.to_string())
            }
            Self::InvalidMeasureScoring { measure, .. } => diagnostic.with_resource(measure.clone()),
            Self::InvalidConfig { path, .. } => diagnostic.with_resource(path.clone()),
            _ => diagnostic,
        }
    }
}

impl From<EngineError> for MeasureError {
    fn from(err: EngineError) -> Self {
        Self::EvaluationFailed {
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for MeasureError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TransactionRejected { .. } | StoreError::Conflict(_) => {
                Self::TransactionFailed {
                    message: err.to_string(),
                }
            }
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

impl From<ModelError> for MeasureError {
    fn from(err: ModelError) -> Self {
        Self::invalid_resource(err.to_string())
    }
}

impl From<PeriodError> for MeasureError {
    fn from(err: PeriodError) -> Self {
        Self::InvalidPeriod {
            message: err.to_string(),
        }
    }
}

impl From<UnknownReportType> for MeasureError {
    fn from(err: UnknownReportType) -> Self {
        Self::InvalidReportType { value: err.0 }
    }
}

impl From<NarrativeError> for MeasureError {
    fn from(err: NarrativeError) -> Self {
        Self::Narrative { message: err.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_error_families() {
        assert_eq!(MeasureError::measure_not_found("m1").kind(), ErrorKind::NotFound);
        assert_eq!(MeasureError::MissingSubject.kind(), ErrorKind::InvalidInput);
        assert_eq!(MeasureError::EmptyReport.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            MeasureError::UnresolvedReference {
                key: ResourceKey::new("Patient", "p1")
            }
            .kind(),
            ErrorKind::UnresolvedReference
        );
    }

    #[test]
    fn test_codes_match_diagnostic_ranges() {
        assert!(MeasureError::OrganizationNotFound.code().is_not_found());
        assert!(MeasureError::MissingSubject.code().is_invalid_input());
        assert!(
            MeasureError::UnresolvedReference {
                key: ResourceKey::new("Patient", "p1")
            }
            .code()
            .is_reference_error()
        );
    }

    #[test]
    fn test_engine_errors_become_evaluation_failed() {
        let err: MeasureError = EngineError::LibraryNotFound("Lib".into()).into();
        assert_eq!(err.kind(), ErrorKind::EvaluationFailed);
    }

    #[test]
    fn test_transaction_rejection_becomes_transaction_failed() {
        let err: MeasureError = StoreError::TransactionRejected {
            index: 2,
            message: "conflict".into(),
        }
        .into();
        assert!(matches!(err, MeasureError::TransactionFailed { .. }));
    }

    #[test]
    fn test_to_diagnostic_names_resource() {
        let diagnostic = MeasureError::measure_not_found("m1").to_diagnostic();
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.resource.as_deref(), Some("Measure/m1"));
        assert_eq!(diagnostic.message, "Could not find Measure/m1");
    }
}
