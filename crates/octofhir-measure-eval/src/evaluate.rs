//! `$evaluate-measure`

use crate::error::MeasureResult;
use crate::service::{MeasureService, normalize_subject};
use octofhir_measure_model::{
    EvaluationRequest, EvaluationTarget, Extension, Measure, MeasureReport, MeasurementPeriod,
    ReportType,
};

/// Extension carrying the product line a report was evaluated for
pub const PRODUCT_LINE_EXTENSION: &str =
    "http://hl7.org/fhir/us/cqframework/cqfmeasures/StructureDefinition/cqfm-productLine";

/// Parameters of `$evaluate-measure`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluateMeasureRequest {
    pub measure_id: String,
    pub period_start: String,
    pub period_end: String,
    /// `patient`, `patient-list` or `population`; `patient` when absent
    pub report_type: Option<String>,
    pub subject: Option<String>,
    pub practitioner: Option<String>,
    pub product_line: Option<String>,
    pub last_received_on: Option<String>,
}

impl EvaluateMeasureRequest {
    pub fn new(
        measure_id: impl Into<String>,
        period_start: impl Into<String>,
        period_end: impl Into<String>,
    ) -> Self {
        Self {
            measure_id: measure_id.into(),
            period_start: period_start.into(),
            period_end: period_end.into(),
            ..Default::default()
        }
    }

    pub fn with_report_type(mut self, report_type: impl Into<String>) -> Self {
        self.report_type = Some(report_type.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_practitioner(mut self, practitioner: impl Into<String>) -> Self {
        self.practitioner = Some(practitioner.into());
        self
    }

    pub fn with_product_line(mut self, product_line: impl Into<String>) -> Self {
        self.product_line = Some(product_line.into());
        self
    }

    pub fn with_last_received_on(mut self, last_received_on: impl Into<String>) -> Self {
        self.last_received_on = Some(last_received_on.into());
        self
    }
}

impl MeasureService {
    /// Evaluate one measure in the requested report shape
    pub async fn evaluate_measure(
        &self,
        request: &EvaluateMeasureRequest,
    ) -> MeasureResult<MeasureReport> {
        let measure = self.read_measure(&request.measure_id).await?;

        let report_type = match request.report_type.as_deref() {
            Some(value) => value.parse::<ReportType>()?,
            None => ReportType::default(),
        };
        let period = MeasurementPeriod::parse(&request.period_start, &request.period_end)?;

        let target = match report_type {
            ReportType::Patient => EvaluationTarget::Patient {
                subject: request.subject.as_deref().map(normalize_subject),
            },
            ReportType::PatientList => EvaluationTarget::SubjectList {
                practitioner: request.practitioner.clone(),
            },
            ReportType::Population => EvaluationTarget::Population,
        };

        let mut report = self
            .run_engine(&measure, &period, target, request.last_received_on.as_deref())
            .await?;

        if let Some(product_line) = &request.product_line {
            report
                .extension
                .push(Extension::string(PRODUCT_LINE_EXTENSION, product_line.clone()));
        }

        log::info!(
            "Evaluated {} ({}) for {}",
            measure.canonical(),
            report_type,
            period
        );
        Ok(report)
    }

    /// Single call into the evaluation engine
    pub(crate) async fn run_engine(
        &self,
        measure: &Measure,
        period: &MeasurementPeriod,
        target: EvaluationTarget,
        last_received_on: Option<&str>,
    ) -> MeasureResult<MeasureReport> {
        log::debug!("Evaluating {} for {:?}", measure.canonical(), target);
        let request = EvaluationRequest {
            measure,
            period,
            target,
            last_received_on,
        };
        Ok(self.engine.evaluate(&request).await?)
    }
}
