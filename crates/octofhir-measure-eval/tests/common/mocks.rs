//! Mock implementations for testing
//!
//! Provides a configurable evaluation engine standing in for the clinical
//! logic engine, and a narrative provider that always fails.

use async_trait::async_trait;
use octofhir_measure_model::{
    Bundle, CodeableConcept, Coding, EngineError, EvaluationRequest, EvaluationTarget,
    GroupPopulation, Measure, MeasureEngine, MeasureReport, MeasureReportGroup, Narrative,
    NarrativeError, NarrativeProvider, Reference, ReportType, Resource,
};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCall {
    pub measure: String,
    pub report_type: ReportType,
    pub subject: Option<String>,
    pub last_received_on: Option<String>,
}

/// Mock engine with population counts keyed by measure id and subject
///
/// Subjects are matched after normalization (`Patient/<id>`). Unconfigured
/// combinations produce a report without groups.
#[derive(Default)]
pub struct MockEngine {
    counts: RwLock<HashMap<(String, String), Vec<(String, i64)>>>,
    evaluated_resources: RwLock<HashMap<String, Bundle>>,
    failing: RwLock<Vec<String>>,
    calls: RwLock<Vec<EngineCall>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure numerator and denominator for a measure and subject
    pub fn set_score(&self, measure_id: &str, subject: &str, numerator: i64, denominator: i64) {
        self.set_populations(
            measure_id,
            subject,
            &[("numerator", numerator), ("denominator", denominator)],
        );
    }

    /// Configure arbitrary population counts, in one group
    pub fn set_populations(&self, measure_id: &str, subject: &str, populations: &[(&str, i64)]) {
        self.counts.write().insert(
            (measure_id.to_string(), subject.to_string()),
            populations
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
        );
    }

    /// Contain a bundle of evaluated resources in every report for a measure
    pub fn set_evaluated_resources(&self, measure_id: &str, bundle: Bundle) {
        self.evaluated_resources
            .write()
            .insert(measure_id.to_string(), bundle);
    }

    /// Make evaluation of a measure fail
    pub fn fail_on(&self, measure_id: &str) {
        self.failing.write().push(measure_id.to_string());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.read().clone()
    }
}

#[async_trait]
impl MeasureEngine for MockEngine {
    async fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<MeasureReport, EngineError> {
        let measure_id = request.measure.id.clone().unwrap_or_default();
        let subject = match &request.target {
            EvaluationTarget::Patient { subject } => subject.clone(),
            EvaluationTarget::SubjectList { practitioner } => practitioner.clone(),
            EvaluationTarget::Population => None,
        };

        self.calls.write().push(EngineCall {
            measure: measure_id.clone(),
            report_type: request.target.report_type(),
            subject: subject.clone(),
            last_received_on: request.last_received_on.map(String::from),
        });

        if self.failing.read().contains(&measure_id) {
            return Err(EngineError::Failed(format!("cannot evaluate {}", measure_id)));
        }

        let populations = subject
            .as_ref()
            .and_then(|s| self.counts.read().get(&(measure_id.clone(), s.clone())).cloned());

        let report_type = match request.target.report_type() {
            ReportType::Patient => "individual",
            ReportType::PatientList => "subject-list",
            ReportType::Population => "summary",
        };

        let mut report = MeasureReport {
            status: "complete".into(),
            report_type: report_type.into(),
            measure: request.measure.canonical(),
            subject: subject.map(Reference::new),
            period: request.period.to_fhir(),
            group: populations
                .map(|populations| {
                    vec![MeasureReportGroup {
                        population: populations
                            .into_iter()
                            .map(|(code, count)| {
                                GroupPopulation::new(
                                    CodeableConcept::from_coding(Coding::new(
                                        "http://terminology.hl7.org/CodeSystem/measure-population",
                                        code,
                                    )),
                                    count,
                                )
                            })
                            .collect(),
                        ..Default::default()
                    }]
                })
                .unwrap_or_default(),
            ..Default::default()
        };

        if let Some(bundle) = self.evaluated_resources.read().get(&measure_id) {
            let contained = Resource::from_typed(bundle)
                .map_err(|e| EngineError::Failed(e.to_string()))?;
            report.contained.push(contained);
        }

        Ok(report)
    }
}

/// Narrative provider that always fails
pub struct FailingNarrative;

impl NarrativeProvider for FailingNarrative {
    fn narrative(&self, _measure: &Measure) -> Result<Narrative, NarrativeError> {
        Err(NarrativeError("template missing".into()))
    }
}
