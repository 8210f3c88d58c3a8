//! Evaluation engine replaying pre-computed measure reports
//!
//! Stands in for a clinical-logic engine when reports were produced elsewhere.
//! A request is answered with the first loaded report for the same measure and
//! the same target; its period is set to the requested one.

use async_trait::async_trait;
use octofhir_measure_model::{
    Bundle, EngineError, EvaluationRequest, EvaluationTarget, FhirResource, Measure,
    MeasureEngine, MeasureReport, ModelError, Resource,
};
use parking_lot::RwLock;

/// [`MeasureEngine`] over a fixed set of `MeasureReport`s
#[derive(Debug, Default)]
pub struct ReplayEngine {
    reports: RwLock<Vec<MeasureReport>>,
}

impl ReplayEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reports(reports: impl IntoIterator<Item = MeasureReport>) -> Self {
        Self {
            reports: RwLock::new(reports.into_iter().collect()),
        }
    }

    pub fn add(&self, report: MeasureReport) {
        self.reports.write().push(report);
    }

    /// Load a `MeasureReport`, or every report inside a `Bundle`
    ///
    /// Returns how many reports were added; other resource types add none.
    pub fn load(&self, resource: &Resource) -> Result<usize, ModelError> {
        match resource.resource_type() {
            Some(MeasureReport::RESOURCE_TYPE) => {
                self.add(resource.to_typed()?);
                Ok(1)
            }
            Some(Bundle::RESOURCE_TYPE) => {
                let bundle: Bundle = resource.to_typed()?;
                let mut loaded = 0;
                for entry in bundle.resources() {
                    loaded += self.load(entry)?;
                }
                Ok(loaded)
            }
            _ => Ok(0),
        }
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    fn find(&self, measure: &Measure, target: &EvaluationTarget) -> Option<MeasureReport> {
        self.reports
            .read()
            .iter()
            .find(|report| same_measure(&report.measure, measure) && same_target(report, target))
            .cloned()
    }
}

/// Canonical match ignoring a `|version` suffix, or a `Measure/<id>` tail
fn same_measure(reference: &str, measure: &Measure) -> bool {
    let reference = reference.split('|').next().unwrap_or(reference);
    if reference == measure.canonical() {
        return true;
    }
    match &measure.id {
        Some(id) => {
            let tail = format!("Measure/{}", id);
            reference == tail || reference.ends_with(&format!("/{}", tail))
        }
        None => false,
    }
}

fn same_target(report: &MeasureReport, target: &EvaluationTarget) -> bool {
    let subject = report.subject.as_ref().and_then(|s| s.reference.as_deref());
    match target {
        EvaluationTarget::Patient { subject: wanted } => {
            report.report_type == "individual" && subject == wanted.as_deref()
        }
        EvaluationTarget::SubjectList { .. } => report.report_type == "subject-list",
        EvaluationTarget::Population => report.report_type == "summary",
    }
}

#[async_trait]
impl MeasureEngine for ReplayEngine {
    async fn evaluate(&self, request: &EvaluationRequest<'_>) -> Result<MeasureReport, EngineError> {
        let mut report = self.find(request.measure, &request.target).ok_or_else(|| {
            EngineError::Failed(format!(
                "No pre-computed {} report for {} ({:?})",
                request.target.report_type(),
                request.measure.canonical(),
                request.target
            ))
        })?;
        log::debug!("Replaying report for {}", report.measure);
        report.period = request.period.to_fhir();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measure_model::{MeasurementPeriod, Reference};
    use serde_json::json;

    fn measure(id: &str) -> Measure {
        Measure {
            id: Some(id.into()),
            url: Some(format!("http://example.org/fhir/Measure/{}", id)),
            ..Default::default()
        }
    }

    fn individual(measure: &str, subject: &str) -> MeasureReport {
        MeasureReport {
            report_type: "individual".into(),
            measure: measure.into(),
            subject: Some(Reference::new(subject)),
            ..Default::default()
        }
    }

    #[test]
    fn test_measure_matching() {
        let m = measure("m1");
        assert!(same_measure("http://example.org/fhir/Measure/m1", &m));
        assert!(same_measure("http://example.org/fhir/Measure/m1|1.0.0", &m));
        assert!(same_measure("Measure/m1", &m));
        assert!(same_measure("http://other.org/Measure/m1", &m));
        assert!(!same_measure("Measure/m10", &m));
    }

    #[test]
    fn test_load_bundle() {
        let engine = ReplayEngine::new();
        let bundle = Resource::from_value(json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"resource": {"resourceType": "MeasureReport", "measure": "Measure/m1", "type": "summary"}},
                {"resource": {"resourceType": "Patient", "id": "p1"}}
            ]
        }))
        .unwrap();

        assert_eq!(engine.load(&bundle).unwrap(), 1);
        assert_eq!(engine.len(), 1);
    }

    #[tokio::test]
    async fn test_replays_matching_subject() {
        let engine = ReplayEngine::from_reports([
            individual("Measure/m1", "Patient/p1"),
            individual("Measure/m1", "Patient/p2"),
        ]);
        let m = measure("m1");
        let period = MeasurementPeriod::parse("2021", "2021").unwrap();

        let report = engine
            .evaluate(&EvaluationRequest {
                measure: &m,
                period: &period,
                target: EvaluationTarget::Patient {
                    subject: Some("Patient/p2".into()),
                },
                last_received_on: None,
            })
            .await
            .unwrap();
        assert_eq!(
            report.subject.unwrap().reference.as_deref(),
            Some("Patient/p2")
        );
        assert_eq!(report.period.start.as_deref(), Some("2021-01-01"));

        let missing = engine
            .evaluate(&EvaluationRequest {
                measure: &m,
                period: &period,
                target: EvaluationTarget::Population,
                last_received_on: None,
            })
            .await;
        assert!(matches!(missing, Err(EngineError::Failed(_))));
    }
}
