//! `$collect-data`

use crate::closure::ClosureSet;
use crate::error::MeasureResult;
use crate::outcome::add_warnings;
use crate::service::{MeasureService, normalize_subject};
use octofhir_measure_model::{
    Bundle, EvaluationTarget, MeasurementPeriod, Parameters, Resource,
};

/// Parameters of `$collect-data`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectDataRequest {
    pub measure_id: String,
    pub period_start: String,
    pub period_end: String,
    pub subject: Option<String>,
    pub last_received_on: Option<String>,
}

impl CollectDataRequest {
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

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl MeasureService {
    /// The report without its groups, plus every resource it was computed from
    ///
    /// Resources come from the closure of each contained Bundle, in discovery
    /// order, each identity once. Seeds that could not be collected are
    /// reported in a trailing `outcome` parameter.
    pub async fn collect_data(&self, request: &CollectDataRequest) -> MeasureResult<Parameters> {
        let measure = self.read_measure(&request.measure_id).await?;
        let period = MeasurementPeriod::parse(&request.period_start, &request.period_end)?;

        let mut report = self
            .run_engine(
                &measure,
                &period,
                EvaluationTarget::Patient {
                    subject: request.subject.as_deref().map(normalize_subject),
                },
                request.last_received_on.as_deref(),
            )
            .await?;
        report.group.clear();

        let resolver = self.reference_resolver();
        let mut closure = ClosureSet::new();
        for contained in report.contained.iter().filter(|r| r.is_type("Bundle")) {
            let bundle: Bundle = contained.to_typed()?;
            for resource in bundle.resources() {
                resolver.add_seed(&mut closure, resource).await?;
            }
        }

        let mut parameters = Parameters::new();
        parameters.add_resource("measurereport", Resource::from_typed(&report)?);
        let collected = closure.len();
        let warnings = closure.warnings().to_vec();
        for resource in closure.into_resources() {
            parameters.add_resource("resource", resource);
        }
        add_warnings(&mut parameters, &warnings)?;

        log::info!(
            "Collected {} resource(s) for {}",
            collected,
            measure.canonical()
        );
        Ok(parameters)
    }
}
