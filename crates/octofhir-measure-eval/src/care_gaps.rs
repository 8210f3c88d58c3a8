//! `$care-gaps`
//!
//! Evaluates every matching measure for a subject and packages the reports
//! that show a care gap into a document bundle: the composition first, then
//! the reports, then the detected issues, all in measure search order.
//!
//! Reports without a gap are evaluated but left out of the document. Scoring
//! warnings of every subject are returned in a trailing `outcome` parameter.

use crate::error::{MeasureError, MeasureResult};
use crate::outcome::add_warnings;
use crate::scoring::score_report;
use crate::service::{MeasureService, normalize_subject};
use chrono::Utc;
use octofhir_measure_diagnostics::Diagnostic;
use octofhir_measure_model::{
    Bundle, BundleType, CodeableConcept, Coding, Composition, CompositionSection, DetectedIssue,
    DetectedIssueEvidence, EvaluationTarget, Measure, MeasureReport, MeasurementPeriod, Meta,
    Parameters, Reference, Resource, SearchParams,
};

/// Prefix of each subject's parameter name in the care-gaps result
pub const CARE_GAP_PARAMETER_PREFIX: &str = "Gaps in Care Report - ";

pub const CARE_GAP_CODE: &str = "care-gap";

pub const CARE_GAP_REPORT_TITLE: &str = "Care Gap Report";

/// Parameters of `$care-gaps`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareGapsRequest {
    pub period_start: String,
    pub period_end: String,
    pub subject: Option<String>,
    /// Comma-separated subjects; takes precedence over `subject`
    pub subject_group: Option<String>,
    /// Measure topic token, `code` or `system|code`
    pub topic: Option<String>,
}

impl CareGapsRequest {
    pub fn new(period_start: impl Into<String>, period_end: impl Into<String>) -> Self {
        Self {
            period_start: period_start.into(),
            period_end: period_end.into(),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_subject_group(mut self, group: impl Into<String>) -> Self {
        self.subject_group = Some(group.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Subjects to report on, in request order
    fn subjects(&self) -> MeasureResult<Vec<String>> {
        match self.subject_group.as_deref().filter(|g| !g.is_empty()) {
            Some(group) => group
                .split(',')
                .map(|subject| match subject.trim() {
                    "" => Err(MeasureError::MissingSubject),
                    subject => Ok(subject.to_string()),
                })
                .collect(),
            None => match self.subject.as_deref().map(str::trim) {
                Some(subject) if !subject.is_empty() => Ok(vec![subject.to_string()]),
                _ => Err(MeasureError::MissingSubject),
            },
        }
    }
}

/// Care-gap document of one subject and the warnings raised while scoring
#[derive(Debug, Clone, PartialEq)]
pub struct CareGapDocument {
    pub document: Bundle,
    pub warnings: Vec<Diagnostic>,
}

impl MeasureService {
    /// One named document bundle per requested subject
    pub async fn care_gaps(&self, request: &CareGapsRequest) -> MeasureResult<Parameters> {
        let subjects = request.subjects()?;
        let period = MeasurementPeriod::parse(&request.period_start, &request.period_end)?;
        let topic = request.topic.as_deref().filter(|t| !t.is_empty());

        let mut result = Parameters::new();
        let mut warnings = Vec::new();
        for subject in &subjects {
            let care_gap = self.patient_care_gap(&period, subject, topic).await?;
            result.add_resource(
                format!("{}{}", CARE_GAP_PARAMETER_PREFIX, subject),
                Resource::from_typed(&care_gap.document)?,
            );
            warnings.extend(care_gap.warnings);
        }
        add_warnings(&mut result, &warnings)?;

        log::info!("Built care-gap reports for {} subject(s)", subjects.len());
        Ok(result)
    }

    /// Care-gap document bundle for a single subject
    pub async fn patient_care_gap(
        &self,
        period: &MeasurementPeriod,
        subject: &str,
        topic: Option<&str>,
    ) -> MeasureResult<CareGapDocument> {
        if subject.trim().is_empty() {
            return Err(MeasureError::MissingSubject);
        }
        let subject = normalize_subject(subject);

        let reporter = self
            .organization
            .resolve()
            .await?
            .ok_or(MeasureError::OrganizationNotFound)?;

        let mut params = SearchParams::new().with_count(self.config.measure_page_size);
        if let Some(topic) = topic {
            params = params.with("topic", topic);
        }
        let measures = self.store.search("Measure", &params).await?;

        let mut composition = Composition {
            status: "final".into(),
            subject: Some(Reference::new(subject.clone())),
            date: Some(Utc::now().to_rfc3339()),
            author: vec![reporter.clone()],
            title: Some(CARE_GAP_REPORT_TITLE.into()),
            ..Default::default()
        };
        let mut reports = Vec::new();
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        for resource in &measures {
            let measure: Measure = resource.to_typed()?;
            let mut report = self
                .run_engine(
                    &measure,
                    period,
                    EvaluationTarget::Patient {
                        subject: Some(subject.clone()),
                    },
                    None,
                )
                .await?;
            self.stamp_report(&mut report, &measure, &reporter);
            let report_id = report.id.clone().unwrap_or_default();

            let mut section = CompositionSection {
                title: measure.title.clone(),
                focus: Some(Reference::new(format!("MeasureReport/{}", report_id))),
                entry: Vec::new(),
            };

            if report.group.is_empty() || measure.scoring.is_none() {
                continue;
            }
            let score = score_report(&measure, &report, self.config.scoring_policy)?;
            log::debug!(
                "{} for {}: {}/{} = {} ({})",
                measure.canonical(),
                subject,
                score.numerator,
                score.denominator,
                score.proportion,
                score.notation
            );
            let is_gap = score.is_gap();
            warnings.extend(score.warnings);
            if !is_gap {
                continue;
            }

            let issue = self.detected_issue(&subject, &report_id);
            section.entry.push(Reference::new(format!(
                "DetectedIssue/{}",
                issue.id.as_deref().unwrap_or_default()
            )));
            composition.section.push(section);
            reports.push(report);
            issues.push(issue);
        }

        let mut document = Bundle::new(BundleType::Document);
        document.push_resource(Resource::from_typed(&composition)?);
        for report in &reports {
            document.push_resource(Resource::from_typed(report)?);
        }
        for issue in &issues {
            document.push_resource(Resource::from_typed(issue)?);
        }

        log::debug!(
            "{}: {} measure(s) evaluated, {} gap(s)",
            subject,
            measures.len(),
            issues.len()
        );
        Ok(CareGapDocument { document, warnings })
    }

    /// Identity, date, notation, reporter and profile of a care-gap report
    fn stamp_report(&self, report: &mut MeasureReport, measure: &Measure, reporter: &Reference) {
        report.id = Some(uuid::Uuid::new_v4().to_string());
        report.date = Some(Utc::now().to_rfc3339());
        report.improvement_notation = measure.improvement_notation.clone();
        report.reporter = Some(reporter.clone());
        report.meta = Some(Meta::with_profile(self.config.care_gap_profile.clone()));
    }

    fn detected_issue(&self, subject: &str, report_id: &str) -> DetectedIssue {
        DetectedIssue {
            id: Some(uuid::Uuid::new_v4().to_string()),
            status: "final".into(),
            code: Some(CodeableConcept::from_coding(Coding::new(
                self.config.detected_issue_category_system.clone(),
                CARE_GAP_CODE,
            ))),
            patient: Some(Reference::new(subject)),
            evidence: vec![DetectedIssueEvidence {
                detail: vec![Reference::new(format!("MeasureReport/{}", report_id))],
            }],
        }
    }
}
