//! Measure scoring and care-gap decision
//!
//! Pure functions over a [`Measure`] and its evaluated [`MeasureReport`]. The
//! numerator and denominator are taken from the first matching population
//! across all groups; later duplicates are reported as warnings and ignored.

use crate::config::ScoringPolicy;
use crate::error::{MeasureError, MeasureResult};
use octofhir_measure_diagnostics::{Diagnostic, MEA0500, MEA0501, MEA0502};
use octofhir_measure_model::{CodeableConcept, Measure, MeasureReport};
use std::fmt;

pub const NUMERATOR: &str = "numerator";
pub const DENOMINATOR: &str = "denominator";

/// Measure scoring method (`Measure.scoring`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringMethod {
    Proportion,
    Ratio,
    ContinuousVariable,
    Cohort,
    Unrecognized(String),
}

impl ScoringMethod {
    pub fn from_concept(concept: &CodeableConcept) -> Option<Self> {
        concept.first_code().map(Self::from_code)
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "proportion" => Self::Proportion,
            "ratio" => Self::Ratio,
            "continuous-variable" => Self::ContinuousVariable,
            "cohort" => Self::Cohort,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// Whether a higher or a lower score is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImprovementNotation {
    Increase,
    Decrease,
    Unspecified,
}

impl ImprovementNotation {
    /// Parse the first coding's code, ignoring case
    pub fn from_concept(concept: Option<&CodeableConcept>) -> Self {
        match concept
            .and_then(CodeableConcept::first_code)
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("increase") => Self::Increase,
            Some("decrease") => Self::Decrease,
            _ => Self::Unspecified,
        }
    }
}

impl fmt::Display for ImprovementNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increase => write!(f, "increase"),
            Self::Decrease => write!(f, "decrease"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Outcome of the care-gap rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapDecision {
    Gap,
    NoGap,
    /// The improvement notation does not say which direction is better
    Undecided,
}

impl GapDecision {
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }
}

/// Apply the improvement-notation rule to a proportion
pub fn decide_gap(notation: ImprovementNotation, proportion: f64) -> GapDecision {
    let gap = match notation {
        ImprovementNotation::Increase => proportion < 1.0,
        ImprovementNotation::Decrease => proportion > 0.0,
        ImprovementNotation::Unspecified => return GapDecision::Undecided,
    };
    if gap { GapDecision::Gap } else { GapDecision::NoGap }
}

/// Numerator and denominator extracted from a report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationCounts {
    pub numerator: i64,
    pub denominator: i64,
    /// Duplicate populations that were ignored
    pub warnings: Vec<Diagnostic>,
}

/// Take the first `numerator` and first `denominator` count across all groups
pub fn extract_counts(report: &MeasureReport) -> PopulationCounts {
    let mut numerator = None;
    let mut denominator = None;
    let mut warnings = Vec::new();

    let populations = report.group.iter().flat_map(|g| g.population.iter());
    for population in populations {
        // Populations without a count carry no score
        let (Some(code), Some(count)) = (population.code.as_ref(), population.count) else {
            continue;
        };
        let (slot, code, name) = if code.has_code(NUMERATOR) {
            (&mut numerator, MEA0500, NUMERATOR)
        } else if code.has_code(DENOMINATOR) {
            (&mut denominator, MEA0501, DENOMINATOR)
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(count);
        } else {
            log::warn!(
                "Ignoring additional {} population (count {}) in report for {}",
                name,
                count,
                report.measure
            );
            warnings.push(
                Diagnostic::warning(code, format!("Additional {} population ignored", name))
                    .with_resource(report.measure.clone()),
            );
        }
    }

    PopulationCounts {
        numerator: numerator.unwrap_or(0),
        denominator: denominator.unwrap_or(0),
        warnings,
    }
}

/// Proportion score for the given counts
///
/// Only `proportion` measures with a non-zero denominator score above 0.0.
pub fn proportion(
    scoring: Option<&ScoringMethod>,
    counts: &PopulationCounts,
    policy: ScoringPolicy,
    measure: &str,
) -> MeasureResult<f64> {
    match scoring {
        Some(ScoringMethod::Proportion) if counts.denominator != 0 => {
            Ok(counts.numerator as f64 / counts.denominator as f64)
        }
        Some(ScoringMethod::Unrecognized(code))
            if policy == ScoringPolicy::Strict && counts.denominator == 0 =>
        {
            Err(MeasureError::invalid_scoring(measure, code.clone()))
        }
        _ => Ok(0.0),
    }
}

/// Scoring result for one measure and one report
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureScore {
    pub numerator: i64,
    pub denominator: i64,
    pub proportion: f64,
    pub notation: ImprovementNotation,
    pub decision: GapDecision,
    pub warnings: Vec<Diagnostic>,
}

impl MeasureScore {
    pub fn is_gap(&self) -> bool {
        self.decision.is_gap()
    }
}

/// Score a report and decide whether the subject has a care gap
pub fn score_report(
    measure: &Measure,
    report: &MeasureReport,
    policy: ScoringPolicy,
) -> MeasureResult<MeasureScore> {
    let counts = extract_counts(report);
    let scoring = measure.scoring.as_ref().and_then(ScoringMethod::from_concept);
    let canonical = measure.canonical();
    let proportion = proportion(scoring.as_ref(), &counts, policy, &canonical)?;

    let notation = ImprovementNotation::from_concept(measure.improvement_notation.as_ref());
    let decision = decide_gap(notation, proportion);

    let mut warnings = counts.warnings;
    if decision == GapDecision::Undecided {
        warnings.push(
            Diagnostic::warning(MEA0502, "No gap decision without an improvement notation")
                .with_resource(canonical),
        );
    }

    Ok(MeasureScore {
        numerator: counts.numerator,
        denominator: counts.denominator,
        proportion,
        notation,
        decision,
        warnings,
    })
}
