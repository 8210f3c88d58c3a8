//! Warnings returned alongside operation results

use crate::error::MeasureResult;
use octofhir_measure_diagnostics::{Diagnostic, Severity};
use octofhir_measure_model::{
    CodeableConcept, Coding, IssueSeverity, OperationOutcome, OperationOutcomeIssue, Parameters,
    Resource,
};

/// Name of the parameter holding an operation's warnings
pub const OUTCOME_PARAMETER: &str = "outcome";

/// System of the `MEA####` codes in issue details
pub const DIAGNOSTIC_CODE_SYSTEM: &str = "urn:octofhir:measure:diagnostic";

pub fn to_outcome(diagnostics: &[Diagnostic]) -> OperationOutcome {
    OperationOutcome {
        id: None,
        issue: diagnostics.iter().map(to_issue).collect(),
    }
}

fn to_issue(diagnostic: &Diagnostic) -> OperationOutcomeIssue {
    let (severity, code) = match diagnostic.severity {
        Severity::Error => (IssueSeverity::Error, "processing"),
        Severity::Warning => (IssueSeverity::Warning, "incomplete"),
        Severity::Info => (IssueSeverity::Information, "informational"),
    };
    OperationOutcomeIssue {
        severity,
        code: code.to_string(),
        details: Some(CodeableConcept {
            text: Some(diagnostic.message.clone()),
            ..CodeableConcept::from_coding(Coding::new(
                DIAGNOSTIC_CODE_SYSTEM,
                diagnostic.code.to_string(),
            ))
        }),
        diagnostics: diagnostic.help.clone(),
        expression: diagnostic.resource.iter().cloned().collect(),
    }
}

/// Append an `outcome` parameter when there is anything to report
pub fn add_warnings(parameters: &mut Parameters, warnings: &[Diagnostic]) -> MeasureResult<()> {
    if !warnings.is_empty() {
        parameters.add_resource(OUTCOME_PARAMETER, Resource::from_typed(&to_outcome(warnings))?);
    }
    Ok(())
}

/// Warnings carried by the `outcome` parameter of an operation result
pub fn warning_codes(parameters: &Parameters) -> Vec<String> {
    parameters
        .get(OUTCOME_PARAMETER)
        .and_then(|p| p.resource.as_ref())
        .and_then(|r| r.to_typed::<OperationOutcome>().ok())
        .map(|outcome| {
            outcome
                .issue
                .iter()
                .filter_map(|issue| issue.details.as_ref()?.first_code().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_measure_diagnostics::{MEA0500, MEA0502};

    #[test]
    fn test_warnings_become_issues() {
        let outcome = to_outcome(&[
            Diagnostic::warning(MEA0500, "Additional numerator population ignored")
                .with_resource("http://example.org/Measure/m1"),
        ]);

        let issue = &outcome.issue[0];
        assert_eq!(issue.severity, IssueSeverity::Warning);
        assert_eq!(issue.code, "incomplete");
        let details = issue.details.as_ref().unwrap();
        assert_eq!(details.first_code(), Some("MEA0500"));
        assert_eq!(details.text.as_deref(), Some("Additional numerator population ignored"));
        assert_eq!(issue.expression, vec!["http://example.org/Measure/m1"]);
    }

    #[test]
    fn test_no_parameter_without_warnings() {
        let mut parameters = Parameters::new();
        add_warnings(&mut parameters, &[]).unwrap();
        assert!(parameters.parameter.is_empty());

        add_warnings(&mut parameters, &[Diagnostic::warning(MEA0502, "undecided")]).unwrap();
        assert_eq!(parameters.parameter[0].name, OUTCOME_PARAMETER);
        assert_eq!(warning_codes(&parameters), vec!["MEA0502"]);
    }
}
