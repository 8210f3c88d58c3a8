//! Care-gap document assembly

mod common;

use common::*;
use octofhir_measure_eval::{
    CARE_GAP_CODE, CareGapsRequest, DEQM_DETECTED_ISSUE_CATEGORY, DEQM_INDIVIDUAL_REPORT_PROFILE,
    ErrorKind, MeasureError, MeasureService, OUTCOME_PARAMETER, warning_codes,
};
use octofhir_measure_model::{
    Bundle, BundleType, Composition, DetectedIssue, InMemoryStore, MeasureReport, Parameters,
    ReportType,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup(measures: Vec<octofhir_measure_model::Resource>) -> (Arc<InMemoryStore>, Arc<MockEngine>) {
    let store = Arc::new(InMemoryStore::new());
    store.insert(organization(ORGANIZATION)).unwrap();
    for measure in measures {
        store.insert(measure).unwrap();
    }
    (store, Arc::new(MockEngine::new()))
}

fn document(result: &Parameters, subject: &str) -> Bundle {
    let name = format!("Gaps in Care Report - {}", subject);
    result
        .get(&name)
        .and_then(|p| p.resource.as_ref())
        .unwrap_or_else(|| panic!("no parameter named {}", name))
        .to_typed()
        .unwrap()
}

fn composition(document: &Bundle) -> Composition {
    document.entry[0].resource.as_ref().unwrap().to_typed().unwrap()
}

fn types(document: &Bundle) -> Vec<&str> {
    document
        .resources()
        .map(|r| r.resource_type().unwrap())
        .collect()
}

#[tokio::test]
async fn test_single_gap_end_to_end() {
    let (store, engine) = setup(vec![proportion_measure("M", "Diabetes: HbA1c Poor Control")]);
    engine.set_score("M", "Patient/P", 3, 10);
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021-01-01", "2021-12-31").with_subject("P"))
        .await
        .unwrap();
    assert_eq!(result.parameter.len(), 1);

    let document = document(&result, "P");
    assert!(document.is_type(BundleType::Document));
    assert_eq!(types(&document), vec!["Composition", "MeasureReport", "DetectedIssue"]);

    let composition = composition(&document);
    let report: MeasureReport = document.entry[1].resource.as_ref().unwrap().to_typed().unwrap();
    let issue: DetectedIssue = document.entry[2].resource.as_ref().unwrap().to_typed().unwrap();
    let report_id = report.id.clone().unwrap();
    let issue_id = issue.id.clone().unwrap();

    assert_eq!(composition.status, "final");
    assert_eq!(composition.title.as_deref(), Some("Care Gap Report"));
    assert_eq!(
        composition.subject.as_ref().unwrap().reference.as_deref(),
        Some("Patient/P")
    );
    assert_eq!(composition.section.len(), 1);
    assert_eq!(
        composition.author[0].reference.as_deref(),
        Some("Organization/org-1")
    );

    let section = &composition.section[0];
    assert_eq!(section.title.as_deref(), Some("Diabetes: HbA1c Poor Control"));
    assert_eq!(
        section.focus.as_ref().unwrap().reference,
        Some(format!("MeasureReport/{}", report_id))
    );
    assert_eq!(
        section.entry[0].reference,
        Some(format!("DetectedIssue/{}", issue_id))
    );

    assert_eq!(
        report.reporter.unwrap().reference.as_deref(),
        Some("Organization/org-1")
    );
    assert_eq!(
        report.meta.unwrap().profile,
        vec![DEQM_INDIVIDUAL_REPORT_PROFILE.to_string()]
    );
    assert_eq!(
        report.improvement_notation.unwrap().first_code(),
        Some("increase")
    );
    assert!(report.date.is_some());

    assert_eq!(issue.status, "final");
    assert_eq!(issue.patient.unwrap().reference.as_deref(), Some("Patient/P"));
    let code = issue.code.unwrap();
    assert_eq!(code.coding[0].system.as_deref(), Some(DEQM_DETECTED_ISSUE_CATEGORY));
    assert_eq!(code.first_code(), Some(CARE_GAP_CODE));
    assert_eq!(
        issue.evidence[0].detail[0].reference,
        Some(format!("MeasureReport/{}", report_id))
    );

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].report_type, ReportType::Patient);
    assert_eq!(calls[0].subject.as_deref(), Some("Patient/P"));
}

#[tokio::test]
async fn test_subject_group_without_gap_for_second_subject() {
    let (store, engine) = setup(vec![proportion_measure("M", "Colorectal Cancer Screening")]);
    engine.set_score("M", "Patient/P1", 0, 1);
    engine.set_score("M", "Patient/P2", 1, 1);
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021-01-01", "2021-12-31").with_subject_group("P1,P2"))
        .await
        .unwrap();

    let names: Vec<&str> = result.parameter.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Gaps in Care Report - P1", "Gaps in Care Report - P2"]
    );

    let first = document(&result, "P1");
    assert_eq!(types(&first), vec!["Composition", "MeasureReport", "DetectedIssue"]);

    // Reports without a gap are left out of the document
    let second = document(&result, "P2");
    assert_eq!(types(&second), vec!["Composition"]);
    assert!(composition(&second).section.is_empty());
}

#[tokio::test]
async fn test_measures_keep_search_order() {
    let (store, engine) = setup(vec![
        proportion_measure("M1", "First"),
        proportion_measure("M2", "Second"),
        proportion_measure("M3", "Third"),
    ]);
    engine.set_score("M1", "Patient/P", 1, 4);
    engine.set_score("M2", "Patient/P", 4, 4);
    engine.set_score("M3", "Patient/P", 0, 4);
    let service = service(&store, &engine);

    let document = service
        .patient_care_gap(
            &octofhir_measure_model::MeasurementPeriod::parse("2021", "2021").unwrap(),
            "Patient/P",
            None,
        )
        .await
        .unwrap()
        .document;

    assert_eq!(
        types(&document),
        vec![
            "Composition",
            "MeasureReport",
            "MeasureReport",
            "DetectedIssue",
            "DetectedIssue"
        ]
    );
    let titles: Vec<_> = composition(&document)
        .section
        .into_iter()
        .map(|s| s.title.unwrap())
        .collect();
    assert_eq!(titles, vec!["First", "Third"]);

    let evaluated: Vec<_> = engine.calls().into_iter().map(|c| c.measure).collect();
    assert_eq!(evaluated, vec!["M1", "M2", "M3"]);
}

#[tokio::test]
async fn test_decrease_notation() {
    let (store, engine) = setup(vec![
        MeasureBuilder::new("M")
            .title("Opioid Overuse")
            .scoring("proportion")
            .notation("decrease")
            .resource(),
    ]);
    engine.set_score("M", "Patient/P1", 1, 5);
    engine.set_score("M", "Patient/P2", 0, 5);
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject_group("P1,P2"))
        .await
        .unwrap();
    assert_eq!(composition(&document(&result, "P1")).section.len(), 1);
    assert_eq!(composition(&document(&result, "P2")).section.len(), 0);
}

#[tokio::test]
async fn test_no_decision_without_scoring_or_notation() {
    let (store, engine) = setup(vec![
        MeasureBuilder::new("NoScoring").notation("increase").resource(),
        MeasureBuilder::new("NoNotation").scoring("proportion").resource(),
    ]);
    engine.set_score("NoScoring", "Patient/P", 0, 10);
    engine.set_score("NoNotation", "Patient/P", 0, 10);
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap();
    let document = document(&result, "P");
    assert_eq!(types(&document), vec!["Composition"]);
    assert_eq!(engine.calls().len(), 2);

    // Only the scored measure without a notation is undecided
    assert_eq!(result.parameter.last().unwrap().name, OUTCOME_PARAMETER);
    assert_eq!(warning_codes(&result), vec!["MEA0502"]);
}

#[tokio::test]
async fn test_duplicate_populations_are_reported() {
    let (store, engine) = setup(vec![proportion_measure("M", "Statin Therapy")]);
    engine.set_populations(
        "M",
        "Patient/P",
        &[("numerator", 1), ("denominator", 4), ("numerator", 3)],
    );
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap();

    let names: Vec<&str> = result.parameter.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Gaps in Care Report - P", OUTCOME_PARAMETER]);
    assert_eq!(warning_codes(&result), vec!["MEA0500"]);

    // The first numerator still decides the gap
    assert_eq!(
        types(&document(&result, "P")),
        vec!["Composition", "MeasureReport", "DetectedIssue"]
    );
}

#[tokio::test]
async fn test_report_without_groups_has_no_gap() {
    let (store, engine) = setup(vec![proportion_measure("M", "Empty")]);
    let service = service(&store, &engine);

    let result = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap();
    assert!(composition(&document(&result, "P")).section.is_empty());
}

#[tokio::test]
async fn test_topic_filters_measures() {
    let (store, engine) = setup(vec![
        MeasureBuilder::new("Diabetes")
            .scoring("proportion")
            .notation("increase")
            .topic("http://loinc.org", "57024-2")
            .resource(),
        MeasureBuilder::new("Other")
            .scoring("proportion")
            .notation("increase")
            .resource(),
    ]);
    let service = service(&store, &engine);

    service
        .care_gaps(
            &CareGapsRequest::new("2021", "2021")
                .with_subject("P")
                .with_topic("http://loinc.org|57024-2"),
        )
        .await
        .unwrap();

    let evaluated: Vec<_> = engine.calls().into_iter().map(|c| c.measure).collect();
    assert_eq!(evaluated, vec!["Diabetes"]);
}

#[tokio::test]
async fn test_missing_subject() {
    let (store, engine) = setup(vec![proportion_measure("M", "M")]);
    let service = service(&store, &engine);

    let err = service
        .care_gaps(&CareGapsRequest::new("2021", "2021"))
        .await
        .unwrap_err();
    assert_eq!(err, MeasureError::MissingSubject);
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_first_organization_fallback() {
    let (store, engine) = setup(vec![proportion_measure("M", "M")]);
    store.insert(organization("org-2")).unwrap();
    engine.set_score("M", "Patient/P", 0, 1);
    let service = MeasureService::builder(store.clone(), engine.clone())
        .build()
        .unwrap();

    let result = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap();
    let report: MeasureReport = document(&result, "P").entry[1]
        .resource
        .as_ref()
        .unwrap()
        .to_typed()
        .unwrap();
    assert_eq!(
        report.reporter.unwrap().reference.as_deref(),
        Some("Organization/org-1")
    );
}

#[tokio::test]
async fn test_organization_not_found() {
    let store = Arc::new(InMemoryStore::new());
    store.insert(proportion_measure("M", "M")).unwrap();
    let engine = Arc::new(MockEngine::new());
    let service = MeasureService::builder(store.clone(), engine.clone())
        .build()
        .unwrap();

    let err = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap_err();
    assert_eq!(err, MeasureError::OrganizationNotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_engine_failure_aborts_request() {
    let (store, engine) = setup(vec![proportion_measure("M1", "M1"), proportion_measure("M2", "M2")]);
    engine.fail_on("M1");
    let service = service(&store, &engine);

    let err = service
        .care_gaps(&CareGapsRequest::new("2021", "2021").with_subject("P"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EvaluationFailed);
    assert_eq!(engine.calls().len(), 1);
}

#[tokio::test]
async fn test_invalid_period() {
    let (store, engine) = setup(vec![]);
    let service = service(&store, &engine);

    let err = service
        .care_gaps(&CareGapsRequest::new("2022-01-01", "2021-01-01").with_subject("P"))
        .await
        .unwrap_err();
    assert!(matches!(err, MeasureError::InvalidPeriod { .. }));
}
