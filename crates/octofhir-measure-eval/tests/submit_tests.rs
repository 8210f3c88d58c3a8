//! `$submit-data` transaction assembly and application

mod common;

use common::*;
use octofhir_measure_eval::{ErrorKind, MeasureError, SubmissionBuilder};
use octofhir_measure_model::{
    BundleType, HttpVerb, InMemoryStore, MeasureReport, ResourceKey,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn report(id: Option<&str>) -> MeasureReport {
    MeasureReport {
        id: id.map(String::from),
        status: "complete".into(),
        report_type: "individual".into(),
        measure: "http://example.org/fhir/Measure/M".into(),
        ..Default::default()
    }
}

fn statuses(response: &octofhir_measure_model::Bundle) -> Vec<String> {
    response
        .entry
        .iter()
        .map(|e| e.response.as_ref().unwrap().status.clone())
        .collect()
}

#[test]
fn test_flattened_order() {
    let nested = collection([
        encounter("e1", "Patient/p1"),
        resource(json!({"resourceType": "Condition", "code": {"text": "Diabetes"}})),
    ]);

    let mut builder = SubmissionBuilder::new(&report(Some("r1"))).unwrap();
    builder.add(patient("p1")).unwrap();
    builder
        .add(octofhir_measure_model::Resource::from_typed(&nested).unwrap())
        .unwrap();
    let bundle = builder.build();

    let directives: Vec<(HttpVerb, &str)> = bundle
        .entry
        .iter()
        .map(|e| {
            let request = e.request.as_ref().unwrap();
            (request.method, request.url.as_str())
        })
        .collect();
    assert_eq!(
        directives,
        vec![
            (HttpVerb::Put, "MeasureReport/r1"),
            (HttpVerb::Put, "Patient/p1"),
            (HttpVerb::Put, "Encounter/e1"),
            (HttpVerb::Post, "Condition"),
        ]
    );
}

#[tokio::test]
async fn test_empty_resources_and_idless_report() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(MockEngine::new());
    let service = service(&store, &engine);

    let response = service
        .submit_data("M", Some(&report(None)), Vec::new())
        .await
        .unwrap();

    assert!(response.is_type(BundleType::TransactionResponse));
    assert_eq!(statuses(&response), vec!["201 Created"]);
    let location = response.entry[0].response.as_ref().unwrap().location.clone().unwrap();
    assert!(location.starts_with("MeasureReport/"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_submission_applies_every_entry() {
    let store = Arc::new(InMemoryStore::from_resources([patient("p1")]).unwrap());
    let engine = Arc::new(MockEngine::new());
    let service = service(&store, &engine);

    let response = service
        .submit_data(
            "M",
            Some(&report(Some("r1"))),
            vec![
                patient("p1"),
                octofhir_measure_model::Resource::from_typed(&collection([encounter(
                    "e1",
                    "Patient/p1",
                )]))
                .unwrap(),
            ],
        )
        .await
        .unwrap();

    assert_eq!(statuses(&response), vec!["201 Created", "200 OK", "201 Created"]);
    assert!(store.contains(&ResourceKey::new("MeasureReport", "r1")));
    assert!(store.contains(&ResourceKey::new("Encounter", "e1")));
}

#[tokio::test]
async fn test_missing_report() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(MockEngine::new());

    let err = service(&store, &engine)
        .submit_data("M", None, vec![patient("p1")])
        .await
        .unwrap_err();
    assert_eq!(err, MeasureError::EmptyReport);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_rejected_transaction_changes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(MockEngine::new());
    let service = service(&store, &engine);

    // A verbatim transaction entry whose PUT url disagrees with its resource
    let bad = resource(json!({
        "resourceType": "Bundle",
        "type": "transaction",
        "entry": [{
            "resource": {"resourceType": "Patient", "id": "p1"},
            "request": {"method": "PUT", "url": "Patient/p2"}
        }]
    }));

    let err = service
        .submit_data("M", Some(&report(Some("r1"))), vec![patient("p0"), bad])
        .await
        .unwrap_err();
    assert!(matches!(err, MeasureError::TransactionFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_stored_report_keeps_group_details() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(MockEngine::new());
    let service = service(&store, &engine);

    let submitted: MeasureReport = serde_json::from_value(json!({
        "id": "r1",
        "measure": "http://example.org/fhir/Measure/M",
        "group": [{
            "measureScore": {"value": 0.3},
            "stratifier": [{"code": [{"text": "age"}]}],
            "population": [{
                "code": {"coding": [{"code": "numerator"}]},
                "count": 3,
                "subjectResults": {"reference": "List/l1"}
            }]
        }]
    }))
    .unwrap();

    service.submit_data("M", Some(&submitted), Vec::new()).await.unwrap();

    let stored = store.get(&ResourceKey::new("MeasureReport", "r1")).unwrap();
    let group = &stored.get("group").unwrap()[0];
    assert_eq!(group["measureScore"], json!({"value": 0.3}));
    assert_eq!(group["stratifier"][0]["code"][0]["text"], "age");
    assert_eq!(group["population"][0]["subjectResults"]["reference"], "List/l1");
}
