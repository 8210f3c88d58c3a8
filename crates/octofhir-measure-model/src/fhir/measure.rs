//! Measure, MeasureReport and Library

use super::datatypes::{
    CodeableConcept, Extension, Meta, Narrative, Period, Reference, RelatedArtifact,
};
use crate::resource::{FhirResource, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_artifact: Vec<RelatedArtifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_notation: Option<CodeableConcept>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Measure {
    /// The reference a report uses to point back at this measure
    pub fn canonical(&self) -> String {
        match (&self.url, &self.id) {
            (Some(url), _) => url.clone(),
            (None, Some(id)) => format!("Measure/{}", id),
            (None, None) => "Measure".to_string(),
        }
    }
}

impl FhirResource for Measure {
    const RESOURCE_TYPE: &'static str = "Measure";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default = "default_report_status")]
    pub status: String,
    #[serde(rename = "type", default = "default_report_type")]
    pub report_type: String,
    #[serde(default)]
    pub measure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<Reference>,
    #[serde(default)]
    pub period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_notation: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<MeasureReportGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluated_resource: Vec<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_report_status() -> String {
    "complete".to_string()
}

fn default_report_type() -> String {
    "individual".to_string()
}

impl FhirResource for MeasureReport {
    const RESOURCE_TYPE: &'static str = "MeasureReport";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureReportGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub population: Vec<GroupPopulation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPopulation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_results: Option<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupPopulation {
    pub fn new(code: CodeableConcept, count: i64) -> Self {
        Self {
            code: Some(code),
            count: Some(count),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub library_type: CodeableConcept,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_artifact: Vec<RelatedArtifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_requirement: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FhirResource for Library {
    const RESOURCE_TYPE: &'static str = "Library";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_measure_keeps_unknown_members() {
        let resource = Resource::from_value(json!({
            "resourceType": "Measure",
            "id": "m1",
            "title": "Diabetes HbA1c",
            "scoring": {"coding": [{"code": "proportion"}]},
            "group": [{"population": []}],
            "effectivePeriod": {"start": "2021-01-01"}
        }))
        .unwrap();

        let measure: Measure = resource.to_typed().unwrap();
        assert_eq!(measure.title.as_deref(), Some("Diabetes HbA1c"));
        assert!(measure.extra.contains_key("effectivePeriod"));

        let back = Resource::from_typed(&measure).unwrap();
        assert_eq!(back.get("group"), resource.get("group"));
        assert_eq!(back.get("effectivePeriod"), resource.get("effectivePeriod"));
    }

    #[test]
    fn test_report_groups_keep_unknown_members() {
        let resource = Resource::from_value(json!({
            "resourceType": "MeasureReport",
            "status": "complete",
            "type": "individual",
            "measure": "Measure/m1",
            "subject": {"reference": "Patient/p1", "identifier": {"value": "MRN-1"}},
            "period": {"start": "2021-01-01", "end": "2021-12-31"},
            "extension": [{
                "url": "http://example.org/fhir/StructureDefinition/risk",
                "valueCodeableConcept": {"coding": [{"code": "high"}]}
            }],
            "group": [{
                "measureScore": {"value": 0.3},
                "stratifier": [{"code": [{"text": "age"}]}],
                "population": [{
                    "code": {"coding": [{"code": "numerator", "userSelected": true}]},
                    "count": 3,
                    "subjectResults": {"reference": "List/l1"},
                    "id": "num"
                }]
            }]
        }))
        .unwrap();

        let report: MeasureReport = resource.to_typed().unwrap();
        assert_eq!(report.group[0].extra.get("measureScore"), Some(&json!({"value": 0.3})));
        assert_eq!(report.group[0].population[0].count, Some(3));

        let back = Resource::from_typed(&report).unwrap();
        assert_eq!(back, resource);
    }

    #[test]
    fn test_measure_canonical() {
        let mut measure = Measure {
            id: Some("m1".into()),
            ..Default::default()
        };
        assert_eq!(measure.canonical(), "Measure/m1");

        measure.url = Some("http://example.org/Measure/m1".into());
        assert_eq!(measure.canonical(), "http://example.org/Measure/m1");
    }

    #[test]
    fn test_report_defaults() {
        let report: MeasureReport = serde_json::from_value(json!({
            "measure": "Measure/m1",
            "group": [{"population": [{"code": {"coding": [{"code": "numerator"}]}, "count": 3}]}]
        }))
        .unwrap();
        assert_eq!(report.status, "complete");
        assert_eq!(report.report_type, "individual");
        assert_eq!(report.group[0].population[0].count, Some(3));
    }
}
