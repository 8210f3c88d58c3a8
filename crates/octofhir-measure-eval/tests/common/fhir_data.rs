//! FHIR test data builders

use octofhir_measure_model::{Bundle, BundleType, CodeableConcept, Coding, Measure, Resource};
use serde_json::{Value, json};

pub const MEASURE_SCORING_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/measure-scoring";
pub const IMPROVEMENT_NOTATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/measure-improvement-notation";

/// Builder for Measure resources
#[derive(Default)]
pub struct MeasureBuilder {
    measure: Measure,
}

impl MeasureBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            measure: Measure {
                url: Some(format!("http://example.org/fhir/Measure/{}", id)),
                id: Some(id),
                status: Some("active".into()),
                ..Default::default()
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.measure.title = Some(title.into());
        self
    }

    pub fn scoring(mut self, scoring: &str) -> Self {
        self.measure.scoring = Some(CodeableConcept::from_coding(Coding::new(
            MEASURE_SCORING_SYSTEM,
            scoring,
        )));
        self
    }

    pub fn notation(mut self, notation: &str) -> Self {
        self.measure.improvement_notation = Some(CodeableConcept::from_coding(Coding::new(
            IMPROVEMENT_NOTATION_SYSTEM,
            notation,
        )));
        self
    }

    pub fn topic(mut self, system: &str, code: &str) -> Self {
        self.measure
            .topic
            .push(CodeableConcept::from_coding(Coding::new(system, code)));
        self
    }

    pub fn library(mut self, canonical: impl Into<String>) -> Self {
        self.measure.library.push(canonical.into());
        self
    }

    pub fn build(self) -> Measure {
        self.measure
    }

    pub fn resource(self) -> Resource {
        Resource::from_typed(&self.measure).unwrap()
    }
}

/// A proportion measure where higher is better
pub fn proportion_measure(id: &str, title: &str) -> Resource {
    MeasureBuilder::new(id)
        .title(title)
        .scoring("proportion")
        .notation("increase")
        .resource()
}

pub fn resource(value: Value) -> Resource {
    Resource::from_value(value).unwrap()
}

pub fn patient(id: &str) -> Resource {
    resource(json!({"resourceType": "Patient", "id": id, "active": true}))
}

pub fn organization(id: &str) -> Resource {
    resource(json!({"resourceType": "Organization", "id": id, "name": "Good Health Clinic"}))
}

pub fn encounter(id: &str, subject: &str) -> Resource {
    resource(json!({
        "resourceType": "Encounter",
        "id": id,
        "status": "finished",
        "subject": {"reference": subject}
    }))
}

pub fn observation(id: &str, subject: &str, encounter: Option<&str>) -> Resource {
    let mut value = json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "code": {"coding": [{"system": "http://loinc.org", "code": "4548-4"}]},
        "subject": {"reference": subject}
    });
    if let Some(encounter) = encounter {
        value["encounter"] = json!({"reference": encounter});
    }
    resource(value)
}

pub fn collection(resources: impl IntoIterator<Item = Resource>) -> Bundle {
    let mut bundle = Bundle::new(BundleType::Collection);
    for resource in resources {
        bundle.push_resource(resource);
    }
    bundle
}
