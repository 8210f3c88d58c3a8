//! JSON-backed FHIR resources and resource identity

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A FHIR resource of any type, kept as its JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl Resource {
    /// Create an empty resource of the given type
    pub fn new(resource_type: &str) -> Self {
        let mut map = Map::new();
        map.insert("resourceType".into(), Value::String(resource_type.into()));
        Self(map)
    }

    /// Wrap a JSON value, which must be an object carrying `resourceType`
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(map) if map.get("resourceType").is_some_and(Value::is_string) => {
                Ok(Self(map))
            }
            Value::Object(_) => Err(ModelError::MissingResourceType),
            other => Err(ModelError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Convert a typed resource into its JSON form
    pub fn from_typed<T: FhirResource>(typed: &T) -> Result<Self, ModelError> {
        match serde_json::to_value(typed).map_err(|e| ModelError::Serialization(e.to_string()))? {
            Value::Object(mut map) => {
                map.insert("resourceType".into(), Value::String(T::RESOURCE_TYPE.into()));
                Ok(Self(map))
            }
            other => Err(ModelError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Convert into a typed resource, checking the resource type first
    pub fn to_typed<T: FhirResource>(&self) -> Result<T, ModelError> {
        let found = self.resource_type().unwrap_or_default();
        if found != T::RESOURCE_TYPE {
            return Err(ModelError::TypeMismatch {
                expected: T::RESOURCE_TYPE.to_string(),
                found: found.to_string(),
            });
        }
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert("id".into(), Value::String(id.into()));
    }

    /// Identity of this resource, if it has both a type and an id
    pub fn key(&self) -> Option<ResourceKey> {
        Some(ResourceKey::new(self.resource_type()?, self.id()?))
    }

    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type() == Some(resource_type)
    }

    /// Get a top-level member
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Identity of a resource: type plus logical id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub resource_type: String,
    pub id: String,
}

impl ResourceKey {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Parse a relative `Type/id` string
    pub fn parse(value: &str) -> Option<Self> {
        let (resource_type, id) = value.split_once('/')?;
        (is_resource_type(resource_type) && !id.is_empty() && !id.contains('/'))
            .then(|| Self::new(resource_type, id))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// FHIR resource type names start with an upper-case ASCII letter
pub(crate) fn is_resource_type(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

/// A typed FHIR resource with a fixed resource type
pub trait FhirResource: Serialize + DeserializeOwned {
    const RESOURCE_TYPE: &'static str;

    fn id(&self) -> Option<&str>;
}

/// Resource model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(String),

    #[error("Resource has no resourceType")]
    MissingResourceType,

    #[error("{0} resource has no id")]
    MissingId(String),

    #[error("Expected {expected} resource, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhir::DetectedIssue;
    use serde_json::json;

    #[test]
    fn test_from_value_requires_resource_type() {
        assert!(Resource::from_value(json!({"resourceType": "Patient", "id": "p1"})).is_ok());
        assert_eq!(
            Resource::from_value(json!({"id": "p1"})),
            Err(ModelError::MissingResourceType)
        );
        assert!(matches!(
            Resource::from_value(json!([1, 2])),
            Err(ModelError::NotAnObject(kind)) if kind == "array"
        ));
    }

    #[test]
    fn test_key_needs_type_and_id() {
        let patient = Resource::from_value(json!({"resourceType": "Patient", "id": "p1"})).unwrap();
        assert_eq!(patient.key(), Some(ResourceKey::new("Patient", "p1")));

        let anonymous = Resource::new("Observation");
        assert_eq!(anonymous.key(), None);
    }

    #[test]
    fn test_typed_round_trip_checks_type() {
        let issue = DetectedIssue {
            id: Some("d1".into()),
            status: "final".into(),
            ..Default::default()
        };
        let resource = Resource::from_typed(&issue).unwrap();
        assert_eq!(resource.resource_type(), Some("DetectedIssue"));

        let back: DetectedIssue = resource.to_typed().unwrap();
        assert_eq!(back.id.as_deref(), Some("d1"));

        let patient = Resource::new("Patient");
        assert!(matches!(
            patient.to_typed::<DetectedIssue>(),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_resource_key_parse() {
        assert_eq!(
            ResourceKey::parse("Patient/123"),
            Some(ResourceKey::new("Patient", "123"))
        );
        assert_eq!(ResourceKey::parse("patient/123"), None);
        assert_eq!(ResourceKey::parse("Patient/"), None);
        assert_eq!(ResourceKey::parse("Patient"), None);
        assert_eq!(ResourceKey::new("Encounter", "e1").to_string(), "Encounter/e1");
    }
}
