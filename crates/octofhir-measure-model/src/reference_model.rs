//! Reference field model
//!
//! Describes, per resource type, which elements hold references. The closure
//! resolver is written once against [`ReferenceFields`]; the per-type knowledge
//! lives in a [`ReferenceModel`] loaded from ModelInfo-shaped JSON.

use crate::fhir::parse_reference;
use crate::resource::{ModelError, Resource, ResourceKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Reference model describing the reference-typed elements of each resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceModel {
    /// Model name (e.g., "FHIR")
    pub name: String,
    /// Model version
    pub version: String,
    /// Type definitions
    pub type_infos: HashMap<String, TypeInfo>,
}

impl ReferenceModel {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            type_infos: HashMap::new(),
        }
    }

    /// Register a type, replacing any previous definition
    pub fn with_type(mut self, type_info: TypeInfo) -> Self {
        self.type_infos.insert(type_info.name.clone(), type_info);
        self
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeInfo> {
        self.type_infos.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_infos.contains_key(name)
    }

    /// Elements of a type in declaration order, base type elements first
    pub fn elements(&self, type_name: &str) -> Vec<&PropertyInfo> {
        let mut chain = Vec::new();
        let mut current = self.get_type(type_name);
        while let Some(type_info) = current {
            // A malformed model could name a type as its own ancestor
            if chain.iter().any(|t: &&TypeInfo| t.name == type_info.name) {
                break;
            }
            chain.push(type_info);
            current = type_info
                .base_type
                .as_deref()
                .and_then(|base| self.get_type(base));
        }

        chain
            .iter()
            .rev()
            .flat_map(|t| t.elements.iter())
            .collect()
    }

    /// Load from a ModelInfo-style JSON document
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        parse_json(json)
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|e| ModelError::IoError(e.to_string()))?;
        Self::from_json(&json)
    }
}

/// Type information for a resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub base_type: Option<String>,
    pub elements: Vec<PropertyInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: PropertyInfo) -> Self {
        self.elements.push(element);
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Element information within a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub element_type: String,
    pub is_list: bool,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: element_type.into(),
            is_list: false,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, "Reference")
    }

    pub fn reference_list(name: impl Into<String>) -> Self {
        Self {
            is_list: true,
            ..Self::reference(name)
        }
    }

    pub fn is_reference(&self) -> bool {
        self.element_type == "Reference"
    }
}

fn parse_json(json_content: &str) -> Result<ReferenceModel, ModelError> {
    let json: Value =
        serde_json::from_str(json_content).map_err(|e| ModelError::ParseError(e.to_string()))?;

    let mut model = ReferenceModel::new(
        json["name"].as_str().unwrap_or(""),
        json["version"].as_str().unwrap_or(""),
    );

    if let Some(type_infos) = json["typeInfo"].as_array() {
        for type_json in type_infos {
            let type_info = parse_type_info_json(type_json)?;
            model.type_infos.insert(type_info.name.clone(), type_info);
        }
    }

    Ok(model)
}

fn parse_type_info_json(json: &Value) -> Result<TypeInfo, ModelError> {
    let mut type_info = TypeInfo::new(
        json["name"]
            .as_str()
            .ok_or_else(|| ModelError::ParseError("Missing type name".to_string()))?,
    );
    type_info.base_type = json["baseType"].as_str().map(String::from);

    if let Some(elements) = json["element"].as_array() {
        for elem_json in elements {
            type_info.elements.push(parse_property_json(elem_json)?);
        }
    }

    Ok(type_info)
}

fn parse_property_json(json: &Value) -> Result<PropertyInfo, ModelError> {
    let name = json["name"]
        .as_str()
        .ok_or_else(|| ModelError::ParseError("Missing element name".to_string()))?;
    let raw_type = json["elementType"]
        .as_str()
        .ok_or_else(|| ModelError::ParseError(format!("Missing elementType for {}", name)))?;

    // "list<Reference>" marks a repeating element
    let (element_type, is_list) = match raw_type
        .strip_prefix("list<")
        .and_then(|t| t.strip_suffix('>'))
    {
        Some(inner) => (inner, true),
        None => (raw_type, false),
    };

    Ok(PropertyInfo {
        name: name.to_string(),
        element_type: element_type.to_string(),
        is_list,
    })
}

/// One reference-bearing field of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReference {
    pub field: String,
    /// Resolvable identity of the first value, if it has a concrete type and id
    pub target: Option<ResourceKey>,
}

/// Capability to list the reference fields of any resource
pub trait ReferenceFields: Send + Sync {
    fn reference_fields(&self, resource: &Resource) -> Vec<FieldReference>;
}

impl ReferenceFields for ReferenceModel {
    /// Declared reference elements in declaration order, then every other
    /// member holding a reference-shaped value, sorted by name
    fn reference_fields(&self, resource: &Resource) -> Vec<FieldReference> {
        let Some(resource_type) = resource.resource_type() else {
            return Vec::new();
        };

        let elements = self.elements(resource_type);
        let mut fields: Vec<FieldReference> = elements
            .iter()
            .filter(|e| e.is_reference())
            .filter_map(|e| {
                resource.get(&e.name).map(|value| FieldReference {
                    field: e.name.clone(),
                    target: first_reference_target(value),
                })
            })
            .collect();

        let mut undeclared: Vec<(&String, &Value)> = resource
            .fields()
            .filter(|(field, _)| !elements.iter().any(|e| &e.name == *field))
            .filter(|(_, value)| first_value(value).is_some_and(is_reference_shaped))
            .collect();
        undeclared.sort_by(|a, b| a.0.cmp(b.0));
        fields.extend(undeclared.into_iter().map(|(field, value)| FieldReference {
            field: field.clone(),
            target: first_reference_target(value),
        }));
        fields
    }
}

/// Only the first value of a repeating element is inspected
fn first_value(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn is_reference_shaped(value: &Value) -> bool {
    value.get("reference").is_some_and(Value::is_string)
}

fn first_reference_target(value: &Value) -> Option<ResourceKey> {
    first_value(value)?
        .get("reference")?
        .as_str()
        .and_then(parse_reference)
}
