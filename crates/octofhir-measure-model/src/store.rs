//! In-memory resource store
//!
//! A [`ResourceStore`] backed by an insertion-ordered map. Used by the CLI and
//! by tests; transactions are applied all-or-nothing under a single write lock.

use crate::fhir::{
    Bundle, BundleEntry, BundleResponse, BundleType, CodeableConcept, HttpVerb, Reference,
    parse_reference,
};
use crate::provider::{ResourceStore, SearchParams, StoreError};
use crate::resource::{ModelError, Resource, ResourceKey};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

/// Search parameters understood by [`InMemoryStore::search`]
pub const SUPPORTED_SEARCH_PARAMETERS: &[&str] = &["_id", "url", "topic", "subject"];

/// Thread-safe in-memory resource store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    resources: RwLock<IndexMap<ResourceKey, Resource>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from resources, later duplicates replacing earlier ones
    pub fn from_resources(
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self, ModelError> {
        let store = Self::new();
        for resource in resources {
            store.insert(resource)?;
        }
        Ok(store)
    }

    /// Insert or replace a resource; it must carry a type and an id
    pub fn insert(&self, resource: Resource) -> Result<ResourceKey, ModelError> {
        let key = match (resource.resource_type(), resource.id()) {
            (None, _) => return Err(ModelError::MissingResourceType),
            (Some(resource_type), None) => return Err(ModelError::MissingId(resource_type.into())),
            (Some(resource_type), Some(id)) => ResourceKey::new(resource_type, id),
        };
        self.resources.write().insert(key.clone(), resource);
        Ok(key)
    }

    /// Load every resource of a bundle, returning how many were stored
    pub fn load_bundle(&self, bundle: &Bundle) -> Result<usize, ModelError> {
        let mut loaded = 0;
        for resource in bundle.resources() {
            self.insert(resource.clone())?;
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<Resource> {
        self.resources.read().get(key).cloned()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Snapshot of all resources of a type, in insertion order
    pub fn all_of_type(&self, resource_type: &str) -> Vec<Resource> {
        self.resources
            .read()
            .iter()
            .filter(|(key, _)| key.resource_type == resource_type)
            .map(|(_, resource)| resource.clone())
            .collect()
    }
}

fn matches_criterion(resource: &Resource, name: &str, value: &str) -> bool {
    match name {
        "_id" => resource.id() == Some(value),
        "url" => resource.get("url").and_then(Value::as_str) == Some(value),
        "topic" => match resource.get("topic") {
            Some(Value::Array(topics)) => topics.iter().any(|topic| {
                serde_json::from_value::<CodeableConcept>(topic.clone())
                    .is_ok_and(|concept| concept.matches_token(value))
            }),
            _ => false,
        },
        "subject" => resource
            .get("subject")
            .and_then(|subject| serde_json::from_value::<Reference>(subject.clone()).ok())
            .is_some_and(|subject| {
                subject.reference.as_deref() == Some(value)
                    || (subject.parse_target().is_some()
                        && subject.parse_target() == parse_reference(value))
            }),
        _ => false,
    }
}

/// First resource of a type matching every `name=value` pair of a conditional create
fn find_existing(
    existing: &IndexMap<ResourceKey, Resource>,
    resource_type: &str,
    condition: &str,
) -> Result<Option<(ResourceKey, Resource)>, String> {
    let mut criteria = Vec::new();
    for pair in condition.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("ifNoneExist criterion '{}' has no value", pair))?;
        if !SUPPORTED_SEARCH_PARAMETERS.contains(&name) {
            return Err(format!("ifNoneExist parameter '{}' is not supported", name));
        }
        criteria.push((name, value));
    }
    if criteria.is_empty() {
        return Err("ifNoneExist has no criteria".to_string());
    }

    Ok(existing
        .iter()
        .filter(|(key, _)| key.resource_type == resource_type)
        .find(|(_, resource)| {
            criteria
                .iter()
                .all(|(name, value)| matches_criterion(resource, name, value))
        })
        .map(|(key, resource)| (key.clone(), resource.clone())))
}

/// A transaction entry after validation, ready to be applied
struct StagedEntry {
    key: ResourceKey,
    resource: Resource,
    created: bool,
}

fn stage_entry(
    index: usize,
    entry: &BundleEntry,
    existing: &IndexMap<ResourceKey, Resource>,
) -> Result<StagedEntry, StoreError> {
    let reject = |message: String| StoreError::TransactionRejected { index, message };

    let request = entry
        .request
        .as_ref()
        .ok_or_else(|| reject("entry has no request".to_string()))?;
    let mut resource = entry
        .resource
        .clone()
        .ok_or_else(|| reject("entry has no resource".to_string()))?;
    let resource_type = resource
        .resource_type()
        .ok_or_else(|| reject("resource has no resourceType".to_string()))?
        .to_string();

    match request.method {
        HttpVerb::Put => {
            let target = ResourceKey::parse(&request.url)
                .ok_or_else(|| reject(format!("PUT url '{}' is not Type/id", request.url)))?;
            if target.resource_type != resource_type {
                return Err(reject(format!(
                    "PUT url '{}' does not match resource type {}",
                    request.url, resource_type
                )));
            }
            match resource.id() {
                Some(id) if id != target.id => {
                    return Err(reject(format!(
                        "PUT url '{}' does not match resource id {}",
                        request.url, id
                    )));
                }
                Some(_) => {}
                None => resource.set_id(target.id.clone()),
            }
            let created = !existing.contains_key(&target);
            Ok(StagedEntry {
                key: target,
                resource,
                created,
            })
        }
        HttpVerb::Post => {
            if request.url != resource_type {
                return Err(reject(format!(
                    "POST url '{}' does not match resource type {}",
                    request.url, resource_type
                )));
            }
            if let Some(condition) = request.extra.get("ifNoneExist").and_then(Value::as_str) {
                if let Some((key, found)) =
                    find_existing(existing, &resource_type, condition).map_err(reject)?
                {
                    return Ok(StagedEntry {
                        key,
                        resource: found,
                        created: false,
                    });
                }
            }
            let id = uuid::Uuid::new_v4().to_string();
            resource.set_id(id.clone());
            Ok(StagedEntry {
                key: ResourceKey::new(resource_type, id),
                resource,
                created: true,
            })
        }
        other => Err(reject(format!("unsupported method {}", other))),
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn read(&self, key: &ResourceKey) -> Result<Option<Resource>, StoreError> {
        Ok(self.get(key))
    }

    async fn search(
        &self,
        resource_type: &str,
        params: &SearchParams,
    ) -> Result<Vec<Resource>, StoreError> {
        if let Some((name, _)) = params
            .criteria
            .iter()
            .find(|(name, _)| !SUPPORTED_SEARCH_PARAMETERS.contains(&name.as_str()))
        {
            return Err(StoreError::UnsupportedSearchParameter {
                resource_type: resource_type.to_string(),
                parameter: name.clone(),
            });
        }

        let resources = self.resources.read();
        Ok(resources
            .iter()
            .filter(|(key, _)| key.resource_type == resource_type)
            .map(|(_, resource)| resource)
            .filter(|resource| {
                params
                    .criteria
                    .iter()
                    .all(|(name, value)| matches_criterion(resource, name, value))
            })
            .take(params.count)
            .cloned()
            .collect())
    }

    async fn update(&self, resource: Resource) -> Result<Resource, StoreError> {
        let key = resource.key().ok_or_else(|| {
            StoreError::InvalidRequest("update requires a resource with type and id".to_string())
        })?;
        self.resources.write().insert(key, resource.clone());
        Ok(resource)
    }

    async fn apply_transaction(&self, bundle: Bundle) -> Result<Bundle, StoreError> {
        if !bundle.is_type(BundleType::Transaction) {
            return Err(StoreError::InvalidRequest(
                "bundle is not a transaction".to_string(),
            ));
        }

        let mut resources = self.resources.write();

        let mut staged = Vec::with_capacity(bundle.entry.len());
        for (index, entry) in bundle.entry.iter().enumerate() {
            staged.push(stage_entry(index, entry, &resources)?);
        }

        let mut response = Bundle::new(BundleType::TransactionResponse);
        for StagedEntry {
            key,
            resource,
            created,
        } in staged
        {
            let status = if created { "201 Created" } else { "200 OK" };
            response.entry.push(BundleEntry {
                response: Some(BundleResponse {
                    status: status.to_string(),
                    location: Some(key.to_string()),
                    last_modified: None,
                }),
                ..Default::default()
            });
            resources.insert(key, resource);
        }

        log::debug!("Applied transaction with {} entries", response.entry.len());
        Ok(response)
    }
}
