//! Service type resources and their manager.
//!
//! A service type describes one quota-bearing service (compute, volume,
//! database and so on) together with the resources it offers. The raw
//! `resource_set` payload is taken over and re-modelled as constructed
//! resource definitions.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One service type, with its resource definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceType {
    resource: Resource,
    /// Resource definitions offered by this service, constructed from the
    /// raw `resource_set` payload, which is removed from the bag.
    pub resources: Vec<Resource>,
}

impl ServiceType {
    /// Wrap a raw resource as a service type, taking over its resource
    /// set.
    #[must_use]
    pub fn from_resource(mut resource: Resource) -> Self {
        let resources = resource
            .take("resource_set")
            .and_then(|set| match set {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .map(|items| {
                items
                    .into_iter()
                    .filter_map(|item| Resource::from_value("Resource", item, false).ok())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            resource,
            resources,
        }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Service type identifier, for example `compute`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.resource.id().and_then(Value::as_str)
    }

    /// Name of the service in the cloud catalog.
    #[must_use]
    pub fn catalog_name(&self) -> Option<&str> {
        self.resource.get("catalog_name").and_then(Value::as_str)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }
}

impl ToResourceId for ServiceType {
    fn resource_id(&self) -> Value {
        self.resource.resource_id()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ServiceType {}>", self.catalog_name().unwrap_or("?"))
    }
}

/// Manager for `/service-types/`.
#[derive(Debug, Clone)]
pub struct ServiceTypeManager {
    basic: BasicManager,
}

impl ServiceTypeManager {
    /// Create a service type manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "ServiceType", "service-types"),
        }
    }

    /// List service types matching the filter parameters.
    pub async fn list(
        &self,
        params: &[(String, String)],
    ) -> Result<ListWithMeta<ServiceType>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let service_types = listed
            .into_inner()
            .into_iter()
            .map(ServiceType::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(service_types, request_ids))
    }

    /// Fetch one service type by identifier.
    pub async fn get(&self, id: impl ToResourceId) -> Result<ServiceType> {
        Ok(ServiceType::from_resource(self.basic.get(id).await?))
    }

    /// All service types whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<ServiceType>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(ServiceType::from_resource).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_resource_takes_over_the_resource_set() {
        let st = ServiceType::from_resource(
            Resource::from_value(
                "ServiceType",
                json!({
                    "id": "compute",
                    "catalog_name": "nova",
                    "resource_set": [
                        {"id": 1, "quota_name": "cores"},
                        {"id": 2, "quota_name": "instances"}
                    ]
                }),
                true,
            )
            .unwrap(),
        );
        assert_eq!(st.resources.len(), 2);
        assert_eq!(st.resources[0].get("quota_name"), Some(&json!("cores")));
        // The raw field is consumed by the construction.
        assert_eq!(st.get("resource_set"), None);
        assert_eq!(st.to_string(), "<ServiceType nova>");
    }

    #[test]
    fn missing_resource_set_means_no_definitions() {
        let st = ServiceType::from_resource(
            Resource::from_value("ServiceType", json!({"id": "volume"}), true).unwrap(),
        );
        assert!(st.resources.is_empty());
    }
}
