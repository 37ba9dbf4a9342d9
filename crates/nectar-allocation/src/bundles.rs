//! Quota bundle resources and their manager.
//!
//! A bundle is a named, pre-approved set of quotas that an allocation can
//! request wholesale. Like allocations, the raw `quotas` payload is
//! re-modelled as constructed [`Quota`] sub-resources.

use crate::quotas::Quota;
use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::Value;
use std::sync::Arc;

/// One quota bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    resource: Resource,
    /// Bundled quotas, constructed from the raw payload.
    pub quotas: Vec<Quota>,
}

impl Bundle {
    /// Wrap a raw resource as a bundle, constructing its quota
    /// sub-resources.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        let quotas = resource
            .get("quotas")
            .and_then(Value::as_array)
            .map(|raw| {
                raw.iter()
                    .filter_map(|item| {
                        Resource::from_value("BundleQuota", item.clone(), false).ok()
                    })
                    .map(Quota::from_resource)
                    .collect()
            })
            .unwrap_or_default();
        Self { resource, quotas }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Bundle id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Bundle name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.resource.get("name").and_then(Value::as_str)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }

    /// Flattened attribute mapping, as received from the server.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Map<String, Value> {
        self.resource.to_dict()
    }
}

impl ToResourceId for Bundle {
    fn resource_id(&self) -> Value {
        self.resource.resource_id()
    }
}

/// Manager for `/bundles/`.
#[derive(Debug, Clone)]
pub struct BundleManager {
    basic: BasicManager,
}

impl BundleManager {
    /// Create a bundle manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Bundle", "bundles"),
        }
    }

    /// List bundles matching the filter parameters.
    pub async fn list(&self, params: &[(String, String)]) -> Result<ListWithMeta<Bundle>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let bundles = listed
            .into_inner()
            .into_iter()
            .map(Bundle::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(bundles, request_ids))
    }

    /// Fetch one bundle by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Bundle> {
        Ok(Bundle::from_resource(self.basic.get(id).await?))
    }

    /// All bundles whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Bundle>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Bundle::from_resource).collect())
    }

    /// The single bundle matching the filters, freshly fetched.
    pub async fn find(&self, filters: &[(&str, Value)]) -> Result<Bundle> {
        Ok(Bundle::from_resource(self.basic.find(filters).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_resource_constructs_quota_sub_resources() {
        let bundle = Bundle::from_resource(
            Resource::from_value(
                "Bundle",
                json!({
                    "id": 3,
                    "name": "silver",
                    "quotas": [
                        {"id": 1, "resource": "compute.cores", "quota": 16},
                        {"id": 2, "resource": "volume.gigabytes", "zone": "melbourne", "quota": 500}
                    ]
                }),
                true,
            )
            .unwrap(),
        );
        assert_eq!(bundle.name(), Some("silver"));
        assert_eq!(bundle.quotas.len(), 2);
        assert_eq!(bundle.quotas[0].service_type(), Some("compute"));
        assert_eq!(bundle.quotas[1].zone(), Some("melbourne"));
        // The flattened view still carries the raw payload.
        assert!(bundle.to_dict().contains_key("quotas"));
    }

    #[test]
    fn missing_quotas_payload_means_no_sub_resources() {
        let bundle = Bundle::from_resource(
            Resource::from_value("Bundle", json!({"id": 3, "name": "bronze"}), true).unwrap(),
        );
        assert!(bundle.quotas.is_empty());
    }
}
