//! Availability zone resources and their manager.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::Value;
use std::sync::Arc;

/// One availability zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    resource: Resource,
}

impl Zone {
    /// Wrap a raw resource as a zone.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Zone name, which doubles as its identifier.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.resource.get("name").and_then(Value::as_str)
    }

    /// Human-readable zone name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.resource.get("display_name").and_then(Value::as_str)
    }

    /// Whether the zone currently accepts allocations.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.resource
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }

    /// Flattened attribute mapping.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Map<String, Value> {
        self.resource.to_dict()
    }
}

/// Manager for `/zones/`.
#[derive(Debug, Clone)]
pub struct ZoneManager {
    basic: BasicManager,
}

impl ZoneManager {
    /// Create a zone manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Zone", "zones"),
        }
    }

    /// List zones matching the filter parameters.
    pub async fn list(&self, params: &[(String, String)]) -> Result<ListWithMeta<Zone>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let zones = listed
            .into_inner()
            .into_iter()
            .map(Zone::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(zones, request_ids))
    }

    /// Fetch one zone by name.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Zone> {
        Ok(Zone::from_resource(self.basic.get(id).await?))
    }

    /// All zones whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Zone>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Zone::from_resource).collect())
    }

    /// The single zone matching the filters, freshly fetched.
    pub async fn find(&self, filters: &[(&str, Value)]) -> Result<Zone> {
        Ok(Zone::from_resource(self.basic.find(filters).await?))
    }

    /// Mapping of compute home site names to their zone name lists,
    /// passed through verbatim.
    pub async fn compute_homes(&self) -> Result<WithMeta<RawBody>> {
        self.basic
            .manager()
            .get_raw("/zones/compute_homes/", None, None)
            .await
    }
}
