//! Quota resources and their manager.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::params::QueryParams;
use nectar_core::resource::{id_segment, Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::{json, Value};
use std::sync::Arc;

/// One quota record: a resource name, a zone and the granted amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Quota {
    resource: Resource,
}

impl Quota {
    /// Wrap a raw resource as a quota.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Quota record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Fully-qualified resource name, `service-type.resource`.
    #[must_use]
    pub fn resource_name(&self) -> Option<&str> {
        self.resource.get("resource").and_then(Value::as_str)
    }

    /// Service type component of the resource name.
    #[must_use]
    pub fn service_type(&self) -> Option<&str> {
        self.resource_name()
            .map(|name| name.split_once('.').map_or(name, |(st, _)| st))
    }

    /// Resource component of the resource name, after the service type.
    #[must_use]
    pub fn resource_suffix(&self) -> Option<&str> {
        self.resource_name()
            .and_then(|name| name.split_once('.').map(|(_, suffix)| suffix))
    }

    /// Zone the quota applies to.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.resource.get("zone").and_then(Value::as_str)
    }

    /// Granted amount. `-1` means unlimited.
    #[must_use]
    pub fn quota(&self) -> Option<i64> {
        self.resource.get("quota").and_then(Value::as_i64)
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

/// Filters accepted by the quota list endpoint.
///
/// The API nests quotas under quota groups, so the caller-facing filter
/// names translate to `group__*` query parameters on the wire.
#[derive(Debug, Default, Clone)]
pub struct QuotaListParams {
    /// Filter by owning allocation.
    pub allocation: Option<Value>,
    /// Filter by zone name.
    pub zone: Option<String>,
    /// Filter by service type.
    pub service_type: Option<String>,
}

impl QuotaListParams {
    /// Filter by owning allocation, given as a resource or a bare id.
    #[must_use]
    pub fn with_allocation(mut self, allocation: impl ToResourceId) -> Self {
        self.allocation = Some(allocation.resource_id());
        self
    }

    /// Filter by zone name.
    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Filter by service type.
    #[must_use]
    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    /// Convert the filters into wire query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut params = QueryParams::new();
        params.push_opt(
            "group__allocation",
            self.allocation.as_ref().map(id_segment),
        );
        params.push_opt("group__zone", self.zone.as_deref());
        params.push_opt("group__service_type", self.service_type.as_deref());
        params.into_pairs()
    }
}

/// Manager for `/quotas/`.
#[derive(Debug, Clone)]
pub struct QuotaManager {
    basic: BasicManager,
}

impl QuotaManager {
    /// Create a quota manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Quota", "quotas"),
        }
    }

    /// List quotas matching the filters.
    pub async fn list(&self, params: &QuotaListParams) -> Result<ListWithMeta<Quota>> {
        let listed = self.basic.list(&params.to_pairs()).await?;
        Ok(map_quotas(listed))
    }

    /// Fetch one quota by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Quota> {
        Ok(Quota::from_resource(self.basic.get(id).await?))
    }

    /// Create a quota against an allocation.
    pub async fn create(
        &self,
        allocation: impl ToResourceId,
        resource: &str,
        zone: &str,
        quota: i64,
        requested_quota: Option<i64>,
    ) -> Result<Quota> {
        let data = json!({
            "allocation": allocation.resource_id(),
            "resource": resource,
            "zone": zone,
            "quota": quota,
            "requested_quota": requested_quota.unwrap_or(quota),
        });
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Quota::from_resource(created))
    }

    /// Delete a quota by id.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        self.basic
            .manager()
            .delete(&self.basic.member_url(&id), None)
            .await
    }

    /// All quotas whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Quota>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Quota::from_resource).collect())
    }

    /// The single quota matching the filters, freshly fetched.
    pub async fn find(&self, filters: &[(&str, Value)]) -> Result<Quota> {
        Ok(Quota::from_resource(self.basic.find(filters).await?))
    }
}

fn map_quotas(listed: ListWithMeta<Resource>) -> ListWithMeta<Quota> {
    let request_ids: RequestIds = listed.request_ids().clone();
    let quotas = listed
        .into_inner()
        .into_iter()
        .map(Quota::from_resource)
        .collect();
    WithMeta::with_request_ids(quotas, request_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(value: Value) -> Quota {
        Quota::from_resource(Resource::from_value("Quota", value, true).unwrap())
    }

    #[test]
    fn resource_name_splits_into_service_type_and_suffix() {
        let q = quota(json!({"id": 1, "resource": "compute.cores", "zone": "nectar", "quota": 4}));
        assert_eq!(q.service_type(), Some("compute"));
        assert_eq!(q.resource_suffix(), Some("cores"));
        assert_eq!(q.quota(), Some(4));
    }

    #[test]
    fn undotted_resource_name_is_its_own_service_type() {
        let q = quota(json!({"id": 1, "resource": "rating"}));
        assert_eq!(q.service_type(), Some("rating"));
        assert_eq!(q.resource_suffix(), None);
    }

    #[test]
    fn list_params_translate_to_group_filters() {
        let params = QuotaListParams::default()
            .with_allocation(123i64)
            .with_zone("nectar")
            .with_service_type("compute");
        assert_eq!(
            params.to_pairs(),
            vec![
                ("group__allocation".to_string(), "123".to_string()),
                ("group__zone".to_string(), "nectar".to_string()),
                ("group__service_type".to_string(), "compute".to_string()),
            ]
        );
    }

    #[test]
    fn empty_params_produce_no_pairs() {
        assert!(QuotaListParams::default().to_pairs().is_empty());
    }
}
