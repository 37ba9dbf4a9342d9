//! Research grant resources and their manager.
//!
//! Grants record the funding behind an allocation request. They are plain
//! CRUD records with no nested structure.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One grant record.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    resource: Resource,
}

impl Grant {
    /// Wrap a raw resource as a grant.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Grant record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Grant type code, for example `arc` or `nhmrc`.
    #[must_use]
    pub fn grant_type(&self) -> Option<&str> {
        self.resource.get("grant_type").and_then(Value::as_str)
    }

    /// External grant identifier issued by the funding body.
    #[must_use]
    pub fn grant_id(&self) -> Option<&str> {
        self.resource.get("grant_id").and_then(Value::as_str)
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

/// Payload for recording a grant against an allocation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGrantRequest {
    /// Owning allocation id.
    pub allocation: Value,
    /// Grant type code.
    pub grant_type: String,
    /// Funding body and scheme description.
    pub funding_body_scheme: String,
    /// External grant identifier.
    pub grant_id: String,
    /// First calendar year of funding.
    pub first_year_funded: u32,
    /// Last calendar year of funding.
    pub last_year_funded: u32,
    /// Total funding amount in dollars.
    pub total_funding: u64,
}

/// Manager for `/grants/`.
#[derive(Debug, Clone)]
pub struct GrantManager {
    basic: BasicManager,
}

impl GrantManager {
    /// Create a grant manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Grant", "grants"),
        }
    }

    /// List grants matching the filter parameters.
    pub async fn list(&self, params: &[(String, String)]) -> Result<ListWithMeta<Grant>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let grants = listed
            .into_inner()
            .into_iter()
            .map(Grant::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(grants, request_ids))
    }

    /// Fetch one grant by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Grant> {
        Ok(Grant::from_resource(self.basic.get(id).await?))
    }

    /// Record a grant against an allocation.
    pub async fn create(
        &self,
        allocation: impl ToResourceId,
        grant_type: &str,
        funding_body_scheme: &str,
        grant_id: &str,
        first_year_funded: u32,
        last_year_funded: u32,
        total_funding: u64,
    ) -> Result<Grant> {
        let request = CreateGrantRequest {
            allocation: allocation.resource_id(),
            grant_type: grant_type.to_string(),
            funding_body_scheme: funding_body_scheme.to_string(),
            grant_id: grant_id.to_string(),
            first_year_funded,
            last_year_funded,
            total_funding,
        };
        let data = serde_json::to_value(&request)?;
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Grant::from_resource(created))
    }

    /// Delete a grant by id.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        self.basic
            .manager()
            .delete(&self.basic.member_url(&id), None)
            .await
    }

    /// All grants whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Grant>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Grant::from_resource).collect())
    }
}
