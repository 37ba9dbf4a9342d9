//! Organisation resources and their manager.
//!
//! Organisations are the research bodies allocations are attributed to.
//! New entries are proposed by users and vetted by approvers, hence the
//! approve/decline actions.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One organisation record.
#[derive(Debug, Clone, PartialEq)]
pub struct Organisation {
    resource: Resource,
}

impl Organisation {
    /// Wrap a raw resource as an organisation.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// The underlying attribute bag.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Organisation record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Full organisation name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.resource.get("full_name").and_then(Value::as_str)
    }

    /// Research Organization Registry identifier, if registered.
    #[must_use]
    pub fn ror_id(&self) -> Option<&str> {
        self.resource.get("ror_id").and_then(Value::as_str)
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

impl ToResourceId for Organisation {
    fn resource_id(&self) -> Value {
        self.resource.resource_id()
    }
}

/// Payload for proposing an organisation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrganisationRequest {
    /// Research Organization Registry identifier.
    pub ror_id: String,
    /// Full organisation name.
    pub full_name: Option<String>,
    /// Short organisation name.
    pub short_name: Option<String>,
    /// Organisation web site.
    pub url: String,
    /// ISO country code.
    pub country: String,
    /// User who proposed the entry.
    pub proposed_by: Option<String>,
    /// Approver who vetted the entry.
    pub vetted_by: Option<String>,
    /// Parent organisation id.
    pub parent: Option<Value>,
    /// Organisation this entry supersedes.
    pub precedes: Option<Value>,
    /// Whether the organisation is selectable.
    pub enabled: bool,
}

impl CreateOrganisationRequest {
    /// Create a proposal with the standard defaults.
    #[must_use]
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            ror_id: String::new(),
            full_name: Some(full_name.into()),
            short_name: None,
            url: String::new(),
            country: "AU".to_string(),
            proposed_by: None,
            vetted_by: None,
            parent: None,
            precedes: None,
            enabled: true,
        }
    }
}

/// Manager for `/organisations/`.
#[derive(Debug, Clone)]
pub struct OrganisationManager {
    basic: BasicManager,
}

impl OrganisationManager {
    /// Create an organisation manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Organisation", "organisations"),
        }
    }

    /// List organisations matching the filter parameters.
    pub async fn list(
        &self,
        params: &[(String, String)],
    ) -> Result<ListWithMeta<Organisation>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let organisations = listed
            .into_inner()
            .into_iter()
            .map(Organisation::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(organisations, request_ids))
    }

    /// Fetch one organisation by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Organisation> {
        Ok(Organisation::from_resource(self.basic.get(id).await?))
    }

    /// Propose a new organisation.
    pub async fn create(&self, request: &CreateOrganisationRequest) -> Result<Organisation> {
        let data = serde_json::to_value(request)?;
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Organisation::from_resource(created))
    }

    /// Approve a proposed organisation.
    pub async fn approve(&self, id: impl ToResourceId) -> Result<Organisation> {
        self.action(id, "approve").await
    }

    /// Decline a proposed organisation.
    pub async fn decline(&self, id: impl ToResourceId) -> Result<Organisation> {
        self.action(id, "decline").await
    }

    /// All organisations whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Organisation>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Organisation::from_resource).collect())
    }

    async fn action(&self, id: impl ToResourceId, action: &str) -> Result<Organisation> {
        let id = id.resource_id();
        let url = format!("{}{action}/", self.basic.member_url(&id));
        let created = self.basic.manager().create(&url, None, None, None).await?;
        Ok(Organisation::from_resource(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_defaults() {
        let request = CreateOrganisationRequest::new("University of Melbourne");
        let data = serde_json::to_value(&request).unwrap();
        assert_eq!(data["full_name"], "University of Melbourne");
        assert_eq!(data["country"], "AU");
        assert_eq!(data["enabled"], true);
        assert_eq!(data["ror_id"], "");
        assert_eq!(data["parent"], Value::Null);
    }

    #[test]
    fn accessors_read_the_payload() {
        let org = Organisation::from_resource(
            Resource::from_value(
                "Organisation",
                json!({"id": 9, "full_name": "Monash University", "ror_id": "02bfwt286"}),
                true,
            )
            .unwrap(),
        );
        assert_eq!(org.id(), Some(9));
        assert_eq!(org.full_name(), Some("Monash University"));
        assert_eq!(org.ror_id(), Some("02bfwt286"));
    }
}
