//! Chief investigator records attached to an allocation.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One chief investigator record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiefInvestigator {
    resource: Resource,
}

impl ChiefInvestigator {
    /// Wrap a raw resource as a chief investigator.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// Record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Contact email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.resource.get("email").and_then(Value::as_str)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }
}

/// Payload for recording a chief investigator.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChiefInvestigatorRequest {
    /// Owning allocation id.
    pub allocation: Value,
    /// Honorific title.
    pub title: String,
    /// Given name.
    pub given_name: String,
    /// Surname.
    pub surname: String,
    /// Contact email address.
    pub email: String,
    /// Home institution.
    pub institution: String,
    /// Other researchers involved in the project.
    pub additional_researchers: String,
}

/// Manager for `/chiefinvestigators/`.
#[derive(Debug, Clone)]
pub struct ChiefInvestigatorManager {
    basic: BasicManager,
}

impl ChiefInvestigatorManager {
    /// Create a chief investigator manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "ChiefInvestigator", "chiefinvestigators"),
        }
    }

    /// List chief investigators matching the filter parameters.
    pub async fn list(
        &self,
        params: &[(String, String)],
    ) -> Result<ListWithMeta<ChiefInvestigator>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let investigators = listed
            .into_inner()
            .into_iter()
            .map(ChiefInvestigator::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(investigators, request_ids))
    }

    /// Fetch one chief investigator by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<ChiefInvestigator> {
        Ok(ChiefInvestigator::from_resource(self.basic.get(id).await?))
    }

    /// Record a chief investigator against an allocation.
    pub async fn create(
        &self,
        request: &CreateChiefInvestigatorRequest,
    ) -> Result<ChiefInvestigator> {
        let data = serde_json::to_value(request)?;
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(ChiefInvestigator::from_resource(created))
    }

    /// Delete a chief investigator record by id.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        self.basic
            .manager()
            .delete(&self.basic.member_url(&id), None)
            .await
    }

    /// All chief investigators whose attributes equal every filter pair.
    pub async fn findall(
        &self,
        filters: &[(&str, Value)],
    ) -> Result<Vec<ChiefInvestigator>> {
        let found = self.basic.findall(filters).await?;
        Ok(found
            .into_iter()
            .map(ChiefInvestigator::from_resource)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_serializes_all_fields() {
        let request = CreateChiefInvestigatorRequest {
            allocation: json!(42),
            title: "Dr".to_string(),
            given_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.edu".to_string(),
            institution: "University of Melbourne".to_string(),
            additional_researchers: String::new(),
        };
        let data = serde_json::to_value(&request).unwrap();
        assert_eq!(data["allocation"], 42);
        assert_eq!(data["surname"], "Lovelace");
        assert_eq!(data["additional_researchers"], "");
    }

    #[test]
    fn accessors_read_the_payload() {
        let ci = ChiefInvestigator::from_resource(
            Resource::from_value(
                "ChiefInvestigator",
                json!({"id": 6, "email": "ada@example.edu"}),
                true,
            )
            .unwrap(),
        );
        assert_eq!(ci.id(), Some(6));
        assert_eq!(ci.email(), Some("ada@example.edu"));
    }
}
