//! Supported institution records attached to an allocation.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::{json, Value};
use std::sync::Arc;

/// One institution record.
#[derive(Debug, Clone, PartialEq)]
pub struct Institution {
    resource: Resource,
}

impl Institution {
    /// Wrap a raw resource as an institution.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// Institution record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Institution name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.resource.get("name").and_then(Value::as_str)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }
}

/// Manager for `/institutions/`.
#[derive(Debug, Clone)]
pub struct InstitutionManager {
    basic: BasicManager,
}

impl InstitutionManager {
    /// Create an institution manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Institution", "institutions"),
        }
    }

    /// List institutions matching the filter parameters.
    pub async fn list(
        &self,
        params: &[(String, String)],
    ) -> Result<ListWithMeta<Institution>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let institutions = listed
            .into_inner()
            .into_iter()
            .map(Institution::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(institutions, request_ids))
    }

    /// Fetch one institution by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Institution> {
        Ok(Institution::from_resource(self.basic.get(id).await?))
    }

    /// Record a supported institution against an allocation.
    pub async fn create(
        &self,
        allocation: impl ToResourceId,
        name: &str,
    ) -> Result<Institution> {
        let data = json!({
            "allocation": allocation.resource_id(),
            "name": name,
        });
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Institution::from_resource(created))
    }

    /// Delete an institution record by id.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        self.basic
            .manager()
            .delete(&self.basic.member_url(&id), None)
            .await
    }

    /// All institutions whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Institution>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Institution::from_resource).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_the_payload() {
        let institution = Institution::from_resource(
            Resource::from_value(
                "Institution",
                json!({"id": 4, "name": "University of Melbourne", "allocation": 42}),
                true,
            )
            .unwrap(),
        );
        assert_eq!(institution.id(), Some(4));
        assert_eq!(institution.name(), Some("University of Melbourne"));
        assert_eq!(institution.get("allocation"), Some(&json!(42)));
    }
}
