//! Publication records attached to an allocation.

use crate::Result;
use nectar_core::manager::{BasicManager, Findable};
use nectar_core::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use nectar_core::resource::{Resource, ToResourceId};
use nectar_core::transport::Transport;
use serde_json::{json, Value};
use std::sync::Arc;

/// One publication record.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    resource: Resource,
}

impl Publication {
    /// Wrap a raw resource as a publication.
    #[must_use]
    pub fn from_resource(resource: Resource) -> Self {
        Self { resource }
    }

    /// Publication record id.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.resource.id().and_then(Value::as_i64)
    }

    /// Publication citation or reference.
    #[must_use]
    pub fn publication(&self) -> Option<&str> {
        self.resource.get("publication").and_then(Value::as_str)
    }

    /// Read any attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resource.get(name)
    }
}

/// Manager for `/publications/`.
#[derive(Debug, Clone)]
pub struct PublicationManager {
    basic: BasicManager,
}

impl PublicationManager {
    /// Create a publication manager over the given transport.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>) -> Self {
        Self {
            basic: BasicManager::new(api, "Publication", "publications"),
        }
    }

    /// List publications matching the filter parameters.
    pub async fn list(
        &self,
        params: &[(String, String)],
    ) -> Result<ListWithMeta<Publication>> {
        let listed = self.basic.list(params).await?;
        let request_ids: RequestIds = listed.request_ids().clone();
        let publications = listed
            .into_inner()
            .into_iter()
            .map(Publication::from_resource)
            .collect();
        Ok(WithMeta::with_request_ids(publications, request_ids))
    }

    /// Fetch one publication by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Publication> {
        Ok(Publication::from_resource(self.basic.get(id).await?))
    }

    /// Record a publication against an allocation.
    pub async fn create(
        &self,
        allocation: impl ToResourceId,
        publication: &str,
    ) -> Result<Publication> {
        let data = json!({
            "allocation": allocation.resource_id(),
            "publication": publication,
        });
        let created = self
            .basic
            .manager()
            .create(&self.basic.collection_url(), Some(&data), None, None)
            .await?;
        Ok(Publication::from_resource(created))
    }

    /// Delete a publication record by id.
    pub async fn delete(&self, id: impl ToResourceId) -> Result<WithMeta<RawBody>> {
        let id = id.resource_id();
        self.basic
            .manager()
            .delete(&self.basic.member_url(&id), None)
            .await
    }

    /// All publications whose attributes equal every filter pair.
    pub async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Publication>> {
        let found = self.basic.findall(filters).await?;
        Ok(found.into_iter().map(Publication::from_resource).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_the_payload() {
        let publication = Publication::from_resource(
            Resource::from_value(
                "Publication",
                json!({"id": 2, "publication": "doi:10.1000/xyz", "allocation": 42}),
                true,
            )
            .unwrap(),
        );
        assert_eq!(publication.id(), Some(2));
        assert_eq!(publication.publication(), Some("doi:10.1000/xyz"));
    }
}
