//! Lazily-hydrated client-side representation of one server-side entity.
//!
//! A [`Resource`] is an attribute bag over the JSON object the server
//! returned, plus a load flag and the request identifiers of the responses
//! that produced or refreshed it. Resources built from partial payloads
//! hydrate themselves at most once, through the manager seam captured as a
//! [`Fetch`] handle.

use crate::error::{Error, Result};
use crate::meta::RequestIds;
use crate::transport::ResponseMeta;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Seam through which an unloaded resource refetches itself by id.
///
/// Implemented by managers that expose a `get` operation. A resource whose
/// manager has no `get` simply fails attribute resolution after the no-op
/// load attempt.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a fresh, fully-loaded snapshot of the resource with this id.
    async fn fetch(&self, id: &Value) -> Result<Resource>;
}

/// One server-side entity snapshot.
#[derive(Clone)]
pub struct Resource {
    type_name: &'static str,
    info: Map<String, Value>,
    loaded: bool,
    request_ids: RequestIds,
    fetcher: Option<Arc<dyn Fetch>>,
}

impl Resource {
    /// Create a resource from a decoded object body.
    #[must_use]
    pub fn new(type_name: &'static str, info: Map<String, Value>, loaded: bool) -> Self {
        Self {
            type_name,
            info,
            loaded,
            request_ids: RequestIds::new(),
            fetcher: None,
        }
    }

    /// Create a resource from an arbitrary decoded body, which must be an
    /// object.
    pub fn from_value(type_name: &'static str, value: Value, loaded: bool) -> Result<Self> {
        match value {
            Value::Object(info) => Ok(Self::new(type_name, info, loaded)),
            other => Err(Error::DecodeError(format!(
                "expected an object for {type_name}, got {other}"
            ))),
        }
    }

    /// Install the manager back-reference used for lazy loading. The
    /// resource does not own its manager; it holds a shared handle to the
    /// fetch seam only.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Record the request identifier of the producing response.
    #[must_use]
    pub fn with_response(mut self, meta: &ResponseMeta) -> Self {
        self.request_ids.record(meta);
        self
    }

    /// Resource type name, used in display output and error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Read an attribute without triggering a lazy load.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.info.get(name)
    }

    /// The resource id, if the payload carried one.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.info.get("id")
    }

    /// Read an attribute, hydrating the resource first if it was built
    /// from a partial payload.
    ///
    /// The load happens at most once: the resource is marked loaded before
    /// the fetch is attempted, so a failed fetch is not retried and an
    /// attribute still missing afterwards is a [`Error::MissingAttribute`].
    pub async fn attr(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.info.get(name) {
            return Ok(value.clone());
        }

        if !self.loaded {
            // Mark loaded first, so if the fetch bails we know we tried.
            self.loaded = true;
            if let (Some(fetcher), Some(id)) = (self.fetcher.clone(), self.id().cloned()) {
                let fresh = fetcher.fetch(&id).await?;
                self.absorb(fresh);
            }
            if let Some(value) = self.info.get(name) {
                return Ok(value.clone());
            }
        }

        Err(Error::MissingAttribute {
            resource: self.type_name.to_string(),
            name: name.to_string(),
        })
    }

    /// Merge a freshly fetched snapshot into this resource: attribute
    /// values are overwritten and the fetch's request identifiers are
    /// appended.
    pub fn absorb(&mut self, fresh: Resource) {
        self.request_ids.merge(&fresh.request_ids);
        self.apply_details(fresh.info);
    }

    /// Apply a set of attribute values, overwriting existing keys.
    pub fn apply_details(&mut self, info: Map<String, Value>) {
        for (key, value) in info {
            self.info.insert(key, value);
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.info.remove(name)
    }

    /// Whether the resource has been (or no longer needs to be) loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Force the load flag.
    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// Identifiers of the responses that produced or refreshed this
    /// resource.
    #[must_use]
    pub fn request_ids(&self) -> &RequestIds {
        &self.request_ids
    }

    /// Deep, independent copy of the attribute mapping.
    #[must_use]
    pub fn to_dict(&self) -> Map<String, Value> {
        self.info.clone()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.info == other.info
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type_name", &self.type_name)
            .field("info", &self.info)
            .field("loaded", &self.loaded)
            .field("request_ids", &self.request_ids)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.info.keys().collect();
        keys.sort();
        write!(f, "<{}", self.type_name)?;
        for key in keys {
            match &self.info[key.as_str()] {
                Value::String(s) => write!(f, " {key}={s}")?,
                other => write!(f, " {key}={other}")?,
            }
        }
        write!(f, ">")
    }
}

/// Conversion accepting either a resource or a bare identifier wherever a
/// relationship is passed.
pub trait ToResourceId {
    /// The identifier value to send to the server.
    fn resource_id(&self) -> Value;
}

impl ToResourceId for Resource {
    fn resource_id(&self) -> Value {
        self.id().cloned().unwrap_or(Value::Null)
    }
}

impl ToResourceId for i64 {
    fn resource_id(&self) -> Value {
        Value::from(*self)
    }
}

impl ToResourceId for &str {
    fn resource_id(&self) -> Value {
        Value::from(*self)
    }
}

impl ToResourceId for String {
    fn resource_id(&self) -> Value {
        Value::from(self.as_str())
    }
}

impl ToResourceId for Value {
    fn resource_id(&self) -> Value {
        self.clone()
    }
}

/// Render an id value as a URL path segment.
#[must_use]
pub fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use serde_json::json;

    mock! {
        pub Fetcher {}

        #[async_trait]
        impl Fetch for Fetcher {
            async fn fetch(&self, id: &Value) -> Result<Resource>;
        }
    }

    fn info(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn to_dict_is_a_deep_independent_copy() {
        let resource = Resource::new(
            "Allocation",
            info(json!({"id": 1, "quotas": [{"zone": "nectar"}]})),
            true,
        );
        let mut dict = resource.to_dict();
        dict.insert("id".to_string(), json!(999));
        dict.get_mut("quotas")
            .and_then(Value::as_array_mut)
            .map(Vec::clear);

        assert_eq!(resource.get("id"), Some(&json!(1)));
        assert_eq!(
            resource.get("quotas"),
            Some(&json!([{"zone": "nectar"}]))
        );
    }

    #[test]
    fn equality_is_info_deep_equality() {
        let a = Resource::new("Zone", info(json!({"id": 1, "name": "melbourne"})), true);
        let b = Resource::new("Zone", info(json!({"id": 1, "name": "melbourne"})), false);
        let c = Resource::new("Zone", info(json!({"id": 2, "name": "monash"})), true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn equality_requires_same_type() {
        let a = Resource::new("Zone", info(json!({"id": 1})), true);
        let b = Resource::new("Site", info(json!({"id": 1})), true);
        assert_ne!(a, b);
    }

    #[test]
    fn display_sorts_attributes_alphabetically() {
        let resource = Resource::new(
            "Zone",
            info(json!({"name": "melbourne", "id": 3, "enabled": true})),
            true,
        );
        assert_eq!(
            resource.to_string(),
            "<Zone enabled=true id=3 name=melbourne>"
        );
    }

    #[tokio::test]
    async fn lazy_load_merges_fetched_attributes() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq(json!(7)))
            .times(1)
            .returning(|_| {
                Ok(Resource::new(
                    "Allocation",
                    info(json!({"id": 7, "project_name": "genomics"})),
                    true,
                ))
            });

        let mut resource = Resource::new("Allocation", info(json!({"id": 7})), false)
            .with_fetcher(Arc::new(fetcher));

        let value = resource.attr("project_name").await.unwrap();
        assert_eq!(value, json!("genomics"));
        assert!(resource.is_loaded());
    }

    #[tokio::test]
    async fn lazy_load_happens_at_most_once() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_| {
            Ok(Resource::new(
                "Allocation",
                info(json!({"id": 7, "status": "A"})),
                true,
            ))
        });

        let mut resource = Resource::new("Allocation", info(json!({"id": 7})), false)
            .with_fetcher(Arc::new(fetcher));

        assert_eq!(resource.attr("status").await.unwrap(), json!("A"));
        // Still missing after the single load attempt: error, no refetch.
        let err = resource.attr("never_there").await.unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_retried() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(Error::TransportError("connection refused".to_string())));

        let mut resource = Resource::new("Allocation", info(json!({"id": 7})), false)
            .with_fetcher(Arc::new(fetcher));

        let err = resource.attr("status").await.unwrap_err();
        assert!(matches!(err, Error::TransportError(_)));

        // Second read fails with a missing-attribute error and does not
        // touch the fetcher again (the mock would panic on a second call).
        let err = resource.attr("status").await.unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[tokio::test]
    async fn resource_without_fetcher_fails_after_noop_load() {
        let mut resource = Resource::new("Quota", info(json!({"id": 4})), false);
        let err = resource.attr("zone").await.unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
        assert!(resource.is_loaded());
    }

    #[tokio::test]
    async fn loaded_resource_never_fetches() {
        // No fetcher installed: any fetch attempt would be a no-op anyway,
        // but the loaded flag must short-circuit before that.
        let mut resource = Resource::new("Quota", info(json!({"id": 4})), true);
        let err = resource.attr("zone").await.unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn id_segment_renders_strings_bare() {
        assert_eq!(id_segment(&json!("abc")), "abc");
        assert_eq!(id_segment(&json!(42)), "42");
    }

    #[test]
    fn to_resource_id_accepts_resources_and_bare_ids() {
        let resource = Resource::new("Allocation", info(json!({"id": 123})), true);
        assert_eq!(resource.resource_id(), json!(123));
        assert_eq!(123i64.resource_id(), json!(123));
        assert_eq!("abc".resource_id(), json!("abc"));
    }
}
