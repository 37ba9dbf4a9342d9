//! CRUD operation helpers translating URLs and parameters into resources.
//!
//! A [`Manager`] is a stateless façade bound to one [`Transport`]. It is
//! the only component that constructs [`Resource`] values: it decodes the
//! response body, unwraps the response key, drains pagination and installs
//! the lazy-load fetcher. Managers hold no resource instances and are safe
//! to share wherever the transport is.

use crate::error::{Error, Result};
use crate::meta::{ListWithMeta, RawBody, RequestIds, WithMeta};
use crate::resource::{id_segment, Fetch, Resource, ToResourceId};
use crate::transport::{ResponseMeta, Transport};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;

/// Response key under which list endpoints nest their items.
pub const DEFAULT_RESPONSE_KEY: &str = "results";

/// Result of a listing operation.
///
/// Most endpoints return full records; a few return bare identifier lists,
/// which are passed through verbatim rather than dressed up as resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// Each item was a full record, constructed as a loaded resource.
    Resources(ListWithMeta<Resource>),
    /// Every item was a primitive string; returned untouched.
    Ids(ListWithMeta<String>),
}

impl Listing {
    /// Identifiers accumulated across all pages of the listing.
    #[must_use]
    pub fn request_ids(&self) -> &RequestIds {
        match self {
            Self::Resources(items) => items.request_ids(),
            Self::Ids(items) => items.request_ids(),
        }
    }

    /// Number of items in the listing.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Resources(items) => items.len(),
            Self::Ids(items) => items.len(),
        }
    }

    /// Returns true if the listing is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwrap the resource form, erroring on a bare identifier listing.
    pub fn expect_resources(self) -> Result<ListWithMeta<Resource>> {
        match self {
            Self::Resources(items) => Ok(items),
            Self::Ids(_) => Err(Error::DecodeError(
                "expected full records, server returned bare identifiers".to_string(),
            )),
        }
    }
}

/// Outcome of a PATCH/PUT, which servers may acknowledge without a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Updated {
    /// The server returned the updated record.
    Resource(Resource),
    /// The server acknowledged with no content; the wrapper still carries
    /// the request identifier of the acknowledgement.
    NoContent(WithMeta<String>),
}

impl Updated {
    /// Identifiers of the response that produced this outcome.
    #[must_use]
    pub fn request_ids(&self) -> &RequestIds {
        match self {
            Self::Resource(resource) => resource.request_ids(),
            Self::NoContent(ack) => ack.request_ids(),
        }
    }

    /// Unwrap the updated record, erroring on a bodyless acknowledgement.
    pub fn into_resource(self) -> Result<Resource> {
        match self {
            Self::Resource(resource) => Ok(resource),
            Self::NoContent(_) => Err(Error::DecodeError(
                "server acknowledged the update without returning the record".to_string(),
            )),
        }
    }
}

/// Render filter pairs for error messages.
#[must_use]
pub fn format_filters(filters: &[(&str, Value)]) -> String {
    let rendered: Vec<String> = filters
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect();
    rendered.join(", ")
}

/// Stateless CRUD façade over one transport.
#[derive(Clone)]
pub struct Manager {
    api: Arc<dyn Transport>,
    resource_name: &'static str,
    fetcher: Option<Arc<dyn Fetch>>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("resource_name", &self.resource_name)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Create a manager for the given resource type name.
    #[must_use]
    pub fn new(api: Arc<dyn Transport>, resource_name: &'static str) -> Self {
        Self {
            api,
            resource_name,
            fetcher: None,
        }
    }

    /// Install the fetch seam handed to every constructed resource,
    /// enabling lazy loading.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// The transport this manager is bound to.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn Transport> {
        &self.api
    }

    /// Resource type name used for construction and error messages.
    #[must_use]
    pub fn resource_name(&self) -> &'static str {
        self.resource_name
    }

    /// Issue a GET and decode the body into a listing, draining `next`
    /// pagination with independent follow-up GETs before returning.
    ///
    /// Query parameters apply to the first page only; `next` links carry
    /// their own query. When the body is an object containing
    /// `response_key` the items are read from that sub-value, otherwise
    /// the whole body is treated as the item sequence.
    pub async fn list(
        &self,
        url: &str,
        response_key: Option<&str>,
        params: &[(String, String)],
        headers: Option<&HeaderMap>,
    ) -> Result<Listing> {
        let mut url = url.to_string();
        let mut first_page = true;
        let mut raw_items: Vec<Value> = Vec::new();
        let mut request_ids = RequestIds::new();

        loop {
            let page_params: &[(String, String)] = if first_page { params } else { &[] };
            let (meta, body) = self.api.get(&url, headers, page_params).await?;
            first_page = false;
            request_ids.record(&meta);

            let next = body
                .as_object()
                .and_then(|map| map.get("next"))
                .and_then(Value::as_str)
                .filter(|link| !link.is_empty())
                .map(str::to_string);

            let data = match body {
                Value::Object(mut map) => {
                    match response_key.and_then(|key| map.remove(key)) {
                        Some(nested) => nested,
                        None => Value::Object(map),
                    }
                }
                other => other,
            };

            match data {
                Value::Array(items) => raw_items.extend(items),
                other => {
                    return Err(Error::DecodeError(format!(
                        "expected a list body from {url}, got {other}"
                    )))
                }
            }

            match next {
                Some(link) => url = link,
                None => break,
            }
        }

        self.classify_listing(raw_items, request_ids)
    }

    fn classify_listing(
        &self,
        raw_items: Vec<Value>,
        request_ids: RequestIds,
    ) -> Result<Listing> {
        if !raw_items.is_empty() && raw_items.iter().all(Value::is_string) {
            let ids = raw_items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            return Ok(Listing::Ids(WithMeta::with_request_ids(ids, request_ids)));
        }

        let mut resources = Vec::with_capacity(raw_items.len());
        for item in raw_items {
            // Listing endpoints return complete records; empty entries are
            // skipped rather than turned into hollow resources.
            let skip = match &item {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                _ => false,
            };
            if skip {
                continue;
            }
            resources.push(self.make_resource(item, true, None)?);
        }
        Ok(Listing::Resources(WithMeta::with_request_ids(
            resources,
            request_ids,
        )))
    }

    /// Issue a GET and construct a single loaded resource from the body
    /// (or the `response_key` sub-value).
    pub async fn get(
        &self,
        url: &str,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<Resource> {
        let (meta, body) = self.api.get(url, headers, &[]).await?;
        let body = unwrap_response_key(body, response_key)?;
        self.make_resource(body, true, Some(&meta))
    }

    /// Issue a GET and hand the body back verbatim, classified by shape.
    pub async fn get_raw(
        &self,
        url: &str,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<WithMeta<RawBody>> {
        let (meta, body) = self.api.get(url, headers, &[]).await?;
        let body = unwrap_response_key(body, response_key)?;
        Ok(WithMeta::new(RawBody::classify(body), &meta))
    }

    /// Issue a POST with an optional JSON body and construct a loaded
    /// resource from the response.
    pub async fn create(
        &self,
        url: &str,
        data: Option<&Value>,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<Resource> {
        let (meta, body) = self.api.post(url, data, headers).await?;
        let body = unwrap_response_key(body, response_key)?;
        self.make_resource(body, true, Some(&meta))
    }

    /// Issue a POST and hand the body back verbatim.
    pub async fn create_raw(
        &self,
        url: &str,
        data: Option<&Value>,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<WithMeta<RawBody>> {
        let (meta, body) = self.api.post(url, data, headers).await?;
        let body = unwrap_response_key(body, response_key)?;
        Ok(WithMeta::new(RawBody::classify(body), &meta))
    }

    /// Issue a PATCH. Servers may acknowledge without a body, in which
    /// case the outcome is [`Updated::NoContent`].
    pub async fn update(
        &self,
        url: &str,
        data: &Value,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<Updated> {
        tracing::debug!(url, "updating resource");
        let (meta, body) = self.api.patch(url, data, headers).await?;
        self.updated_outcome(meta, body, response_key)
    }

    /// Issue a PUT, replacing the whole record. Same empty-body handling
    /// as [`Manager::update`].
    pub async fn update_all(
        &self,
        url: &str,
        data: &Value,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<Updated> {
        tracing::debug!(url, "replacing resource");
        let (meta, body) = self.api.put(url, data, headers).await?;
        self.updated_outcome(meta, body, response_key)
    }

    /// Issue a PATCH and hand the body back verbatim.
    pub async fn update_raw(
        &self,
        url: &str,
        data: &Value,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<WithMeta<RawBody>> {
        let (meta, body) = self.api.patch(url, data, headers).await?;
        let body = unwrap_response_key(body, response_key)?;
        Ok(WithMeta::new(RawBody::classify(body), &meta))
    }

    /// Issue a PUT and hand the body back verbatim.
    pub async fn update_all_raw(
        &self,
        url: &str,
        data: &Value,
        response_key: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Result<WithMeta<RawBody>> {
        let (meta, body) = self.api.put(url, data, headers).await?;
        let body = unwrap_response_key(body, response_key)?;
        Ok(WithMeta::new(RawBody::classify(body), &meta))
    }

    /// Issue a DELETE. The body, commonly absent, is passed through the
    /// raw classification.
    pub async fn delete(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<WithMeta<RawBody>> {
        tracing::debug!(url, "deleting resource");
        let (meta, body) = self.api.delete(url, headers).await?;
        Ok(WithMeta::new(RawBody::classify(body), &meta))
    }

    fn updated_outcome(
        &self,
        meta: ResponseMeta,
        body: Value,
        response_key: Option<&str>,
    ) -> Result<Updated> {
        if body.is_null() {
            return Ok(Updated::NoContent(WithMeta::new(String::new(), &meta)));
        }
        let body = unwrap_response_key(body, response_key)?;
        Ok(Updated::Resource(self.make_resource(
            body,
            true,
            Some(&meta),
        )?))
    }

    fn make_resource(
        &self,
        body: Value,
        loaded: bool,
        meta: Option<&ResponseMeta>,
    ) -> Result<Resource> {
        let mut resource = Resource::from_value(self.resource_name, body, loaded)?;
        if let Some(meta) = meta {
            resource = resource.with_response(meta);
        }
        if let Some(fetcher) = &self.fetcher {
            resource = resource.with_fetcher(fetcher.clone());
        }
        Ok(resource)
    }
}

fn unwrap_response_key(body: Value, response_key: Option<&str>) -> Result<Value> {
    let Some(key) = response_key else {
        return Ok(body);
    };
    match body {
        Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            Error::DecodeError(format!("response body has no `{key}` key"))
        }),
        other => Err(Error::DecodeError(format!(
            "expected an object with a `{key}` key, got {other}"
        ))),
    }
}

/// `find`/`findall` for managers that support both `list` and `get`.
///
/// `findall` loads the entire collection and filters client-side on
/// attribute equality. This is an O(n) scan with no indexing; known
/// inefficiency inherited from the API, which offers no server-side
/// lookup by arbitrary attribute.
#[async_trait]
pub trait Findable: Send + Sync {
    /// Resource type name, used in lookup failure messages.
    fn resource_name(&self) -> &'static str;

    /// Load the entire collection, unfiltered.
    async fn list_all(&self) -> Result<ListWithMeta<Resource>>;

    /// Fetch one resource by id.
    async fn get_by_id(&self, id: &Value) -> Result<Resource>;

    /// All resources whose attributes equal every filter pair. Resources
    /// missing a filter attribute are skipped, not errors.
    async fn findall(&self, filters: &[(&str, Value)]) -> Result<Vec<Resource>> {
        let all = self.list_all().await?;
        Ok(all
            .into_inner()
            .into_iter()
            .filter(|resource| {
                filters
                    .iter()
                    .all(|(attr, value)| resource.get(attr) == Some(value))
            })
            .collect())
    }

    /// The single resource matching the filters.
    ///
    /// Zero matches is a not-found error, several matches a non-unique
    /// match. The one hit is re-fetched by id rather than returned from
    /// the listing, so the caller always sees a fresh record.
    async fn find(&self, filters: &[(&str, Value)]) -> Result<Resource> {
        let mut matches = self.findall(filters).await?;
        match matches.len() {
            0 => Err(Error::not_found(
                self.resource_name(),
                format_filters(filters),
            )),
            1 => {
                let hit = matches.remove(0);
                let id = hit.id().cloned().ok_or_else(|| Error::MissingAttribute {
                    resource: self.resource_name().to_string(),
                    name: "id".to_string(),
                })?;
                self.get_by_id(&id).await
            }
            _ => Err(Error::NoUniqueMatch {
                resource: self.resource_name().to_string(),
                filters: format_filters(filters),
            }),
        }
    }
}

/// Fetch seam for resources managed under `/{base_url}/{id}/`.
pub struct BasicFetcher {
    api: Arc<dyn Transport>,
    resource_name: &'static str,
    base_url: &'static str,
}

#[async_trait]
impl Fetch for BasicFetcher {
    async fn fetch(&self, id: &Value) -> Result<Resource> {
        let url = format!("/{}/{}/", self.base_url, id_segment(id));
        let (meta, body) = self.api.get(&url, None, &[]).await?;
        Ok(Resource::from_value(self.resource_name, body, true)?.with_response(&meta))
    }
}

/// Manager for the common `/{base_url}/` + `/{base_url}/{id}/` layout.
#[derive(Debug, Clone)]
pub struct BasicManager {
    inner: Manager,
    base_url: &'static str,
}

impl BasicManager {
    /// Create a manager bound to the conventional collection layout.
    #[must_use]
    pub fn new(
        api: Arc<dyn Transport>,
        resource_name: &'static str,
        base_url: &'static str,
    ) -> Self {
        let fetcher: Arc<dyn Fetch> = Arc::new(BasicFetcher {
            api: api.clone(),
            resource_name,
            base_url,
        });
        Self {
            inner: Manager::new(api, resource_name).with_fetcher(fetcher),
            base_url,
        }
    }

    /// The underlying CRUD helpers, for endpoints outside the layout.
    #[must_use]
    pub fn manager(&self) -> &Manager {
        &self.inner
    }

    /// Collection path, `/{base_url}/`.
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("/{}/", self.base_url)
    }

    /// Member path, `/{base_url}/{id}/`.
    #[must_use]
    pub fn member_url(&self, id: &Value) -> String {
        format!("/{}/{}/", self.base_url, id_segment(id))
    }

    /// List the collection with the given filter parameters.
    pub async fn list(&self, params: &[(String, String)]) -> Result<ListWithMeta<Resource>> {
        self.inner
            .list(
                &self.collection_url(),
                Some(DEFAULT_RESPONSE_KEY),
                params,
                None,
            )
            .await?
            .expect_resources()
    }

    /// Fetch one resource by id.
    pub async fn get(&self, id: impl ToResourceId) -> Result<Resource> {
        let id = id.resource_id();
        self.inner.get(&self.member_url(&id), None, None).await
    }
}

#[async_trait]
impl Findable for BasicManager {
    fn resource_name(&self) -> &'static str {
        self.inner.resource_name()
    }

    async fn list_all(&self) -> Result<ListWithMeta<Resource>> {
        self.list(&[]).await
    }

    async fn get_by_id(&self, id: &Value) -> Result<Resource> {
        self.get(id.clone()).await
    }
}
