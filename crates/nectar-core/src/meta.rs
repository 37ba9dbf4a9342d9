//! Request-identifier tracking and metadata-bearing wrapper types.
//!
//! Every value handed back by a manager carries the identifiers of the
//! responses that produced it, so a caller can correlate client-side
//! results with server-side logs. The wrappers are transparent: equality
//! and iteration behave exactly like the wrapped value, the metadata is
//! additive.

use crate::transport::ResponseMeta;
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};

/// Ordered, deduplicating collection of server-issued request identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIds(Vec<String>);

impl RequestIds {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identifier carried by a response, if any.
    pub fn record(&mut self, meta: &ResponseMeta) {
        if let Some(id) = meta.request_id() {
            self.push(id);
        }
    }

    /// Append a raw identifier value. Used when an identifier is handed
    /// through directly (for example while chaining paginated responses)
    /// rather than extracted from headers. First-seen order is kept and
    /// duplicates are dropped.
    pub fn push(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.0.contains(&id) {
            self.0.push(id);
        }
    }

    /// Merge another collection, preserving order and deduplication.
    pub fn merge(&mut self, other: &RequestIds) {
        for id in &other.0 {
            self.push(id.clone());
        }
    }

    /// The tracked identifiers, in first-seen order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns true if no identifier has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tracked identifiers.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Transparent proxy adding request-identifier provenance to a value.
///
/// Dereferences to the wrapped value; comparison against the bare value
/// ignores the metadata.
#[derive(Debug, Clone, Default)]
pub struct WithMeta<T> {
    value: T,
    request_ids: RequestIds,
}

impl<T> WithMeta<T> {
    /// Wrap a value, recording the identifier of the producing response.
    #[must_use]
    pub fn new(value: T, meta: &ResponseMeta) -> Self {
        let mut request_ids = RequestIds::new();
        request_ids.record(meta);
        Self { value, request_ids }
    }

    /// Wrap a value with pre-accumulated identifiers (pagination).
    #[must_use]
    pub fn with_request_ids(value: T, request_ids: RequestIds) -> Self {
        Self { value, request_ids }
    }

    /// Identifiers of the responses that produced this value.
    #[must_use]
    pub fn request_ids(&self) -> &RequestIds {
        &self.request_ids
    }

    /// Consume the wrapper, returning the bare value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for WithMeta<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for WithMeta<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PartialEq> PartialEq for WithMeta<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: PartialEq> PartialEq<T> for WithMeta<T> {
    fn eq(&self, other: &T) -> bool {
        &self.value == other
    }
}

impl<T: IntoIterator> IntoIterator for WithMeta<T> {
    type Item = T::Item;
    type IntoIter = T::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.value.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a WithMeta<T>
where
    &'a T: IntoIterator,
{
    type Item = <&'a T as IntoIterator>::Item;
    type IntoIter = <&'a T as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (&self.value).into_iter()
    }
}

/// Collection result of a listing operation.
pub type ListWithMeta<T> = WithMeta<Vec<T>>;

/// Raw response body, classified by shape.
///
/// Used wherever a manager hands back the body verbatim instead of
/// constructing a resource: `delete`, and any operation invoked in raw
/// mode. Bytes never arises from JSON decoding; it exists for binary
/// endpoints that bypass the JSON path.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    /// Textual body, including the empty acknowledgement of a bodyless
    /// PATCH/PUT.
    Str(String),
    /// Binary body.
    Bytes(Vec<u8>),
    /// JSON array body.
    List(Vec<Value>),
    /// Empty body (a 204 or a null body).
    Unit,
    /// JSON object body.
    Map(Map<String, Value>),
}

impl RawBody {
    /// Classify a decoded body into the matching variant. Bare scalars
    /// (numbers, booleans) are rendered as text.
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Null => Self::Unit,
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items),
            Value::Object(map) => Self::Map(map),
            other => Self::Str(other.to_string()),
        }
    }

    /// The object body, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The textual body, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for the empty-body variant.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn meta_with_id(id: &str) -> ResponseMeta {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-openstack-request-id",
            HeaderValue::from_str(id).unwrap(),
        );
        ResponseMeta::new(200, headers)
    }

    #[test]
    fn request_ids_dedup_preserving_order() {
        let mut ids = RequestIds::new();
        ids.record(&meta_with_id("a"));
        ids.record(&meta_with_id("a"));
        ids.record(&meta_with_id("b"));
        assert_eq!(ids.as_slice(), ["a", "b"]);
    }

    #[test]
    fn request_ids_skip_responses_without_header() {
        let mut ids = RequestIds::new();
        ids.record(&ResponseMeta::new(204, HeaderMap::new()));
        assert!(ids.is_empty());
    }

    #[test]
    fn request_ids_merge() {
        let mut left = RequestIds::new();
        left.push("a");
        let mut right = RequestIds::new();
        right.push("b");
        right.push("a");
        left.merge(&right);
        assert_eq!(left.as_slice(), ["a", "b"]);
    }

    #[test]
    fn with_meta_is_transparent() {
        let wrapped = WithMeta::new(vec![1, 2, 3], &meta_with_id("req-1"));
        assert_eq!(wrapped, vec![1, 2, 3]);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped.iter().sum::<i32>(), 6);
        assert_eq!(wrapped.request_ids().as_slice(), ["req-1"]);
    }

    #[test]
    fn with_meta_equality_ignores_metadata() {
        let a = WithMeta::new("body".to_string(), &meta_with_id("req-1"));
        let b = WithMeta::new("body".to_string(), &meta_with_id("req-2"));
        assert_eq!(a, b);
    }

    #[test]
    fn classify_dispatches_on_shape() {
        assert_eq!(RawBody::classify(Value::Null), RawBody::Unit);
        assert_eq!(
            RawBody::classify(json!("ok")),
            RawBody::Str("ok".to_string())
        );
        assert_eq!(
            RawBody::classify(json!([1, 2])),
            RawBody::List(vec![json!(1), json!(2)])
        );
        match RawBody::classify(json!({"zone": "melbourne"})) {
            RawBody::Map(map) => assert_eq!(map["zone"], "melbourne"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn classify_renders_bare_scalars_as_text() {
        assert_eq!(RawBody::classify(json!(42)), RawBody::Str("42".to_string()));
        assert_eq!(
            RawBody::classify(json!(true)),
            RawBody::Str("true".to_string())
        );
    }
}
