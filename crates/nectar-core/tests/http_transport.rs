//! HTTP transport behavior against a mock server.

use nectar_core::error::Error;
use nectar_core::transport::{HttpTransport, HttpTransportBuilder, Transport};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_decodes_json_and_captures_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allocations/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}]))
                .insert_header("x-openstack-request-id", "req-abc"),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let (meta, body) = transport.get("/allocations/", None, &[]).await.unwrap();

    assert_eq!(meta.status(), 200);
    assert_eq!(meta.request_id(), Some("req-abc"));
    assert_eq!(body, json!([{"id": 1}]));
}

#[tokio::test]
async fn get_sends_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allocations/"))
        .and(query_param("status", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let params = vec![("status".to_string(), "A".to_string())];
    transport.get("/allocations/", None, &params).await.unwrap();
}

#[tokio::test]
async fn no_content_normalizes_to_null_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/quotas/3/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let (meta, body) = transport.delete("/quotas/3/", None).await.unwrap();
    assert_eq!(meta.status(), 204);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn empty_body_normalizes_to_null() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/allocations/1/"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let (meta, body) = transport
        .patch("/allocations/1/", &json!({"notes": "x"}), None)
        .await
        .unwrap();
    assert_eq!(meta.status(), 202);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn not_found_status_maps_to_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allocations/999/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let err = transport.get("/allocations/999/", None, &[]).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn server_error_carries_status_method_and_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/allocations/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let err = transport
        .post("/allocations/", Some(&json!({})), None)
        .await
        .unwrap_err();
    match err {
        Error::Http {
            status,
            method,
            url,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(method, "POST");
            assert!(url.ends_with("/allocations/"));
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn project_scope_header_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allocations/"))
        .and(header("X-PROJECT-ID", "proj-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransportBuilder::new(server.uri())
        .with_project_id("proj-1")
        .build()
        .unwrap();
    transport.get("/allocations/", None, &[]).await.unwrap();
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/allocations/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let err = transport.get("/allocations/", None, &[]).await.unwrap_err();
    assert!(matches!(err, Error::DecodeError(_)));
}
