use std::time::Duration;

use challan_engine::{FetchSettings, Fetcher, LookupErrorKind, VahanFetcher};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> FetchSettings {
    FetchSettings {
        base_url: server.uri(),
        ..FetchSettings::default()
    }
}

fn success_envelope(inner: serde_json::Value) -> serde_json::Value {
    json!({
        "error": "false",
        "response": [{
            "responseStatus": "SUCCESS",
            "response": inner,
        }],
    })
}

#[tokio::test]
async fn decodes_pending_and_disposed_buckets() {
    let server = MockServer::start().await;
    let body = success_envelope(json!({
        "data": {
            "Pending_data": [{ "challan_no": "C1", "fine_imposed": "500" }],
            "Disposed_data": [
                { "challan_no": "C2" },
                { "challan_no": "C3" },
            ],
        }
    }));
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    let payload = fetcher.fetch("KA01AB1234").await.expect("fetch ok");
    assert_eq!(payload.pending.len(), 1);
    assert_eq!(payload.disposed.len(), 2);
    assert_eq!(payload.record_count(), 3);
}

#[tokio::test]
async fn missing_buckets_default_to_empty() {
    let server = MockServer::start().await;
    let body = success_envelope(json!({
        "data": { "Pending_data": [{ "challan_no": "C1" }] }
    }));
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    let payload = fetcher.fetch("KA01AB1234").await.expect("fetch ok");
    assert_eq!(payload.pending.len(), 1);
    assert!(payload.disposed.is_empty());
}

#[tokio::test]
async fn no_records_answer_is_an_empty_success() {
    let server = MockServer::start().await;
    let body = success_envelope(json!({
        "code": "305",
        "message": "No Records Found!",
    }));
    Mock::given(method("GET"))
        .and(path("/echallan/MH12XY0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    let payload = fetcher.fetch("MH12XY0001").await.expect("no-records is success");
    assert_eq!(payload.record_count(), 0);
}

#[tokio::test]
async fn http_error_status_maps_to_api_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    let err = fetcher.fetch("KA01AB1234").await.unwrap_err();
    assert_eq!(err.kind, LookupErrorKind::HttpStatus(500));
    assert_eq!(err.to_string(), "API error: 500");
}

#[tokio::test]
async fn non_success_envelope_is_a_lookup_failure() {
    let server = MockServer::start().await;
    let body = json!({
        "error": "false",
        "response": [{ "responseStatus": "FAILED" }],
    });
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    let err = fetcher.fetch("KA01AB1234").await.unwrap_err();
    assert_eq!(err.kind, LookupErrorKind::Malformed);
    assert_eq!(err.to_string(), "Failed to fetch challan data");
}

#[tokio::test]
async fn error_envelope_and_non_json_bodies_are_lookup_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "true" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/echallan/MH12XY0001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let fetcher = VahanFetcher::new(settings_for(&server)).unwrap();
    for reg_num in ["KA01AB1234", "MH12XY0001"] {
        let err = fetcher.fetch(reg_num).await.unwrap_err();
        assert_eq!(err.kind, LookupErrorKind::Malformed);
        assert_eq!(err.to_string(), "Failed to fetch challan data");
    }
}

#[tokio::test]
async fn slow_responses_time_out_as_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echallan/KA01AB1234"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(success_envelope(json!({ "code": "305" }))),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..settings_for(&server)
    };
    let fetcher = VahanFetcher::new(settings).unwrap();
    let err = fetcher.fetch("KA01AB1234").await.unwrap_err();
    assert_eq!(err.kind, LookupErrorKind::Transport);
    assert_eq!(err.to_string(), "request timed out");
}
