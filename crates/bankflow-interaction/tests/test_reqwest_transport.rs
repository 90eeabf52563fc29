use bankflow_core::error::BankflowError;
use bankflow_core::session::Session;
use bankflow_interaction::{BankDataClient, Method, ReqwestTransport, RetryPolicy, Transport};
use serde_json::{Map, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> ReqwestTransport {
    ReqwestTransport::builder().build().unwrap()
}

#[tokio::test]
async fn test_get_sends_query_and_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/aspsps/"))
        .and(query_param("country", "LV"))
        .and(header("Authorization", "Token abc"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "SWEDBANK_HABALV22", "name": "Swedbank"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = BankDataClient::new(Arc::new(transport()), server.uri());
    let mut session = Session::new("abc", "", "end-user-1");
    let banks = client.list_banks(&mut session, "LV").await.unwrap();

    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].name, "Swedbank");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agreements/enduser/"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "enduser_id": "end-user-1",
            "max_historical_days": 90,
            "aspsp_id": "SWEDBANK_HABALV22"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "agr-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = BankDataClient::new(Arc::new(transport()), server.uri());
    let mut session = Session::new("abc", "LV", "end-user-1");
    let agreement = client
        .create_agreement(&mut session, "SWEDBANK_HABALV22", 90)
        .await
        .unwrap();

    assert_eq!(agreement, "agr-1");
    assert_eq!(session.agreement_ids, vec!["agr-1"]);
}

#[tokio::test]
async fn test_error_status_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/aspsps/"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"detail":"Invalid token"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/api/aspsps/", server.uri());
    let err = transport()
        .request(Method::GET, &url, "bad", &Map::new())
        .await
        .unwrap_err();

    match err {
        BankflowError::UpstreamHttp { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid token"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_method_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/api/aspsps/", server.uri());
    let err = transport()
        .request(Method::PUT, &url, "abc", &Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BankflowError::InvalidMethod(ref m) if m == "PUT"));
}

#[tokio::test]
async fn test_server_errors_are_retried_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/requisitions/req-1/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/requisitions/req-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accounts": []})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .timeout(Duration::from_secs(5))
        .retry_policy(RetryPolicy::fixed(2, Duration::from_millis(10)))
        .build()
        .unwrap();
    let url = format!("{}/api/requisitions/req-1/", server.uri());
    let body = transport
        .request(Method::GET, &url, "abc", &Map::new())
        .await
        .unwrap();

    assert_eq!(body, json!({"accounts": []}));
}

#[tokio::test]
async fn test_client_errors_are_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agreements/enduser/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad aspsp"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .retry_policy(RetryPolicy::fixed(3, Duration::from_millis(10)))
        .build()
        .unwrap();
    let url = format!("{}/api/agreements/enduser/", server.uri());
    let err = transport
        .request(Method::POST, &url, "abc", &Map::new())
        .await
        .unwrap_err();

    assert_eq!(err.upstream_status(), Some(400));
}

#[tokio::test]
async fn test_post_server_error_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agreements/enduser/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/agreements/enduser/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "agr-2"})))
        .expect(0)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .retry_policy(RetryPolicy::fixed(2, Duration::from_millis(1)))
        .build()
        .unwrap();
    let url = format!("{}/api/agreements/enduser/", server.uri());
    let err = transport
        .request(Method::POST, &url, "abc", &Map::new())
        .await
        .unwrap_err();

    assert_eq!(err.upstream_status(), Some(503));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_post_retry_is_opt_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/requisitions/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/requisitions/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "req-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .retry_policy(RetryPolicy::fixed(2, Duration::from_millis(1)).with_non_idempotent(true))
        .build()
        .unwrap();
    let url = format!("{}/api/requisitions/", server.uri());
    let body = transport
        .request(Method::POST, &url, "abc", &Map::new())
        .await
        .unwrap();

    assert_eq!(body, json!({"id": "req-1"}));
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let url = format!("{}/api/aspsps/", server.uri());
    let err = transport
        .request(Method::GET, &url, "abc", &Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BankflowError::Transport(_)));
}
