//! Integration tests for tellduslive-core
//!
//! These tests drive a [`Session`] over the real HTTP transports against a
//! local `wiremock` server standing in for Telldus Live or a TellStick.

use serde_json::json;
use tellduslive_core::{Error, LiveTransport, LocalTransport, Method, Session};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_home(server: &MockServer, prefix: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/devices/list", prefix)))
        .and(query_param("supportedMethods", "915"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"device": [
            {"id": "11", "name": "Porch", "state": 1, "statevalue": "", "methods": 3}
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/device/info", prefix)))
        .and(query_param("id", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "protocol": "arctech", "model": "selflearning-switch:nexa",
            "parameter": [{"name": "unit", "value": "3"}]
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/sensors/list", prefix)))
        .and(query_param("includeValues", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sensor": [
            {"id": "21", "name": "Greenhouse", "protocol": "fineoffset", "sensorId": "7",
             "battery": 255, "data": [{"name": "temp", "value": "18.5", "scale": 0}]}
        ]})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_live_session_update_and_command() {
    let server = MockServer::start().await;
    mount_home(&server, "/json").await;
    Mock::given(method("GET"))
        .and(path("/json/device/turnOff"))
        .and(query_param("id", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = LiveTransport::new("pub", "priv", "tok", "sec", None)
        .unwrap()
        .with_base_url(format!("{}/json/", server.uri()));
    let session = Session::with_transport(transport);

    session.update().await.unwrap();
    // Known device: no second device/info request.
    session.update().await.unwrap();

    let devices = session.devices().await;
    assert_eq!(devices.len(), 2);
    assert!(!devices[0].is_sensor());
    assert!(devices[1].is_sensor());
    assert_eq!(devices[1].value("temp", 0), Some("18.5"));

    session.turn_off("11").await.unwrap();
    let porch = session.device("11").await.unwrap();
    assert_eq!(porch.state(), Some(Method::TurnOff));
    assert_eq!(porch.parameter("unit"), Some("3"));
}

#[tokio::test]
async fn test_local_session_uses_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/refreshToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device/turnOn"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_home(&server, "/api").await;

    let transport = LocalTransport::with_base_url(format!("{}/api/", server.uri()), "stale")
        .await
        .unwrap();
    let session = Session::with_transport(transport);

    session.update().await.unwrap();
    session.turn_on("11").await.unwrap();
    assert!(session.device("11").await.unwrap().is_on());
}

#[tokio::test]
async fn test_session_reports_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/devices/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Invalid token"})),
        )
        .mount(&server)
        .await;

    let transport = LiveTransport::new("pub", "priv", "tok", "sec", None)
        .unwrap()
        .with_base_url(format!("{}/json/", server.uri()));
    let session = Session::with_transport(transport);

    let err = session.update().await.unwrap_err();
    assert!(matches!(err, Error::Api { .. }));
    assert!(session.devices().await.is_empty());
}
