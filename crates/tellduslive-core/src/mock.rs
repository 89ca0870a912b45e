//! Mock transport implementation for testing.
//!
//! This module provides a [`MockTransport`] that answers API paths with
//! canned JSON bodies, so sessions can be exercised without Telldus Live or
//! a TellStick on the network.
//!
//! # Features
//!
//! - **Canned responses**: one JSON body per API path
//! - **Failure injection**: fail every request, or only one path
//! - **Request recording**: inspect which paths were requested, and how often

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::transport::{Params, Transport, check_body};

/// A request seen by a [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of the query parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A mock Telldus API for testing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tellduslive_core::{MockTransport, Session};
///
/// #[tokio::main]
/// async fn main() {
///     let mock = Arc::new(MockTransport::with_sample_home());
///     let session = Session::with_transport(mock.clone());
///
///     session.update().await.unwrap();
///     assert!(!session.devices().await.is_empty());
///     assert_eq!(mock.count_for("devices/list"), 1);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Value>>,
    failing_paths: Mutex<HashSet<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
    request_count: AtomicU32,
    refresh_count: AtomicU32,
    should_fail: AtomicBool,
}

impl MockTransport {
    /// Create a mock with no responses; every path is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// A small home: a dimmer, a switch, a blind, an unnamed device that is
    /// filtered out, a thermometer, and a sensor without data.
    pub fn with_sample_home() -> Self {
        let mock = Self::new()
            .with_response(
                "devices/list",
                json!({"device": [
                    {"id": "101", "name": "Kitchen", "state": 16, "statevalue": "128", "methods": 19},
                    {"id": "102", "name": "Hall", "state": 2, "statevalue": "", "methods": 3},
                    {"id": "103", "name": "Blind", "state": 256, "methods": 896},
                    {"id": "104", "name": "", "state": 1, "methods": 3}
                ]}),
            )
            .with_response(
                "sensors/list",
                json!({"sensor": [
                    {"id": "201", "name": "Outdoor", "protocol": "fineoffset",
                     "model": "temperaturehumidity", "sensorId": "135", "battery": 253,
                     "data": [
                        {"name": "temp", "value": "4.1", "scale": "0"},
                        {"name": "humidity", "value": "80", "scale": "0"}
                     ]},
                    {"id": "202", "name": "Attic", "protocol": "mandolyn", "sensorId": "11"}
                ]}),
            )
            .with_response(
                "device/info",
                json!({
                    "protocol": "arctech",
                    "model": "selflearning-dimmer:nexa",
                    "parameter": [{"name": "house", "value": "5125426"}, {"name": "unit", "value": "1"}],
                    "client": "1001"
                }),
            );
        for method in ["turnOn", "turnOff", "dim", "up", "down", "stop"] {
            mock.set_response(&format!("device/{}", method), json!({"status": "success"}));
        }
        mock
    }

    /// Builder form of [`set_response`](Self::set_response).
    pub fn with_response(self, path: &str, body: Value) -> Self {
        self.set_response(path, body);
        self
    }

    /// Answer `path` with `body` from now on.
    pub fn set_response(&self, path: &str, body: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(path.to_string(), body);
        }
    }

    /// Fail every request while `fail` is set.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Fail requests for `path` only.
    pub fn fail_path(&self, path: &str) {
        if let Ok(mut failing) = self.failing_paths.lock() {
            failing.insert(path.to_string());
        }
    }

    /// Total number of requests made.
    pub fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Number of token refresh checks made.
    pub fn refresh_count(&self) -> u32 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Number of requests made for `path`.
    pub fn count_for(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// All requests made, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn base_url(&self) -> &str {
        "mock://tellduslive/"
    }

    async fn maybe_refresh_token(&self) -> Result<()> {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                path: path.to_string(),
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
        }

        let path_fails = self
            .failing_paths
            .lock()
            .map(|f| f.contains(path))
            .unwrap_or(false);
        if self.should_fail.load(Ordering::Relaxed) || path_fails {
            return Err(Error::api("Mock failure"));
        }

        let body = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(path).cloned())
            .ok_or_else(|| Error::api(format!("no mock response for {}", path)))?;
        check_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_path_fails() {
        let mock = MockTransport::new();
        assert!(mock.get("devices/list", &[]).await.is_err());
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_records_requests() {
        let mock = MockTransport::with_sample_home();
        mock.get("device/turnOn", &[("id", "101".into())]).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "device/turnOn");
        assert_eq!(requests[0].param("id"), Some("101"));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockTransport::with_sample_home();
        mock.set_should_fail(true);
        assert!(mock.get("devices/list", &[]).await.is_err());

        mock.set_should_fail(false);
        mock.fail_path("sensors/list");
        assert!(mock.get("devices/list", &[]).await.is_ok());
        assert!(mock.get("sensors/list", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_error_body_rejected() {
        let mock = MockTransport::new().with_response("device/turnOn", json!({"error": "nope"}));
        let err = mock.get("device/turnOn", &[]).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
