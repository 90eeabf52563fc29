//! Canned-response transport for tests.

use crate::transport::{Method, Transport, ensure_supported};
use async_trait::async_trait;
use bankflow_core::error::{BankflowError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// One request seen by [`StubTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub token: String,
    pub payload: Map<String, Value>,
}

/// Answers requests from a `(method, url)` table and records every call.
///
/// Requests without a canned answer fail with a 404 `UpstreamHttp` error.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<(Method, String), Result<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, url: impl Into<String>, body: Value) -> &Self {
        self.insert(method, url.into(), Ok(body))
    }

    pub fn fail(&self, method: Method, url: impl Into<String>, status: u16, body: &str) -> &Self {
        self.insert(method, url.into(), Err(BankflowError::upstream(status, body)))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn was_called(&self, method: &Method, url: &str) -> bool {
        self.calls()
            .iter()
            .any(|call| call.method == *method && call.url == url)
    }

    fn insert(&self, method: Method, url: String, response: Result<Value>) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert((method, url), response);
        }
        self
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value> {
        ensure_supported(&method)?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method: method.clone(),
                url: url.to_string(),
                token: token.to_string(),
                payload: payload.clone(),
            });
        }

        let routes = self
            .routes
            .lock()
            .map_err(|_| BankflowError::Internal("stub routes poisoned".into()))?;
        routes
            .get(&(method, url.to_string()))
            .cloned()
            .unwrap_or_else(|| Err(BankflowError::upstream(404, format!("no stub for {url}"))))
    }
}
