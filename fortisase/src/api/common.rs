//! Common types and utilities for the FortiSASE API

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Keys that may sit next to `data` in a response envelope
const ENVELOPE_KEYS: &[&str] = &["data", "status", "http_status", "httpStatus", "message", "total"];

/// Strip the `{"data": ...}` envelope some endpoints wrap objects in. A
/// single-element list under `data` is unwrapped to the element, since
/// reading one object by key sometimes answers with a list of one.
pub fn unwrap_envelope(body: Value) -> Value {
    let is_envelope = match &body {
        Value::Object(map) => {
            map.contains_key("data") && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str()))
        }
        _ => false,
    };
    if !is_envelope {
        return body;
    }

    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(mut items)) if items.len() == 1 => items.remove(0),
            Some(data) => data,
            None => Value::Null,
        },
        other => other,
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl ApiErrorResponse {
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.message.is_none() && self.details.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub struct ApiErrorDetails {
    pub error: Option<String>,
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.error.clone());
        parts.extend(self.message.clone());
        if let Some(details) = &self.details {
            parts.push(details.to_string());
        }
        write!(f, "{}", parts.join(": "))
    }
}

impl From<ApiErrorResponse> for ApiErrorDetails {
    fn from(resp: ApiErrorResponse) -> Self {
        Self {
            error: resp.error,
            message: resp.message,
            details: resp.details,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}
