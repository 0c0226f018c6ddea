//! In-memory FortiSASE API for unit tests

use super::{ApiError, ApiQueryParams, SaseApi};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Stores objects by `<path>/<mkey>` and records every call as
/// `"<METHOD> <path>/<mkey>"`
#[derive(Default)]
pub struct FakeApi {
    objects: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
    next_key: AtomicU64,
    delay: Duration,
    fail_writes: Mutex<Option<u16>>,
    fail_reads: Mutex<Option<u16>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield for `delay` inside every call so concurrent callers interleave
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number primary keys assigned on POST from `start`
    pub fn numbering_from(self, start: u64) -> Self {
        self.next_key.store(start, Ordering::SeqCst);
        self
    }

    pub fn insert(&self, path: &str, mkey: &str, value: Value) {
        self.objects.lock().unwrap().insert(key(path, mkey), value);
    }

    pub fn get(&self, path: &str, mkey: &str) -> Option<Value> {
        self.objects.lock().unwrap().get(&key(path, mkey)).cloned()
    }

    pub fn remove(&self, path: &str, mkey: &str) {
        self.objects.lock().unwrap().remove(&key(path, mkey));
    }

    /// Make every following create and update fail with `status`
    pub fn fail_writes(&self, status: u16) {
        *self.fail_writes.lock().unwrap() = Some(status);
    }

    /// Make every following read fail with `status`
    pub fn fail_reads(&self, status: u16) {
        *self.fail_reads.lock().unwrap() = Some(status);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Request bodies of every create and update, in order
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn record(&self, method: &str, path: &str, mkey: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", method, key(path, mkey)));
    }

    fn write_error(&self) -> Option<ApiError> {
        self.fail_writes.lock().unwrap().map(rejection)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn rejection(status: u16) -> ApiError {
    ApiError::ApiError {
        status,
        message: json!({"error": "rejected"}).to_string(),
        details: None,
    }
}

fn key(path: &str, mkey: &str) -> String {
    if mkey.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", path, mkey)
    }
}

#[async_trait]
impl SaseApi for FakeApi {
    async fn read(&self, path: &str, mkey: &str, _query: &ApiQueryParams) -> Result<Value, ApiError> {
        self.record("GET", path, mkey);
        self.pause().await;
        if let Some(status) = *self.fail_reads.lock().unwrap() {
            return Err(rejection(status));
        }
        self.get(path, mkey)
            .ok_or_else(|| ApiError::NotFound(key(path, mkey)))
    }

    async fn create(
        &self,
        path: &str,
        body: &Value,
        _query: &ApiQueryParams,
    ) -> Result<Value, ApiError> {
        let mkey = match body.get("primaryKey").and_then(Value::as_str) {
            Some(pk) => pk.to_string(),
            None => self.next_key.fetch_add(1, Ordering::SeqCst).to_string(),
        };
        self.record("POST", path, &mkey);
        self.bodies.lock().unwrap().push(body.clone());
        self.pause().await;
        if let Some(e) = self.write_error() {
            return Err(e);
        }

        let mut stored = body.clone();
        if let Value::Object(map) = &mut stored {
            map.insert("primaryKey".to_string(), Value::String(mkey.clone()));
        }
        self.insert(path, &mkey, stored);
        Ok(json!({"primaryKey": mkey}))
    }

    async fn update(
        &self,
        path: &str,
        mkey: &str,
        body: &Value,
        _query: &ApiQueryParams,
    ) -> Result<Value, ApiError> {
        self.record("PUT", path, mkey);
        self.bodies.lock().unwrap().push(body.clone());
        self.pause().await;
        if let Some(e) = self.write_error() {
            return Err(e);
        }

        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .entry(key(path, mkey))
            .or_insert_with(|| json!({}));
        if let (Value::Object(target), Value::Object(changes)) = (stored, body) {
            for (k, v) in changes {
                target.insert(k.clone(), v.clone());
            }
            if !mkey.is_empty() {
                target.insert("primaryKey".to_string(), Value::String(mkey.to_string()));
            }
        }
        Ok(Value::Null)
    }

    async fn delete(&self, path: &str, mkey: &str, _query: &ApiQueryParams) -> Result<(), ApiError> {
        self.record("DELETE", path, mkey);
        self.pause().await;
        self.objects
            .lock()
            .unwrap()
            .remove(&key(path, mkey))
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(key(path, mkey)))
    }
}
