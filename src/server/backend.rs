//! In-memory REST collections with json-server semantics.
//!
//! Records are JSON objects keyed by an integer `id`. New records get
//! `max(id) + 1`; updates replace the whole record; list queries filter by
//! field equality (keys starting with `_` are ignored).

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::pipeline::{ApiRequest, ApiResponse, Method, Transport};

#[derive(Debug, Default)]
pub struct MockBackend {
    collections: RwLock<BTreeMap<String, Vec<Value>>>,
}

fn record_id(v: &Value) -> Option<u64> {
    match v.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_matches(v: &Value, key: &str, expected: &str) -> bool {
    match v.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

impl MockBackend {
    pub fn new() -> Self { Self::default() }

    /// A backend holding the demo data set.
    pub fn seeded() -> Self {
        let b = Self::new();
        for (name, records) in super::seed::demo_collections() {
            b.insert_collection(name, records);
        }
        b
    }

    pub fn insert_collection(&self, name: &str, records: Vec<Value>) {
        self.collections.write().insert(name.to_string(), records);
    }

    pub fn collection_names(&self) -> Vec<String> { self.collections.read().keys().cloned().collect() }

    pub fn len(&self, collection: &str) -> usize { self.collections.read().get(collection).map_or(0, |c| c.len()) }

    fn missing_collection(collection: &str) -> AppError {
        AppError::NotFound { code: "not_found".into(), message: format!("no collection named '{}'", collection) }
    }

    fn missing_record(collection: &str, id: u64) -> AppError {
        AppError::NotFound { code: "not_found".into(), message: format!("{}/{} does not exist", collection, id) }
    }

    pub fn list(&self, collection: &str, filters: &[(String, String)]) -> AppResult<Vec<Value>> {
        let guard = self.collections.read();
        let records = guard.get(collection).ok_or_else(|| Self::missing_collection(collection))?;
        Ok(records
            .iter()
            .filter(|r| filters.iter().filter(|(k, _)| !k.starts_with('_')).all(|(k, v)| field_matches(r, k, v)))
            .cloned()
            .collect())
    }

    pub fn get(&self, collection: &str, id: u64) -> AppResult<Value> {
        let guard = self.collections.read();
        let records = guard.get(collection).ok_or_else(|| Self::missing_collection(collection))?;
        records
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
            .ok_or_else(|| Self::missing_record(collection, id))
    }

    pub fn create(&self, collection: &str, body: Value) -> AppResult<Value> {
        let Value::Object(mut obj) = body else {
            return Err(AppError::user("bad_request", "record body must be a JSON object"));
        };
        let mut guard = self.collections.write();
        let records = guard.get_mut(collection).ok_or_else(|| Self::missing_collection(collection))?;
        let id = records.iter().filter_map(record_id).max().unwrap_or(0) + 1;
        obj.insert("id".to_string(), json!(id));
        let rec = Value::Object(obj);
        records.push(rec.clone());
        info!(target: "mock_api", "created {}/{}", collection, id);
        Ok(rec)
    }

    pub fn replace(&self, collection: &str, id: u64, body: Value) -> AppResult<Value> {
        let Value::Object(mut obj) = body else {
            return Err(AppError::user("bad_request", "record body must be a JSON object"));
        };
        let mut guard = self.collections.write();
        let records = guard.get_mut(collection).ok_or_else(|| Self::missing_collection(collection))?;
        let slot = records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| Self::missing_record(collection, id))?;
        obj.insert("id".to_string(), json!(id));
        *slot = Value::Object(obj);
        info!(target: "mock_api", "replaced {}/{}", collection, id);
        Ok(slot.clone())
    }

    pub fn remove(&self, collection: &str, id: u64) -> AppResult<()> {
        let mut guard = self.collections.write();
        let records = guard.get_mut(collection).ok_or_else(|| Self::missing_collection(collection))?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Err(Self::missing_record(collection, id));
        }
        info!(target: "mock_api", "deleted {}/{}", collection, id);
        Ok(())
    }

    /// Route a request the way the HTTP server would.
    pub fn handle(&self, req: &ApiRequest) -> ApiResponse {
        debug!(target: "mock_api", "{} {}", req.method, req.url_path());
        let mut parts = req.path.split('/').filter(|s| !s.is_empty());
        let collection = parts.next().unwrap_or("");
        let id = match parts.next().map(|raw| raw.parse::<u64>().map_err(|_| raw)) {
            None => None,
            Some(Ok(id)) => Some(id),
            Some(Err(raw)) => {
                let err = AppError::NotFound { code: "not_found".into(), message: format!("no record '{}'", raw) };
                return to_response(req.method, Err(err));
            }
        };
        let body = || req.body.clone().unwrap_or(Value::Null);
        let result = match (req.method, id) {
            (Method::Get, None) => self.list(collection, &req.query).map(Value::Array),
            (Method::Post, None) => self.create(collection, body()),
            (Method::Get, Some(id)) => self.get(collection, id),
            (Method::Put, Some(id)) => self.replace(collection, id, body()),
            (Method::Delete, Some(id)) => self.remove(collection, id).map(|_| json!({})),
            (Method::Post, Some(_)) | (Method::Put, None) | (Method::Delete, None) => {
                Err(AppError::user("method_not_allowed", "method not allowed here"))
            }
        };
        to_response(req.method, result)
    }
}

fn to_response(method: Method, result: AppResult<Value>) -> ApiResponse {
    match result {
        Ok(v) if method == Method::Post => ApiResponse::new(201, v),
        Ok(v) => ApiResponse::new(200, v),
        Err(e) => ApiResponse::new(e.http_status(), json!({ "code": e.code_str(), "message": e.message() })),
    }
}

impl Transport for MockBackend {
    fn send<'a>(&'a self, req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>> {
        let resp = self.handle(&req);
        async move { Ok(resp) }.boxed()
    }
}
