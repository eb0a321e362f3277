//!
//! pipeline
//! --------
//! Every remote call leaves through an ordered stack of middleware stages and
//! ends at a `Transport`. Stages wrap each other first-in-last-out: the first
//! stage registered sees the request first and the response last.
//!
//! The standard stack is loading -> identity annotation -> error
//! classification. Loading is outermost so its cleanup always runs; error
//! classification is innermost so it sees the raw status code.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;
use crate::identity::SessionStore;

mod http;
mod loading;
mod stages;

pub use http::HttpTransport;
pub use loading::{LoadingGuard, LoadingTracker};
pub use stages::{ErrorStage, IdentityStage, LoadingStage, USER_EMAIL_HEADER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// An outgoing call. `path` is relative to the API base (`students`, `fees/3`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            method,
            path: path.trim_matches('/').to_string(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(Method::Get, path) }
    pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::Delete, path) }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut r = Self::new(Method::Post, path);
        r.body = Some(body);
        r
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut r = Self::new(Method::Put, path);
        r.body = Some(body);
        r
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Path plus url-encoded query, as it would appear after the API base.
    pub fn url_path(&self) -> String {
        if self.query.is_empty() {
            return format!("/{}", self.path);
        }
        let qs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("/{}?{}", self.path, qs.join("&"))
    }
}

/// A completed exchange. Any HTTP status, including failures, is a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self { Self { status, body } }

    pub fn ok<T: Serialize>(value: &T) -> AppResult<Self> { Ok(Self::new(200, serde_json::to_value(value)?)) }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn json<T: DeserializeOwned>(self) -> AppResult<T> { Ok(serde_json::from_value(self.body)?) }
}

/// Carries a request to the remote store. `Err` means no response was obtained at all.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>>;
}

pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle<'a>(&'a self, req: ApiRequest, next: Next<'a>) -> BoxFuture<'a, AppResult<ApiResponse>>;
}

/// The remainder of the stack below the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub fn run(self, req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(req, Next { stages: rest, transport: self.transport }),
            None => self.transport.send(req),
        }
    }
}

pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self { Self { stages: Vec::new(), transport } }

    /// Append a stage below the ones already registered.
    pub fn with<M: Middleware + 'static>(mut self, stage: M) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn standard(transport: Arc<dyn Transport>, session: Arc<SessionStore>, loading: Arc<LoadingTracker>) -> Self {
        Self::new(transport)
            .with(LoadingStage::new(loading))
            .with(IdentityStage::new(session.clone()))
            .with(ErrorStage::new(session))
    }

    pub fn stage_names(&self) -> Vec<&'static str> { self.stages.iter().map(|s| s.name()).collect() }

    pub async fn send(&self, req: ApiRequest) -> AppResult<ApiResponse> {
        Next { stages: &self.stages, transport: self.transport.as_ref() }.run(req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send(ApiRequest::post(path, serde_json::to_value(body)?)).await?.json()
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send(ApiRequest::put(path, serde_json::to_value(body)?)).await?.json()
    }

    pub async fn delete(&self, path: &str) -> AppResult<()> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use parking_lot::Mutex;

    struct Echo;

    impl Transport for Echo {
        fn send<'a>(&'a self, req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>> {
            async move { Ok(ApiResponse::new(200, serde_json::json!({ "path": req.url_path() }))) }.boxed()
        }
    }

    struct Trace {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn name(&self) -> &'static str { self.label }

        fn handle<'a>(&'a self, req: ApiRequest, next: Next<'a>) -> BoxFuture<'a, AppResult<ApiResponse>> {
            async move {
                self.log.lock().push(format!("{}>", self.label));
                let out = next.run(req).await;
                self.log.lock().push(format!("<{}", self.label));
                out
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn stages_unwind_first_in_last_out() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = Pipeline::new(Arc::new(Echo))
            .with(Trace { label: "a", log: log.clone() })
            .with(Trace { label: "b", log: log.clone() });
        assert_eq!(p.stage_names(), vec!["a", "b"]);
        let resp = p.send(ApiRequest::get("/students/").query("name", "Ali Raza")).await.unwrap();
        assert_eq!(resp.body["path"], "/students?name=Ali%20Raza");
        assert_eq!(*log.lock(), vec!["a>", "b>", "<b", "<a"]);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let r = ApiRequest::get("users").header("Authorization", "Bearer x");
        assert_eq!(r.header_value("authorization"), Some("Bearer x"));
        assert!(!ApiResponse::new(404, serde_json::Value::Null).is_success());
    }
}
