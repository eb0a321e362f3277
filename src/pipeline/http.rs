use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::{ApiRequest, ApiResponse, Method, Transport};

/// Talks to the REST data store over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(base).map_err(|e| AppError::UserInput { code: "invalid_api_url".into(), message: format!("invalid API URL '{}': {}", base, e) })?;
        if !base_url.path().ends_with('/') {
            let p = format!("{}/", base_url.path());
            base_url.set_path(&p);
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self { base: base_url, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn headers(req: &ApiRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in &req.headers {
            if let (Ok(name), Ok(val)) = (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
                headers.insert(name, val);
            }
        }
        headers
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, req: ApiRequest) -> BoxFuture<'a, AppResult<ApiResponse>> {
        async move {
            let url = self
                .base
                .join(&req.path)
                .map_err(|e| AppError::UserInput { code: "invalid_path".into(), message: format!("invalid path '{}': {}", req.path, e) })?;
            let builder = match req.method {
                Method::Get => self.client.get(url),
                Method::Post => self.client.post(url),
                Method::Put => self.client.put(url),
                Method::Delete => self.client.delete(url),
            };
            let mut builder = builder.headers(Self::headers(&req)).query(&req.query);
            if let Some(body) = &req.body {
                builder = builder.json(body);
            }
            let resp = builder.send().await.map_err(|e| AppError::Transport { code: "network_error".into(), message: e.to_string() })?;
            let status = resp.status().as_u16();
            let text = resp.text().await.map_err(|e| AppError::Transport { code: "network_error".into(), message: e.to_string() })?;
            let body = if text.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
            };
            debug!(target: "pipeline", "http {} {} -> {}", req.method, req.url_path(), status);
            Ok(ApiResponse::new(status, body))
        }
        .boxed()
    }
}
