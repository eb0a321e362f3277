use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;

use super::{ApiRequest, ApiResponse, LoadingTracker, Middleware, Next};

pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Counts the call in flight for as long as anything below it is running.
pub struct LoadingStage {
    tracker: Arc<LoadingTracker>,
}

impl LoadingStage {
    pub fn new(tracker: Arc<LoadingTracker>) -> Self { Self { tracker } }
}

impl Middleware for LoadingStage {
    fn name(&self) -> &'static str { "loading" }

    fn handle<'a>(&'a self, req: ApiRequest, next: Next<'a>) -> BoxFuture<'a, AppResult<ApiResponse>> {
        async move {
            // dropped on every exit path, including cancellation of this future
            let _slot = self.tracker.begin();
            next.run(req).await
        }
        .boxed()
    }
}

/// Attaches identity headers when a session is active; otherwise passes the request through untouched.
pub struct IdentityStage {
    session: Arc<SessionStore>,
}

impl IdentityStage {
    pub fn new(session: Arc<SessionStore>) -> Self { Self { session } }
}

impl Middleware for IdentityStage {
    fn name(&self) -> &'static str { "identity" }

    fn handle<'a>(&'a self, req: ApiRequest, next: Next<'a>) -> BoxFuture<'a, AppResult<ApiResponse>> {
        let req = match self.session.current() {
            Some(ident) => req.header("authorization", &ident.bearer_token()).header(USER_EMAIL_HEADER, &ident.email),
            None => req,
        };
        next.run(req)
    }
}

/// Turns non-success responses into classified errors. A 401 also ends the session.
pub struct ErrorStage {
    session: Arc<SessionStore>,
}

impl ErrorStage {
    pub fn new(session: Arc<SessionStore>) -> Self { Self { session } }
}

impl Middleware for ErrorStage {
    fn name(&self) -> &'static str { "errors" }

    fn handle<'a>(&'a self, req: ApiRequest, next: Next<'a>) -> BoxFuture<'a, AppResult<ApiResponse>> {
        async move {
            let method = req.method;
            let url = req.url_path();
            let resp = match next.run(req).await {
                Ok(resp) => resp,
                Err(e) => {
                    // transports classify their own failures
                    warn!(target: "pipeline", "{} {} failed without a response: {}", method, url, e);
                    return Err(e);
                }
            };
            if resp.is_success() {
                debug!(target: "pipeline", "{} {} -> {}", method, url, resp.status);
                return Ok(resp);
            }
            let err = AppError::from_status(resp.status, &url);
            warn!(target: "pipeline", "{} {} -> {} ({})", method, url, resp.status, err.code_str());
            if resp.status == 401 {
                self.session.logout();
            }
            Err(err)
        }
        .boxed()
    }
}
