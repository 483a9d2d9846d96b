use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::app::errors;

/// Header the upstream webhook carries its shared secret in.
pub const SECRET_HEADER: &str = "x-zapier-secret";

#[derive(Clone)]
pub struct SecretState {
    secret: Option<Arc<str>>,
}

impl SecretState {
    /// `None` (or a blank secret) disables the check.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}

pub async fn shared_secret_middleware(
    State(state): State<SecretState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(expected) = state.secret.as_deref() {
        if extract_secret(req.headers()) != Some(expected) {
            return errors::json_error(
                axum::http::StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid webhook secret",
            );
        }
    }

    next.run(req).await
}

fn extract_secret(headers: &HeaderMap) -> Option<&str> {
    headers.get(SECRET_HEADER)?.to_str().ok()
}

/// One log line per request.
pub async fn request_log_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    res
}
