//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: detector/store selection and the reconciler
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let secret_state = middleware::SecretState::new(services.config().webhook_secret.clone());

    // Webhook routes: require the shared secret when one is configured.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            secret_state,
            middleware::shared_secret_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/healthz", get(routes::system::health))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_log_middleware))
                .layer(cors()),
        )
}

/// Any origin, method and header. Preflights are answered before the secret check.
fn cors() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}
