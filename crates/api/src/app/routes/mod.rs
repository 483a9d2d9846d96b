use axum::{Router, routing::post};

pub mod ingest;
pub mod system;

/// Router for webhook endpoints (behind the shared-secret check).
pub fn router() -> Router {
    Router::new().route("/ingest", post(ingest::ingest))
}
