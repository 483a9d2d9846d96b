//! Google Cloud Vision object localization over REST.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use toolcrib_inventory::Detection;

use crate::detector::collapse_annotations;
use crate::ports::{Detector, DetectorError};

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObject>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct LocalizedObject {
    name: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Detector backed by the Vision `images:annotate` endpoint (`OBJECT_LOCALIZATION`).
///
/// The image is referenced by URL; Vision fetches it. Annotations sharing a name are
/// collapsed into one detection per label.
#[derive(Debug, Clone)]
pub struct VisionDetector {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl VisionDetector {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DetectorError> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DetectorError::Unavailable(format!("http client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Detector for VisionDetector {
    async fn detect(&self, image_ref: &str, min_score: f32) -> Result<Vec<Detection>, DetectorError> {
        let body = json!({
            "requests": [{
                "image": { "source": { "imageUri": image_ref } },
                "features": [{ "type": "OBJECT_LOCALIZATION" }],
            }]
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| DetectorError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DetectorError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let parsed: AnnotateResponse = resp
            .json()
            .await
            .map_err(|e| DetectorError::Decode(e.to_string()))?;

        let Some(image) = parsed.responses.into_iter().next() else {
            return Ok(Vec::new());
        };

        if let Some(err) = image.error {
            return Err(DetectorError::Api {
                status: status.as_u16(),
                message: format!("vision error {}: {}", err.code, err.message),
            });
        }

        let detections = collapse_annotations(
            image
                .localized_object_annotations
                .into_iter()
                .map(|o| (o.name, o.score)),
            min_score,
        );
        tracing::debug!(labels = detections.len(), "vision annotations collapsed");
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>,
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/annotate")
    }

    async fn annotate(
        State(captured): State<Captured>,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        captured.requests.lock().unwrap().push((query, body));
        Json(json!({
            "responses": [{
                "localizedObjectAnnotations": [
                    { "name": "Glove", "score": 0.91 },
                    { "name": "Glove", "score": 0.62 },
                    { "name": "Hammer", "score": 0.31 },
                    { "name": "Tape measure", "score": 0.77 }
                ]
            }]
        }))
    }

    #[tokio::test]
    async fn posts_image_uri_and_collapses_annotations() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/annotate", post(annotate))
            .with_state(captured.clone());
        let endpoint = spawn(router).await;

        let detector = VisionDetector::with_endpoint("test-key", endpoint).unwrap();
        let detections = detector.detect("https://example.com/shelf.jpg", 0.5).await.unwrap();

        assert_eq!(
            detections,
            vec![Detection::new("glove", 0.91, 2), Detection::new("tape measure", 0.77, 1)]
        );

        let requests = captured.requests.lock().unwrap();
        let (query, body) = &requests[0];
        assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
        assert_eq!(
            body["requests"][0]["image"]["source"]["imageUri"],
            "https://example.com/shelf.jpg"
        );
        assert_eq!(body["requests"][0]["features"][0]["type"], "OBJECT_LOCALIZATION");
    }

    #[tokio::test]
    async fn failure_status_is_an_api_error() {
        let router = Router::new().route(
            "/annotate",
            post(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        );
        let endpoint = spawn(router).await;

        let detector = VisionDetector::with_endpoint("bad-key", endpoint).unwrap();
        let err = detector.detect("https://example.com/shelf.jpg", 0.5).await.unwrap_err();

        match err {
            DetectorError::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn per_image_error_payload_is_an_api_error() {
        let router = Router::new().route(
            "/annotate",
            post(|| async {
                Json(json!({
                    "responses": [{ "error": { "code": 7, "message": "image could not be fetched" } }]
                }))
            }),
        );
        let endpoint = spawn(router).await;

        let detector = VisionDetector::with_endpoint("key", endpoint).unwrap();
        let err = detector.detect("https://example.com/missing.jpg", 0.5).await.unwrap_err();

        assert!(err.to_string().contains("image could not be fetched"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let detector = VisionDetector::with_endpoint("key", "http://127.0.0.1:1/annotate").unwrap();
        let err = detector.detect("https://example.com/a.jpg", 0.5).await.unwrap_err();
        assert!(matches!(err, DetectorError::Unavailable(_)));
    }
}
