use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /ingest`, as sent by the upstream automation webhook.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub image_url: String,
    /// Overrides the configured unknown-label policy for this request.
    #[serde(default)]
    pub allow_unknown: Option<bool>,
}

impl IngestRequest {
    pub fn image_url(&self) -> Option<&str> {
        let url = self.image_url.trim();
        (!url.is_empty()).then_some(url)
    }
}
