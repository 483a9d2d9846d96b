use async_trait::async_trait;

use toolcrib_inventory::Detection;

use crate::ports::{Detector, DetectorError};

/// Detector that reports the same detections for every image.
///
/// Intended for tests/dev.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    detections: Vec<Detection>,
}

impl StaticDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

#[async_trait]
impl Detector for StaticDetector {
    async fn detect(&self, _image_ref: &str, min_score: f32) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.score >= min_score)
            .cloned()
            .collect())
    }
}

/// Detector standing in for one that is not configured; every call fails.
#[derive(Debug, Clone)]
pub struct DisabledDetector {
    reason: String,
}

impl DisabledDetector {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl Detector for DisabledDetector {
    async fn detect(&self, _image_ref: &str, _min_score: f32) -> Result<Vec<Detection>, DetectorError> {
        Err(DetectorError::Unavailable(self.reason.clone()))
    }
}
