use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One labelled observation reported by an image detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Confidence in \[0, 1\].
    pub score: f32,
    /// Occurrences of the label within one image.
    pub count: u32,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, count: u32) -> Self {
        Self {
            label: label.into(),
            score,
            count,
        }
    }
}

/// All detections sharing one label, merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDetection {
    pub label: String,
    /// Sum of member counts.
    pub count: u32,
    /// Highest member score. Informational only; it does not gate matching.
    pub score: f32,
}

/// Merge detections by exact label, in first-seen label order.
pub fn aggregate(detections: &[Detection]) -> Vec<AggregatedDetection> {
    let mut out: Vec<AggregatedDetection> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for detection in detections {
        match positions.get(detection.label.as_str()) {
            Some(&idx) => {
                let merged = &mut out[idx];
                merged.count = merged.count.saturating_add(detection.count);
                merged.score = merged.score.max(detection.score);
            }
            None => {
                positions.insert(detection.label.as_str(), out.len());
                out.push(AggregatedDetection {
                    label: detection.label.clone(),
                    count: detection.count,
                    score: detection.score,
                });
            }
        }
    }

    out
}
