//! Image detector adapters.

pub mod fixed;
pub mod vision;

use std::collections::HashMap;

use toolcrib_inventory::Detection;

pub use fixed::{DisabledDetector, StaticDetector};
pub use vision::VisionDetector;

/// Collapse raw object annotations into one detection per label.
///
/// Annotations scoring below `min_score` are dropped, labels are lower-cased, and each
/// remaining annotation adds one to its label's count; the label keeps its best score.
/// Output is in first-seen label order.
pub fn collapse_annotations<I, S>(annotations: I, min_score: f32) -> Vec<Detection>
where
    I: IntoIterator<Item = (S, f32)>,
    S: AsRef<str>,
{
    let mut out: Vec<Detection> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (name, score) in annotations {
        if score < min_score {
            continue;
        }
        let label = name.as_ref().to_lowercase();
        match positions.get(&label) {
            Some(&idx) => {
                out[idx].count += 1;
                out[idx].score = out[idx].score.max(score);
            }
            None => {
                positions.insert(label.clone(), out.len());
                out.push(Detection::new(label, score, 1));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_by_lowercased_label() {
        let raw = vec![
            ("Glove", 0.71),
            ("Hammer", 0.55),
            ("glove", 0.93),
            ("GLOVE", 0.60),
        ];

        let detections = collapse_annotations(raw, 0.5);

        assert_eq!(
            detections,
            vec![Detection::new("glove", 0.93, 3), Detection::new("hammer", 0.55, 1)]
        );
    }

    #[test]
    fn drops_annotations_below_min_score() {
        let raw = vec![("Drill", 0.49), ("Drill", 0.5), ("Tape", 0.2)];
        assert_eq!(collapse_annotations(raw, 0.5), vec![Detection::new("drill", 0.5, 1)]);
    }
}
