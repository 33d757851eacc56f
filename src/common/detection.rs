use crate::common::Rect;

/// A single-frame observation handed to the tracker.
///
/// Detections are owned by the caller and mutated in place: after a
/// tracker update, every associated detection carries the id of its
/// track while unmatched detections keep `id == 0`.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Frame the detection belongs to
    pub frame_id: u32,
    /// Detector class id
    pub class_id: u32,
    /// Detector class label
    pub class_name: String,
    /// Bounding box in top-left/width/height pixel coordinates
    pub bbox: Rect,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
    /// Optional L2-normalized appearance embedding (empty when absent)
    pub features: Vec<f32>,
    /// Track id assigned by the tracker, 0 when unassociated
    pub id: u32,
}

impl Detection {
    pub fn new(frame_id: u32, bbox: Rect, confidence: f32) -> Self {
        Self {
            frame_id,
            bbox,
            confidence,
            ..Self::default()
        }
    }

    /// Attach class information.
    pub fn with_class(mut self, class_id: u32, class_name: impl Into<String>) -> Self {
        self.class_id = class_id;
        self.class_name = class_name.into();
        self
    }

    /// Attach an appearance embedding.
    pub fn with_features(mut self, features: Vec<f32>) -> Self {
        self.features = features;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_style_construction() {
        let det = Detection::new(3, Rect::new(1.0, 2.0, 3.0, 4.0), 0.8)
            .with_class(1, "person")
            .with_features(vec![0.6, 0.8]);

        assert_eq!(det.frame_id, 3);
        assert_eq!(det.class_name, "person");
        assert_eq!(det.features.len(), 2);
        assert_eq!(det.id, 0);
    }
}
