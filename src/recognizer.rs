use crate::analysis::{classify, extract_dominant, ShapeAnalyzer, ShapeFeatures};
use crate::config::{ConfigError, DetectionConfig};
use crate::gesture::Gesture;
use crate::segmentation::{create_default_segmenter, Segmenter, SkinSegmenter};
use image::RgbImage;

/// One frame's classification result
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub gesture: Gesture,
    pub features: ShapeFeatures,
}

/// Stateless frame classifier: segment, pick the dominant contour, analyse
/// its shape, apply the rule table
///
/// The same instance serves headless runs and runs with a preview attached.
pub struct GestureRecognizer<S: Segmenter = SkinSegmenter> {
    segmenter: S,
    analyzer: ShapeAnalyzer,
}

impl GestureRecognizer<SkinSegmenter> {
    /// Validates `config`; precondition violations are rejected here rather
    /// than discovered mid-stream
    pub fn new(config: &DetectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            segmenter: create_default_segmenter(config),
            analyzer: ShapeAnalyzer::new(config),
        })
    }
}

impl<S: Segmenter> GestureRecognizer<S> {
    /// Recognizer over a caller-supplied segmenter, e.g. a different colour
    /// model or a precomputed mask
    pub fn with_segmenter(segmenter: S, analyzer: ShapeAnalyzer) -> Self {
        Self {
            segmenter,
            analyzer,
        }
    }

    /// Classify a frame. `None` when there is no hand-sized region.
    pub fn detect(&self, frame: &RgbImage) -> Option<Detection> {
        let _span = tracing::debug_span!("detect").entered();

        let mask = self.segmenter.segment(frame);
        let contour = extract_dominant(&mask)?;
        let features = self.analyzer.analyze(&contour)?;
        let gesture = classify(&features);

        tracing::debug!(
            "Frame classified as {} (fingers={}, aspect={:.2}, area={:.0})",
            gesture,
            features.finger_count,
            features.aspect_ratio,
            features.area
        );

        Some(Detection { gesture, features })
    }
}
