mod hsv;
mod skin;
pub mod types;

pub use hsv::{in_range, rgb_to_hsv};
pub use skin::SkinSegmenter;
pub use types::{Mask, Segmenter, BACKGROUND, FOREGROUND};

use crate::config::DetectionConfig;

/// Create the default segmenter (skin thresholds) from detection settings
pub fn create_default_segmenter(config: &DetectionConfig) -> SkinSegmenter {
    SkinSegmenter::new(config.skin_lower, config.skin_upper)
}
