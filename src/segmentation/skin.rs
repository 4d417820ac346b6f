use super::hsv::{in_range, rgb_to_hsv};
use super::types::{Mask, Segmenter, BACKGROUND, FOREGROUND};
use crate::config::{HsvTriple, DEFAULT_SKIN_LOWER, DEFAULT_SKIN_UPPER};
use image::{Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Skin-colour threshold segmenter
///
/// Thresholds each pixel in HSV space, then cleans the mask with a
/// morphological open (drops speckle) followed by a close (fills pinholes).
/// The structuring element is the 3x3 ellipse, which at this size is the
/// L1 ball of radius 1.
#[derive(Debug, Clone)]
pub struct SkinSegmenter {
    lower: HsvTriple,
    upper: HsvTriple,
}

impl SkinSegmenter {
    pub fn new(lower: HsvTriple, upper: HsvTriple) -> Self {
        Self { lower, upper }
    }

    /// Raw threshold mask before morphology
    pub fn threshold(&self, frame: &RgbImage) -> Mask {
        let (width, height) = frame.dimensions();
        Mask::from_fn(width, height, |x, y| {
            let hsv = rgb_to_hsv(frame.get_pixel(x, y));
            if in_range(&hsv, &self.lower, &self.upper) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        })
    }
}

impl Default for SkinSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_SKIN_LOWER, DEFAULT_SKIN_UPPER)
    }
}

impl Segmenter for SkinSegmenter {
    fn segment(&self, frame: &RgbImage) -> Mask {
        let _span = tracing::debug_span!("segment").entered();

        let mask = self.threshold(frame);
        let opened = morphology::open(&mask, Norm::L1, 1);
        morphology::close(&opened, Norm::L1, 1)
    }
}
