use image::{GrayImage, RgbImage};

/// Binary mask: 0 = background, 255 = foreground.
/// Dimensions match the input frame dimensions
pub type Mask = GrayImage;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Trait for frame segmenters
/// Allows swapping the colour-threshold segmenter for other backends
pub trait Segmenter {
    /// Classify every pixel of `frame` as hand or background
    ///
    /// Never fails: a frame with no matching pixels yields an all-background mask.
    fn segment(&self, frame: &RgbImage) -> Mask;
}
