mod webcam;

pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for frame sources feeding the recogniser
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of delivered frames
    fn resolution(&self) -> (u32, u32);
}
