use super::OutputSink;
use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Preview frames written to a v4l2loopback device as YUYV
pub struct V4L2Output {
    // Held open so the negotiated format stays in place
    _device: Device,
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening preview device {} ({}x{})",
            path.display(),
            width,
            height
        );

        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;

        let mut format = Output::format(&device).context("Failed to query output format")?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"YUYV");
        let applied = Output::set_format(&device, &format).context("Failed to set output format")?;
        tracing::debug!(
            "Preview format negotiated: {}x{} {}",
            applied.width,
            applied.height,
            applied.fourcc
        );

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;

        Ok(Self {
            _device: device,
            file,
            width,
            height,
        })
    }
}

/// BT.601 luma and chroma
fn yuv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    (
        0.299 * r + 0.587 * g + 0.114 * b,
        -0.147 * r - 0.289 * g + 0.436 * b + 128.0,
        0.615 * r - 0.515 * g - 0.100 * b + 128.0,
    )
}

fn to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Pack RGB rows into YUYV (Y0 U Y1 V), sharing chroma between pixel pairs.
/// An odd trailing pixel is paired with itself.
pub(crate) fn pack_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let row_len = width as usize * 3;
    let mut out = Vec::with_capacity(width.div_ceil(2) as usize * 4 * height as usize);

    for row in frame.as_raw().chunks_exact(row_len.max(1)) {
        for pair in row.chunks(6) {
            let (y0, u0, v0) = yuv(pair[0], pair[1], pair[2]);
            let (y1, u1, v1) = if pair.len() == 6 {
                yuv(pair[3], pair[4], pair[5])
            } else {
                (y0, u0, v0)
            };
            out.extend_from_slice(&[
                to_byte(y0),
                to_byte((u0 + u1) / 2.0),
                to_byte(y1),
                to_byte((v0 + v1) / 2.0),
            ]);
        }
    }
    out
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let packed = if frame.dimensions() != (self.width, self.height) {
            let resized = imageops::resize(
                frame,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            );
            pack_yuyv(&resized)
        } else {
            pack_yuyv(frame)
        };

        self.file
            .write_all(&packed)
            .context("Failed to write frame to preview device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
