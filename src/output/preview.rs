use super::OutputSink;
use crate::analysis::ShapeAnalyzer;
use crate::gesture::Gesture;
use crate::recognizer::Detection;
use crate::session::FrameObserver;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

const CONTOUR: Rgb<u8> = Rgb([0, 255, 0]);
const HULL: Rgb<u8> = Rgb([0, 128, 255]);
const DEFECT: Rgb<u8> = Rgb([255, 0, 0]);
const EMITTED: Rgb<u8> = Rgb([255, 220, 0]);

fn draw_closed(canvas: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        );
    }
}

/// Draw the detection's contour, hull and the defects `analyzer` counts as
/// finger gaps onto a copy of `frame`. An emitted gesture adds a border flash.
pub fn annotate(
    frame: &RgbImage,
    detection: Option<&Detection>,
    emitted: Option<Gesture>,
    analyzer: &ShapeAnalyzer,
) -> RgbImage {
    let mut canvas = frame.clone();

    if let Some(detection) = detection {
        let features = &detection.features;
        draw_closed(&mut canvas, &features.contour.points, CONTOUR);
        draw_closed(&mut canvas, &features.hull, HULL);
        for defect in analyzer.significant_defects(features) {
            draw_filled_circle_mut(&mut canvas, (defect.far.x, defect.far.y), 4, DEFECT);
        }
    }

    let (width, height) = canvas.dimensions();
    if emitted.is_some() && width > 6 && height > 6 {
        for inset in 0..3 {
            let rect = Rect::at(inset, inset).of_size(width - 2 * inset as u32, height - 2 * inset as u32);
            draw_hollow_rect_mut(&mut canvas, rect, EMITTED);
        }
    }

    canvas
}

/// Frame observer that writes annotated frames to an output sink
pub struct PreviewObserver<O: OutputSink> {
    sink: O,
    analyzer: ShapeAnalyzer,
    failed: bool,
}

impl<O: OutputSink> PreviewObserver<O> {
    pub fn new(sink: O, analyzer: ShapeAnalyzer) -> Self {
        Self {
            sink,
            analyzer,
            failed: false,
        }
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }
}

impl<O: OutputSink + Send> FrameObserver for PreviewObserver<O> {
    fn observe(&mut self, frame: &RgbImage, detection: Option<&Detection>, emitted: Option<Gesture>) {
        let _span = tracing::debug_span!("preview").entered();

        let annotated = annotate(frame, detection, emitted, &self.analyzer);
        match self.sink.write_frame(&annotated) {
            Ok(()) => self.failed = false,
            Err(err) => {
                // Log once per failure streak, not once per frame
                if !self.failed {
                    tracing::warn!("Preview output failed: {:#}", err);
                }
                self.failed = true;
            }
        }
    }
}
