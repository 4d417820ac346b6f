use crate::segmentation::Mask;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::contour_area;
use imageproc::point::Point;

/// Closed boundary curve of a connected foreground region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Build a contour from `(x, y)` pairs
    pub fn from_xy(points: &[(i32, i32)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// Enclosed polygon area (shoelace formula)
    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Largest outermost boundary in the mask, if any
///
/// Holes and regions nested inside holes are ignored. Ties on area keep the
/// contour found first, so the result is deterministic for a given mask.
pub fn extract_dominant(mask: &Mask) -> Option<Contour> {
    let _span = tracing::debug_span!("extract_contour").entered();

    let mut best: Option<(f64, Contour)> = None;
    for traced in find_contours::<i32>(mask) {
        if !matches!(traced.border_type, BorderType::Outer) || traced.parent.is_some() {
            continue;
        }
        let contour = Contour::new(traced.points);
        let area = contour.area();
        if best.as_ref().map_or(true, |(best_area, _)| area > *best_area) {
            best = Some((area, contour));
        }
    }

    best.map(|(area, contour)| {
        tracing::debug!("Dominant contour: {} points, area {:.0}", contour.len(), area);
        contour
    })
}
