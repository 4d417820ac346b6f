use super::contour::Contour;
use crate::config::DetectionConfig;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use imageproc::rect::Rect;

/// Fixed-point scale applied to defect depths (1/256 pixel)
pub const DEPTH_SCALE: f64 = 256.0;

/// A concavity between the convex hull and the contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    pub start: Point<i32>,
    pub end: Point<i32>,
    /// Contour point farthest from the hull edge `start -> end`
    pub far: Point<i32>,
    /// Distance from `far` to the hull edge, scaled by [`DEPTH_SCALE`]
    pub depth: f64,
}

/// Geometric description of a hand candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFeatures {
    pub contour: Contour,
    pub area: f64,
    /// Hull vertices in contour order
    pub hull: Vec<Point<i32>>,
    pub defects: Vec<ConvexityDefect>,
    pub bounding_box: Rect,
    /// Number of defects deep enough to be a gap between two fingers
    pub finger_count: usize,
    /// Bounding box width / height
    pub aspect_ratio: f64,
}

fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Indices of the convex hull vertices, ascending in contour order
///
/// Collinear points are dropped and a repeated point is represented by its
/// first occurrence.
pub fn convex_hull_indices(points: &[Point<i32>]) -> Vec<usize> {
    // Graham scan's angular sort needs distinct points
    let mut distinct = points.to_vec();
    distinct.sort_by_key(|p| (p.x, p.y));
    distinct.dedup();

    let mut hull: Vec<usize> = convex_hull(distinct)
        .into_iter()
        .filter_map(|vertex| points.iter().position(|p| *p == vertex))
        .collect();
    hull.sort_unstable();
    hull
}

/// Distance from `p` to the infinite line through `a` and `b`
fn line_distance(a: Point<i32>, b: Point<i32>, p: Point<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return ((p.x - a.x) as f64).hypot((p.y - a.y) as f64);
    }
    (cross(a, b, p) as f64).abs() / len
}

/// Convexity defects of `points` against hull indices from [`convex_hull_indices`]
///
/// Every hull edge with contour points strictly between its endpoints yields
/// one defect at the deepest such point. Zero-depth edges are skipped.
pub fn convexity_defects(points: &[Point<i32>], hull: &[usize]) -> Vec<ConvexityDefect> {
    let n = points.len();
    if hull.len() < 3 || n < 4 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        let (a, b) = (points[start], points[end]);

        let mut deepest: Option<(usize, f64)> = None;
        let mut j = (start + 1) % n;
        while j != end {
            let depth = line_distance(a, b, points[j]);
            if deepest.map_or(true, |(_, d)| depth > d) {
                deepest = Some((j, depth));
            }
            j = (j + 1) % n;
        }

        if let Some((far, depth)) = deepest {
            if depth > 0.0 {
                defects.push(ConvexityDefect {
                    start: a,
                    end: b,
                    far: points[far],
                    depth: depth * DEPTH_SCALE,
                });
            }
        }
    }
    defects
}

/// Inclusive pixel extent of the points
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32))
}

/// Turns a contour into hull/defect features, rejecting non-hand sizes
#[derive(Debug, Clone)]
pub struct ShapeAnalyzer {
    min_area: f64,
    max_area: f64,
    depth_threshold: f64,
}

impl ShapeAnalyzer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_area: config.min_hand_area,
            max_area: config.max_hand_area,
            depth_threshold: config.defect_depth_threshold,
        }
    }

    /// Returns `None` when the contour's area is outside the hand band
    pub fn analyze(&self, contour: &Contour) -> Option<ShapeFeatures> {
        let _span = tracing::debug_span!("analyze_shape").entered();

        let area = contour.area();
        if area < self.min_area || area > self.max_area {
            tracing::debug!(
                "Contour area {:.0} outside [{:.0}, {:.0}]",
                area,
                self.min_area,
                self.max_area
            );
            return None;
        }

        let hull_indices = convex_hull_indices(&contour.points);
        let defects = convexity_defects(&contour.points, &hull_indices);
        let finger_count = defects
            .iter()
            .filter(|d| d.depth > self.depth_threshold)
            .count();

        let bounding_box = bounding_rect(&contour.points)?;
        let aspect_ratio = bounding_box.width() as f64 / bounding_box.height() as f64;

        Some(ShapeFeatures {
            contour: contour.clone(),
            area,
            hull: hull_indices.iter().map(|&i| contour.points[i]).collect(),
            defects,
            bounding_box,
            finger_count,
            aspect_ratio,
        })
    }

    /// Defects of `features` that count as finger gaps
    pub fn significant_defects<'a>(
        &'a self,
        features: &'a ShapeFeatures,
    ) -> impl Iterator<Item = &'a ConvexityDefect> + 'a {
        features
            .defects
            .iter()
            .filter(move |d| d.depth > self.depth_threshold)
    }
}

impl Default for ShapeAnalyzer {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{fingers, narrow_two_gaps, v_two_gaps, wide_two_gaps};
    use super::*;

    #[test]
    fn test_hull_of_square_with_edge_points() {
        let contour = Contour::from_xy(&[
            (0, 0),
            (5, 0),
            (10, 0),
            (10, 10),
            (5, 5),
            (0, 10),
        ]);
        let hull = convex_hull_indices(&contour.points);
        assert_eq!(hull, vec![0, 2, 3, 5]);
    }

    #[test]
    fn test_hull_degenerate_inputs() {
        assert!(convex_hull_indices(&[]).is_empty());
        let line = Contour::from_xy(&[(0, 0), (0, 0), (3, 3)]);
        assert_eq!(convex_hull_indices(&line.points), vec![0, 2]);
        let collinear = Contour::from_xy(&[(0, 0), (2, 2), (4, 4), (2, 2)]);
        assert_eq!(convex_hull_indices(&collinear.points), vec![0, 2]);
    }

    #[test]
    fn test_hull_repeated_vertex_maps_to_first_index() {
        // A one-pixel spur traced out and back repeats (10, 0)
        let contour = Contour::from_xy(&[(0, 0), (10, 0), (10, 10), (10, 0), (0, 10)]);
        assert_eq!(convex_hull_indices(&contour.points), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_fingertips_are_hull_vertices() {
        let contour = fingers(3);
        let hull = convex_hull_indices(&contour.points);
        // Base corners plus the four tips; valleys stay inside
        assert_eq!(hull, vec![0, 1, 3, 5, 7, 8]);
    }

    #[test]
    fn test_two_gap_outlines() {
        let analyzer = ShapeAnalyzer::default();
        for contour in [wide_two_gaps(), narrow_two_gaps(), v_two_gaps()] {
            let features = analyzer.analyze(&contour).unwrap();
            assert_eq!(features.finger_count, 2);
            assert_eq!(features.defects.len(), 2);
        }
        let wide = analyzer.analyze(&wide_two_gaps()).unwrap();
        assert_eq!(wide.defects[0].far, Point::new(80, 70));
        assert_eq!(wide.defects[1].far, Point::new(160, 70));
    }

    #[test]
    fn test_defect_depth_is_scaled_distance() {
        let contour = Contour::from_xy(&[(0, 0), (10, 0), (10, 10), (5, 5), (0, 10)]);
        let hull = convex_hull_indices(&contour.points);
        let defects = convexity_defects(&contour.points, &hull);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].far, Point::new(5, 5));
        assert_eq!(defects[0].start, Point::new(10, 10));
        assert_eq!(defects[0].end, Point::new(0, 10));
        assert!((defects[0].depth - 5.0 * DEPTH_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_convex_contour_has_no_defects() {
        let contour = Contour::from_xy(&[(0, 0), (150, 0), (150, 150), (0, 150)]);
        let features = ShapeAnalyzer::default().analyze(&contour).unwrap();
        assert!(features.defects.is_empty());
        assert_eq!(features.finger_count, 0);
        assert_eq!(features.hull.len(), 4);
    }

    #[test]
    fn test_notches_count_as_fingers() {
        let analyzer = ShapeAnalyzer::default();
        for notches in 1..=5 {
            let features = analyzer.analyze(&fingers(notches)).unwrap();
            assert_eq!(features.finger_count, notches, "notches = {}", notches);
            assert_eq!(analyzer.significant_defects(&features).count(), notches);
        }
    }

    #[test]
    fn test_shallow_defects_ignored() {
        // 30px dip: 30 * 256 = 7680, below the default threshold
        let contour = Contour::from_xy(&[
            (0, 0),
            (100, 0),
            (110, 30),
            (120, 0),
            (200, 0),
            (200, 150),
            (0, 150),
        ]);
        let features = ShapeAnalyzer::default().analyze(&contour).unwrap();
        assert_eq!(features.defects.len(), 1);
        assert_eq!(features.finger_count, 0);
    }

    #[test]
    fn test_area_band_rejects() {
        let analyzer = ShapeAnalyzer::default();
        let small = Contour::from_xy(&[(0, 0), (50, 0), (50, 50), (0, 50)]);
        assert!(analyzer.analyze(&small).is_none());
        let large = Contour::from_xy(&[(0, 0), (300, 0), (300, 300), (0, 300)]);
        assert!(analyzer.analyze(&large).is_none());
        let edge = Contour::from_xy(&[(0, 0), (100, 0), (100, 50), (0, 50)]);
        assert!(analyzer.analyze(&edge).is_some());
    }

    #[test]
    fn test_bounding_box_and_aspect() {
        let contour = Contour::from_xy(&[(10, 20), (159, 20), (159, 119), (10, 119)]);
        let features = ShapeAnalyzer::default().analyze(&contour).unwrap();
        assert_eq!(features.bounding_box, Rect::at(10, 20).of_size(150, 100));
        assert!((features.aspect_ratio - 1.5).abs() < 1e-9);
    }
}
