use super::contour::Contour;
use super::shape::ShapeFeatures;
use crate::gesture::Gesture;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Width/height ratio above which a two-finger shape reads as a thumbs up
pub const THUMBS_UP_ASPECT: f64 = 1.2;

/// Contours shorter than this are never treated as V-shaped
pub const MIN_V_SHAPE_POINTS: usize = 10;

/// Open interval of corner angles (degrees) that indicate a V
pub const V_ANGLE_RANGE: (f64, f64) = (30.0, 90.0);

/// Map shape features to a gesture label
///
/// Rules in precedence order: four or more finger gaps is an open palm, none
/// is a fist, one or three map directly, and two is split between peace
/// sign, thumbs up and plain two fingers.
pub fn classify(features: &ShapeFeatures) -> Gesture {
    match features.finger_count {
        0 => Gesture::ClosedFist,
        1 => Gesture::OneFinger,
        2 => {
            if is_v_shape(&features.contour) {
                Gesture::PeaceSign
            } else if features.aspect_ratio > THUMBS_UP_ASPECT {
                Gesture::ThumbsUp
            } else {
                Gesture::TwoFingers
            }
        }
        3 => Gesture::ThreeFingers,
        _ => Gesture::OpenPalm,
    }
}

/// Douglas-Peucker tolerance (pixels) applied before measuring corners.
/// Pixel-traced boundaries turn in 45 degree steps, so angles are only
/// meaningful on the simplified outline.
pub const V_SHAPE_EPSILON: f64 = 3.0;

/// Best-effort V detection: any interior corner of the simplified outline
/// sharper than a right angle but wider than 30 degrees. Not a geometric
/// proof of a peace sign.
pub fn is_v_shape(contour: &Contour) -> bool {
    if contour.len() < MIN_V_SHAPE_POINTS {
        return false;
    }
    let outline = approximate_polygon_dp(&contour.points, V_SHAPE_EPSILON, false);
    let (lo, hi) = V_ANGLE_RANGE;
    outline.windows(3).any(|w| {
        let angle = corner_angle(w[0], w[1], w[2]);
        angle > lo && angle < hi
    })
}

/// Angle at `vertex` between the rays to `prev` and `next`, in degrees.
/// Zero when either ray has zero length.
pub fn corner_angle(prev: Point<i32>, vertex: Point<i32>, next: Point<i32>) -> f64 {
    let (ax, ay) = ((prev.x - vertex.x) as f64, (prev.y - vertex.y) as f64);
    let (bx, by) = ((next.x - vertex.x) as f64, (next.y - vertex.y) as f64);

    let mag_a = ax.hypot(ay);
    let mag_b = bx.hypot(by);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let cos = ((ax * bx + ay * by) / (mag_a * mag_b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::shape::fixtures::{fingers, narrow_two_gaps, v_two_gaps, wide_two_gaps};
    use crate::analysis::shape::ShapeAnalyzer;
    use imageproc::rect::Rect;

    fn features(finger_count: usize, aspect_ratio: f64, contour: Contour) -> ShapeFeatures {
        ShapeFeatures {
            contour,
            area: 20000.0,
            hull: Vec::new(),
            defects: Vec::new(),
            bounding_box: Rect::at(0, 0).of_size(150, 100),
            finger_count,
            aspect_ratio,
        }
    }

    /// Ten points along a gentle arc: no corner sharper than 90 degrees
    fn smooth_contour() -> Contour {
        Contour::from_xy(&[
            (0, 0),
            (10, 1),
            (20, 3),
            (30, 6),
            (40, 10),
            (50, 15),
            (60, 21),
            (70, 28),
            (80, 36),
            (90, 45),
        ])
    }

    #[test]
    fn test_corner_angles() {
        let o = Point::new(0, 0);
        assert!((corner_angle(Point::new(1, 0), o, Point::new(0, 1)) - 90.0).abs() < 1e-9);
        assert!((corner_angle(Point::new(1, 0), o, Point::new(-1, 0)) - 180.0).abs() < 1e-9);
        assert!((corner_angle(Point::new(1, 0), o, Point::new(1, 1)) - 45.0).abs() < 1e-9);
        assert_eq!(corner_angle(o, o, Point::new(1, 1)), 0.0);
    }

    #[test]
    fn test_v_shape_needs_ten_points() {
        let short = Contour::from_xy(&[(0, 0), (5, 10), (10, 0)]);
        assert!(!is_v_shape(&short));
    }

    #[test]
    fn test_v_shape_detected_on_sharp_corner() {
        let mut points: Vec<(i32, i32)> = (0..8).map(|i| (i * 10, 0)).collect();
        // 45 degree corner at (70, 0)
        points.push((60, 10));
        points.push((50, 20));
        assert!(is_v_shape(&Contour::from_xy(&points)));
        assert!(!is_v_shape(&smooth_contour()));
    }

    #[test]
    fn test_right_angles_are_not_v() {
        let mut points: Vec<(i32, i32)> = (0..6).map(|i| (i * 10, 0)).collect();
        points.extend((1..6).map(|i| (50, i * 10)));
        assert!(!is_v_shape(&Contour::from_xy(&points)));
    }

    #[test]
    fn test_v_shape_on_pixel_traced_boundary() {
        use crate::analysis::contour::extract_dominant;
        use crate::segmentation::{Mask, FOREGROUND};
        use image::Luma;
        use imageproc::drawing::draw_polygon_mut;

        let outline = |points: &[(i32, i32)]| {
            let mut mask = Mask::new(200, 200);
            let polygon: Vec<_> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
            draw_polygon_mut(&mut mask, &polygon, Luma([FOREGROUND]));
            extract_dominant(&mask).unwrap()
        };

        // Neighbouring boundary pixels only meet at multiples of 45 degrees;
        // the 44 degree notch shows up on the simplified outline
        let notched = outline(&[
            (20, 20),
            (60, 20),
            (100, 120),
            (140, 20),
            (180, 20),
            (180, 180),
            (20, 180),
        ]);
        assert!(notched.len() >= MIN_V_SHAPE_POINTS);
        assert!(is_v_shape(&notched));

        let square = outline(&[(20, 20), (180, 20), (180, 180), (20, 180)]);
        assert!(!is_v_shape(&square));
    }

    #[test]
    fn test_rule_table() {
        let c = smooth_contour;
        assert_eq!(classify(&features(0, 1.0, c())), Gesture::ClosedFist);
        assert_eq!(classify(&features(1, 1.0, c())), Gesture::OneFinger);
        assert_eq!(classify(&features(2, 1.0, c())), Gesture::TwoFingers);
        assert_eq!(classify(&features(2, 1.5, c())), Gesture::ThumbsUp);
        assert_eq!(classify(&features(3, 1.0, c())), Gesture::ThreeFingers);
        assert_eq!(classify(&features(4, 1.0, c())), Gesture::OpenPalm);
        assert_eq!(classify(&features(5, 0.5, c())), Gesture::OpenPalm);
    }

    #[test]
    fn test_v_shape_wins_over_aspect() {
        let mut points: Vec<(i32, i32)> = (0..8).map(|i| (i * 10, 0)).collect();
        points.push((60, 10));
        points.push((50, 20));
        let v = Contour::from_xy(&points);
        assert_eq!(classify(&features(2, 1.5, v)), Gesture::PeaceSign);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let f = features(2, 1.3, smooth_contour());
        let first = classify(&f);
        assert!((0..10).all(|_| classify(&f) == first));
    }

    #[test]
    fn test_analyzed_shapes() {
        let analyzer = ShapeAnalyzer::default();

        let fist = Contour::from_xy(&[(0, 0), (149, 0), (149, 134), (0, 134)]);
        let features = analyzer.analyze(&fist).unwrap();
        assert_eq!(features.area, 149.0 * 134.0);
        assert_eq!(classify(&features), Gesture::ClosedFist);

        let palm = analyzer.analyze(&fingers(5)).unwrap();
        assert_eq!(classify(&palm), Gesture::OpenPalm);

        let three = analyzer.analyze(&fingers(3)).unwrap();
        assert_eq!(classify(&three), Gesture::ThreeFingers);
    }

    #[test]
    fn test_two_gaps_split_on_aspect() {
        let analyzer = ShapeAnalyzer::default();

        let wide = analyzer.analyze(&wide_two_gaps()).unwrap();
        assert_eq!(wide.finger_count, 2);
        assert!(wide.aspect_ratio > THUMBS_UP_ASPECT);
        assert!(!is_v_shape(&wide.contour));
        assert_eq!(classify(&wide), Gesture::ThumbsUp);

        let narrow = analyzer.analyze(&narrow_two_gaps()).unwrap();
        assert_eq!(narrow.finger_count, 2);
        assert!(narrow.aspect_ratio <= THUMBS_UP_ASPECT);
        assert!(!is_v_shape(&narrow.contour));
        assert_eq!(classify(&narrow), Gesture::TwoFingers);
    }

    #[test]
    fn test_two_gaps_with_v_is_peace_sign() {
        let analyzer = ShapeAnalyzer::default();
        let features = analyzer.analyze(&v_two_gaps()).unwrap();
        assert!(features.contour.len() >= MIN_V_SHAPE_POINTS);
        assert_eq!(features.finger_count, 2);
        // Wide enough for a thumbs up, but the V takes precedence
        assert!(features.aspect_ratio > THUMBS_UP_ASPECT);
        assert_eq!(classify(&features), Gesture::PeaceSign);
    }

    #[test]
    fn test_narrow_finger_gaps_are_not_v() {
        // Gaps of about 20 degrees are narrower than any V
        let palm = ShapeAnalyzer::default().analyze(&fingers(5)).unwrap();
        assert!(palm.contour.len() >= MIN_V_SHAPE_POINTS);
        assert!(!is_v_shape(&palm.contour));
    }
}
