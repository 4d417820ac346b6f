//! Geometry stages of the per-frame pipeline: dominant contour, hull and
//! defect features, and the rule-based classifier.

pub mod classify;
pub mod contour;
pub mod shape;

pub use classify::{classify, corner_angle, is_v_shape};
pub use contour::{extract_dominant, Contour};
pub use shape::{ConvexityDefect, ShapeAnalyzer, ShapeFeatures, DEPTH_SCALE};
