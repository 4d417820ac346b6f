//! Hand-gesture recognition from a video stream.
//!
//! Frames are segmented by skin colour, the dominant contour is reduced to
//! convex hull and convexity-defect features, and a rule table maps those to
//! a [`Gesture`]. A global cooldown gate decides which classifications are
//! emitted. Without a camera, a [`session::Session`] falls back to emitting
//! sampled gestures through the same gate.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod gate;
pub mod gesture;
pub mod keymap;
pub mod output;
pub mod recognizer;
pub mod segmentation;
pub mod session;
pub mod simulation;

pub use config::{Config, ConfigError, DetectionConfig};
pub use gate::{ClassifierState, GestureCounts, TemporalGate};
pub use gesture::{Gesture, GestureEvent};
pub use recognizer::{Detection, GestureRecognizer};
pub use session::{FrameObserver, Session, SessionHandle, SessionOptions};
