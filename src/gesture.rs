use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// A hand gesture recognised from a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    OpenPalm,
    ClosedFist,
    OneFinger,
    TwoFingers,
    ThreeFingers,
    PeaceSign,
    ThumbsUp,
    ThumbsDown,
    OkSign,
}

impl Gesture {
    /// Every gesture label, in declaration order
    pub const ALL: [Gesture; 9] = [
        Gesture::OpenPalm,
        Gesture::ClosedFist,
        Gesture::OneFinger,
        Gesture::TwoFingers,
        Gesture::ThreeFingers,
        Gesture::PeaceSign,
        Gesture::ThumbsUp,
        Gesture::ThumbsDown,
        Gesture::OkSign,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Gesture::OpenPalm => "open_palm",
            Gesture::ClosedFist => "closed_fist",
            Gesture::OneFinger => "one_finger",
            Gesture::TwoFingers => "two_fingers",
            Gesture::ThreeFingers => "three_fingers",
            Gesture::PeaceSign => "peace_sign",
            Gesture::ThumbsUp => "thumbs_up",
            Gesture::ThumbsDown => "thumbs_down",
            Gesture::OkSign => "ok_sign",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gesture label: {0}")]
pub struct UnknownGesture(pub String);

impl FromStr for Gesture {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gesture::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

/// A gesture that passed the temporal gate and was handed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub emitted_at: Instant,
}
