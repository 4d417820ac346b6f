use crate::gesture::Gesture;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Per-label emission counts
pub type GestureCounts = BTreeMap<Gesture, u32>;

/// Emission bookkeeping for one recognition session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub last_gesture: Option<Gesture>,
    pub last_emission: Option<Instant>,
    pub counts: GestureCounts,
}

/// Global cooldown gate
///
/// At most one gesture of any label is admitted per cooldown window. The
/// window is measured from the last admitted emission, not per label.
#[derive(Debug, Clone)]
pub struct TemporalGate {
    cooldown: Duration,
    state: ClassifierState,
}

impl TemporalGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: ClassifierState::default(),
        }
    }

    /// Admit `gesture` if more than the cooldown has passed since the last
    /// admission. Rejections leave the state untouched.
    pub fn admit(&mut self, gesture: Gesture, now: Instant) -> bool {
        if let Some(last) = self.state.last_emission {
            if now.saturating_duration_since(last) <= self.cooldown {
                return false;
            }
        }

        self.state.last_gesture = Some(gesture);
        self.state.last_emission = Some(now);
        *self.state.counts.entry(gesture).or_insert(0) += 1;
        true
    }

    pub fn counts(&self) -> &GestureCounts {
        &self.state.counts
    }

    pub fn count(&self, gesture: Gesture) -> u32 {
        self.state.counts.get(&gesture).copied().unwrap_or(0)
    }

    pub fn last_gesture(&self) -> Option<Gesture> {
        self.state.last_gesture
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Zero every counter. The cooldown clock keeps running.
    pub fn reset_counts(&mut self) {
        self.state.counts.clear();
    }
}
