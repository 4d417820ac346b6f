use crate::gesture::Gesture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of gestures for simulated sessions
pub trait GestureSampler: Send {
    fn sample(&mut self) -> Gesture;
}

/// Uniform draw over every gesture label
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl GestureSampler for RandomSampler {
    fn sample(&mut self) -> Gesture {
        Gesture::ALL[self.rng.random_range(0..Gesture::ALL.len())]
    }
}

/// Replays a fixed sequence, wrapping around at the end
#[derive(Debug, Clone)]
pub struct SequenceSampler {
    gestures: Vec<Gesture>,
    next: usize,
}

impl SequenceSampler {
    /// Falls back to every label when `gestures` is empty
    pub fn new(gestures: Vec<Gesture>) -> Self {
        let gestures = if gestures.is_empty() {
            Gesture::ALL.to_vec()
        } else {
            gestures
        };
        Self { gestures, next: 0 }
    }
}

impl GestureSampler for SequenceSampler {
    fn sample(&mut self) -> Gesture {
        let gesture = self.gestures[self.next];
        self.next = (self.next + 1) % self.gestures.len();
        gesture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_random_sampler_covers_every_label() {
        let mut sampler = RandomSampler::seeded(7);
        let mut seen: BTreeMap<Gesture, usize> = BTreeMap::new();
        for _ in 0..2000 {
            *seen.entry(sampler.sample()).or_default() += 1;
        }
        assert_eq!(seen.len(), Gesture::ALL.len());
        // Roughly uniform: expected 222 each
        assert!(seen.values().all(|&n| n > 120), "{:?}", seen);
    }

    #[test]
    fn test_seeded_samplers_repeat() {
        let mut a = RandomSampler::seeded(42);
        let mut b = RandomSampler::seeded(42);
        let left: Vec<_> = (0..20).map(|_| a.sample()).collect();
        let right: Vec<_> = (0..20).map(|_| b.sample()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_sequence_sampler_wraps() {
        let mut sampler = SequenceSampler::new(vec![Gesture::OkSign, Gesture::ThumbsDown]);
        let drawn: Vec<_> = (0..5).map(|_| sampler.sample()).collect();
        assert_eq!(
            drawn,
            vec![
                Gesture::OkSign,
                Gesture::ThumbsDown,
                Gesture::OkSign,
                Gesture::ThumbsDown,
                Gesture::OkSign
            ]
        );
    }

    #[test]
    fn test_empty_sequence_uses_all_labels() {
        let mut sampler = SequenceSampler::new(Vec::new());
        let drawn: Vec<_> = (0..Gesture::ALL.len()).map(|_| sampler.sample()).collect();
        assert_eq!(drawn, Gesture::ALL.to_vec());
    }
}
