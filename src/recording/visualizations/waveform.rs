//! Time-domain waveform history.
//!
//! Holds the scrolling, fixed-capacity buffer of bar heights shown next to the
//! record button. Oldest bars fall off the left edge as new ones arrive.

use std::collections::VecDeque;

/// Smallest height a bar is ever drawn with, as a fraction of the bar area.
pub const MIN_BAR_HEIGHT: f32 = 0.05;

/// A single normalized bar height in `[floor, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeSample(f32);

impl AmplitudeSample {
    /// Builds a sample from a calibrated amplitude, clamping into `[floor, 1.0]`.
    ///
    /// Silence, negative values and NaN/infinite readings all collapse to `floor`.
    pub fn new(value: f32, floor: f32) -> Self {
        if !value.is_finite() || value <= floor {
            return Self(floor);
        }
        Self(value.min(1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Bounded FIFO of amplitude samples in chronological order.
#[derive(Debug, Clone)]
pub struct WaveformHistory {
    samples: VecDeque<AmplitudeSample>,
    capacity: usize,
}

impl WaveformHistory {
    /// Creates an empty history holding at most `capacity` bars.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest when already full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: AmplitudeSample) -> Option<AmplitudeSample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = AmplitudeSample> + '_ {
        self.samples.iter().copied()
    }

    pub fn newest(&self) -> Option<AmplitudeSample> {
        self.samples.back().copied()
    }
}

/// Height fraction a bar is drawn with.
///
/// The newest bar is scaled by the growth factor so it rises smoothly between
/// samples; every bar is floored at `floor`.
pub fn bar_height(sample: AmplitudeSample, is_newest: bool, growth: f32, floor: f32) -> f32 {
    let height = if is_newest {
        sample.value() * growth
    } else {
        sample.value()
    };
    if height.is_finite() {
        height.max(floor)
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: f32) -> AmplitudeSample {
        AmplitudeSample(value)
    }

    #[test]
    fn test_sample_floor_for_silence_and_nan() {
        assert_eq!(AmplitudeSample::new(0.0, MIN_BAR_HEIGHT).value(), MIN_BAR_HEIGHT);
        assert_eq!(AmplitudeSample::new(-3.2, MIN_BAR_HEIGHT).value(), MIN_BAR_HEIGHT);
        assert_eq!(AmplitudeSample::new(f32::NAN, MIN_BAR_HEIGHT).value(), MIN_BAR_HEIGHT);
        assert_eq!(
            AmplitudeSample::new(f32::NEG_INFINITY, MIN_BAR_HEIGHT).value(),
            MIN_BAR_HEIGHT
        );
    }

    #[test]
    fn test_sample_capped_at_full_height() {
        assert_eq!(AmplitudeSample::new(1.034, MIN_BAR_HEIGHT).value(), 1.0);
        assert_eq!(AmplitudeSample::new(0.5, MIN_BAR_HEIGHT).value(), 0.5);
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut history = WaveformHistory::new(57);
        for i in 0..500 {
            history.push(raw(i as f32));
            assert!(history.len() <= 57);
        }
        assert!(history.is_full());
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut history = WaveformHistory::new(57);
        let mut evicted = Vec::new();
        for i in 0..=60 {
            if let Some(old) = history.push(raw(i as f32)) {
                evicted.push(old.value());
            }
        }

        assert_eq!(evicted, vec![0.0, 1.0, 2.0, 3.0]);
        let contents: Vec<f32> = history.iter().map(AmplitudeSample::value).collect();
        let expected: Vec<f32> = (4..=60).map(|i| i as f32).collect();
        assert_eq!(contents, expected);
        assert_eq!(history.newest(), Some(raw(60.0)));
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = WaveformHistory::new(3);
        history.push(raw(0.2));
        history.push(raw(0.4));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 3);
    }

    #[test]
    fn test_bar_height_grows_only_newest() {
        let sample = raw(0.8);
        assert!((bar_height(sample, true, 0.5, MIN_BAR_HEIGHT) - 0.4).abs() < 1e-6);
        assert_eq!(bar_height(sample, false, 0.5, MIN_BAR_HEIGHT), 0.8);
        assert_eq!(bar_height(raw(0.1), true, 0.25, MIN_BAR_HEIGHT), MIN_BAR_HEIGHT);
        assert_eq!(bar_height(sample, true, f32::NAN, MIN_BAR_HEIGHT), MIN_BAR_HEIGHT);
    }
}
