//! Visualization state for the recording display.

pub mod waveform;

pub use waveform::{bar_height, AmplitudeSample, WaveformHistory, MIN_BAR_HEIGHT};
