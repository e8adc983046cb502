//! Sampling and animation loop for the waveform display.
//!
//! Every tick interval the animator pulls time and amplitude from the
//! recording controller, folds a new bar into the history once per sampling
//! interval, and advances the growth and scroll animation in between.

use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::time::Instant;

use super::controller::SampleSource;
use super::scheduler::TickSchedule;
use super::visualizations::{AmplitudeSample, WaveformHistory, MIN_BAR_HEIGHT};

/// Upper bound on the bar count; the history preallocates one slot per bar.
pub const MAX_BARS: usize = 1024;

/// Timing and sizing knobs of the animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorSettings {
    pub number_of_bars: usize,
    /// Period between new bars, ms
    pub sampling_interval: u64,
    /// Scheduling granularity, ms
    pub tick_interval: u64,
    pub min_bar_height: f32,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            number_of_bars: 57,
            sampling_interval: 100,
            tick_interval: 25,
            min_bar_height: MIN_BAR_HEIGHT,
        }
    }
}

impl AnimatorSettings {
    /// Fraction of a sampling interval covered by one tick.
    pub fn growth_step(&self) -> f32 {
        self.tick_interval as f32 / self.sampling_interval as f32
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_interval)
    }

    /// # Errors
    /// - If the tick interval is zero or does not evenly divide the sampling interval
    /// - If the bar count is outside 1..=`MAX_BARS` or the bar floor is outside (0, 1)
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval == 0 {
            return Err(anyhow!("tick_interval_ms must be greater than 0"));
        }
        if self.sampling_interval == 0 || self.sampling_interval % self.tick_interval != 0 {
            return Err(anyhow!(
                "sampling_interval_ms ({}) must be a positive multiple of tick_interval_ms ({})",
                self.sampling_interval,
                self.tick_interval
            ));
        }
        if self.number_of_bars == 0 || self.number_of_bars > MAX_BARS {
            return Err(anyhow!(
                "number_of_bars ({}) must be between 1 and {}",
                self.number_of_bars,
                MAX_BARS
            ));
        }
        if !(self.min_bar_height > 0.0 && self.min_bar_height < 1.0) {
            return Err(anyhow!(
                "min_bar_height ({}) must be between 0 and 1",
                self.min_bar_height
            ));
        }
        Ok(())
    }
}

/// Per-tick derived state read by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub elapsed_label: String,
    /// Progress of the newest bar's growth animation
    pub growth_factor: f32,
    /// Leftward shift of all bars once the history is full
    pub scroll_offset: f32,
}

impl FrameState {
    fn reset(growth_factor: f32) -> Self {
        Self {
            elapsed_label: format_elapsed(0),
            growth_factor,
            scroll_offset: 0.0,
        }
    }
}

/// Formats elapsed animation time as zero-padded `mm:ss`.
pub fn format_elapsed(elapsed_millis: u64) -> String {
    let secs = elapsed_millis / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub struct WaveformAnimator {
    settings: AnimatorSettings,
    history: WaveformHistory,
    frame: FrameState,
    bar_width: f32,
    label_second: Option<u64>,
    schedule: Option<TickSchedule>,
}

impl WaveformAnimator {
    pub fn new(settings: AnimatorSettings) -> Self {
        Self {
            settings,
            history: WaveformHistory::new(settings.number_of_bars),
            frame: FrameState::reset(settings.growth_step()),
            bar_width: 0.0,
            label_second: None,
            schedule: None,
        }
    }

    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn history(&self) -> &WaveformHistory {
        &self.history
    }

    /// Width of one bar in surface units, set by the layout pass.
    pub fn set_bar_width(&mut self, bar_width: f32) {
        self.bar_width = bar_width.max(0.0);
    }

    pub fn schedule(&self) -> Option<&TickSchedule> {
        self.schedule.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.schedule.as_ref().is_some_and(|s| !s.is_cancelled())
    }

    /// Starts the tick chain with the first tick due at `now`.
    pub fn begin(&mut self, now: Instant) {
        if let Some(previous) = self.schedule.take() {
            previous.cancel();
        }
        self.label_second = None;
        self.schedule = Some(TickSchedule::starting_at(now));
    }

    /// Runs one animation step. Returns whether state changed and needs a redraw.
    ///
    /// Ignored when the source is no longer recording or the chain was cancelled.
    pub fn on_tick(&mut self, source: &mut impl SampleSource, now: Instant) -> bool {
        if !source.is_recording() || !self.is_running() {
            return false;
        }

        let elapsed = source.elapsed_millis();
        let second = elapsed / 1000;
        if self.label_second != Some(second) {
            self.frame.elapsed_label = format_elapsed(elapsed);
            self.label_second = Some(second);
        }

        let step = self.settings.growth_step();
        if elapsed % self.settings.sampling_interval == 0 {
            let amplitude = source.current_amplitude();
            let sample = AmplitudeSample::new(amplitude, self.settings.min_bar_height);
            if let Some(evicted) = self.history.push(sample) {
                tracing::trace!("Evicted bar {:.3} at {}ms", evicted.value(), elapsed);
                self.frame.scroll_offset = 0.0;
            }
            self.frame.growth_factor = step;
        } else {
            self.frame.growth_factor = (self.frame.growth_factor + step).min(1.0);
            if self.history.is_full() {
                self.frame.scroll_offset += self.bar_width * step;
            }
        }

        source.advance_elapsed(self.settings.tick_interval);
        if let Some(schedule) = self.schedule.as_mut() {
            schedule.reschedule(now + self.settings.tick_duration());
        }
        true
    }

    /// Cancels the tick chain and resets all animation state.
    pub fn on_recording_stopped(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }
        self.history.clear();
        self.label_second = None;
        self.frame = FrameState::reset(self.settings.growth_step());
    }
}
