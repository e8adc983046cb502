//! The hold-to-record widget.
//!
//! Owns the recording controller, the waveform animator and the cancel
//! gesture, and is the single entry point for the host: start/stop, timer
//! ticks, pointer events, measuring and painting. State changes are announced
//! on a redraw channel.

use std::path::PathBuf;
use tokio::sync::watch;
use tokio::time::Instant;

use super::animator::{AnimatorSettings, WaveformAnimator};
use super::capture::{AudioCapture, Haptics};
use super::controller::{RecordingController, RecordingError, RecordingState, SampleSource};
use super::gesture::{CancelGesture, PointerEvent};
use super::render::{paint, Layout, RenderSurface, Snapshot};
use super::scheduler::TickSchedule;

/// How a recording ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Normal stop; the file is kept
    Stopped(PathBuf),
    /// Stop whose capture could not be finalized; the file may be missing
    Failed(PathBuf),
    /// Drag-out-and-release cancel
    Cancelled { path: PathBuf, discarded: bool },
}

pub struct VoiceRecordView<C: AudioCapture, H: Haptics> {
    controller: RecordingController<C>,
    animator: WaveformAnimator,
    gesture: CancelGesture,
    haptics: H,
    layout: Layout,
    discard_on_cancel: bool,
    redraw: watch::Sender<u64>,
}

impl<C: AudioCapture, H: Haptics> VoiceRecordView<C, H> {
    pub fn new(
        controller: RecordingController<C>,
        settings: AnimatorSettings,
        haptics: H,
        discard_on_cancel: bool,
    ) -> Self {
        let (redraw, _) = watch::channel(0);
        Self {
            controller,
            animator: WaveformAnimator::new(settings),
            gesture: CancelGesture::default(),
            haptics,
            layout: Layout::default(),
            discard_on_cancel,
            redraw,
        }
    }

    /// Receiver bumped every time the widget needs repainting.
    pub fn subscribe_redraw(&self) -> watch::Receiver<u64> {
        self.redraw.subscribe()
    }

    fn emit_redraw(&self) {
        self.redraw.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn state(&self) -> RecordingState {
        self.controller.state()
    }

    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    pub fn is_armed_to_cancel(&self) -> bool {
        self.gesture.is_armed_to_cancel()
    }

    pub fn elapsed_label(&self) -> &str {
        &self.animator.frame().elapsed_label
    }

    pub fn bar_count(&self) -> usize {
        self.animator.history().len()
    }

    pub fn bar_width(&self) -> f32 {
        self.layout.bar_width
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn animator(&self) -> &WaveformAnimator {
        &self.animator
    }

    /// Schedule of the next animation tick, if the chain is running.
    pub fn next_tick(&self) -> Option<TickSchedule> {
        self.animator.schedule().cloned()
    }

    /// Recomputes geometry for a new size.
    pub fn measure(&mut self, width: f32, height: f32, surface: &impl RenderSurface) {
        let bars = self.animator.settings().number_of_bars;
        self.layout = Layout::measure(width, height, bars, surface);
        self.animator.set_bar_width(self.layout.bar_width);
        self.emit_redraw();
    }

    /// Opens the capture and starts the tick chain, first tick due at `now`.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if the capture could not be started; the widget stays idle
    pub fn start_recording(&mut self, now: Instant) -> Result<(), RecordingError> {
        if self.controller.is_recording() {
            return Ok(());
        }
        self.controller.start()?;
        self.gesture.reset();
        self.animator.begin(now);
        self.emit_redraw();
        Ok(())
    }

    /// Stops the recording and resets the animation. Idle is a no-op.
    pub fn stop_recording(&mut self) -> Option<StopOutcome> {
        let outcome = self.controller.stop().map(|finished| {
            if finished.saved {
                StopOutcome::Stopped(finished.path)
            } else {
                StopOutcome::Failed(finished.path)
            }
        });
        self.finish();
        outcome
    }

    fn cancel_recording(&mut self) -> Option<StopOutcome> {
        let discarded = self.discard_on_cancel;
        let outcome = self
            .controller
            .cancel(discarded)
            .map(|path| StopOutcome::Cancelled { path, discarded });
        if outcome.is_some() {
            tracing::info!("Recording cancelled by gesture");
        }
        self.finish();
        outcome
    }

    fn finish(&mut self) {
        self.gesture.reset();
        self.animator.on_recording_stopped();
        self.emit_redraw();
    }

    /// Runs one animation tick. Returns whether a redraw was signalled.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let changed = self.animator.on_tick(&mut self.controller, now);
        if changed {
            self.emit_redraw();
        }
        changed
    }

    /// Feeds a pointer event through the cancel gesture.
    ///
    /// Returns the outcome when the event cancelled the recording.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<StopOutcome> {
        let zone = self.layout.hit_zone();
        let outcome = self.gesture.handle(event, self.controller.is_recording(), &zone);
        if outcome.haptic {
            self.haptics.perform_cue();
        }
        if outcome.cancel {
            return self.cancel_recording();
        }
        if outcome.changed {
            self.emit_redraw();
        }
        None
    }

    pub fn paint(&self, surface: &mut impl RenderSurface) {
        let snapshot = Snapshot {
            frame: self.animator.frame(),
            history: self.animator.history(),
            armed_to_cancel: self.gesture.is_armed_to_cancel(),
            min_bar_height: self.animator.settings().min_bar_height,
        };
        paint(surface, &self.layout, &snapshot);
    }
}
