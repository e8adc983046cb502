//! Recording lifecycle: idle → recording → idle.
//!
//! The controller exclusively owns the capture handle. Everything else reads
//! amplitude and elapsed time through [`SampleSource`].

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::capture::{AudioCapture, CodecConfig};

/// Full-scale reading of the platform peak-amplitude primitive.
const REFERENCE_MAX: f64 = 32767.0;
/// Linear rescale applied to the decibel reading so speech fills the bar area.
const DB_SCALE: f32 = 0.01234;
const DB_OFFSET: f32 = 1.03402;

/// Failures reported by [`RecordingController::start`].
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Capture device busy, missing, or could not be opened.
    #[error("audio capture device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The host has not been granted record-audio permission.
    #[error("record audio permission has not been granted")]
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Read side of the controller used by the waveform animator.
pub trait SampleSource {
    fn is_recording(&self) -> bool;

    /// Milliseconds of animation time in the current session, 0 when idle.
    fn elapsed_millis(&self) -> u64;

    fn advance_elapsed(&mut self, millis: u64);

    /// Calibrated amplitude of the latest peak, 0 when idle.
    fn current_amplitude(&mut self) -> f32;
}

/// A session that has been stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRecording {
    pub path: PathBuf,
    /// False when the capture could not be finalized and `path` may be missing
    pub saved: bool,
}

struct RecordingSession<H> {
    handle: H,
    output_path: PathBuf,
    elapsed_millis: u64,
}

/// Owns one capture resource at a time.
pub struct RecordingController<C: AudioCapture> {
    capture: C,
    codec: CodecConfig,
    scratch_dir: PathBuf,
    scratch_name: String,
    session: Option<RecordingSession<C::Handle>>,
}

impl<C: AudioCapture> RecordingController<C> {
    pub fn new(capture: C, codec: CodecConfig, scratch_dir: PathBuf, scratch_name: String) -> Self {
        Self {
            capture,
            codec,
            scratch_dir,
            scratch_name,
            session: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.session.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    /// Scratch file every session writes to.
    pub fn scratch_path(&self) -> PathBuf {
        self.codec.scratch_path(&self.scratch_dir, &self.scratch_name)
    }

    /// Opens a new capture session.
    ///
    /// Already recording is a no-op. On failure the controller stays idle and
    /// is ready for another attempt.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if the scratch directory or the device cannot be prepared
    pub fn start(&mut self) -> Result<(), RecordingError> {
        if self.session.is_some() {
            tracing::debug!("start requested while already recording");
            return Ok(());
        }

        std::fs::create_dir_all(&self.scratch_dir).map_err(|e| {
            RecordingError::DeviceUnavailable(format!(
                "cannot create {}: {e}",
                self.scratch_dir.display()
            ))
        })?;

        let output_path = self.scratch_path();
        let handle = self
            .capture
            .prepare_and_start(&output_path, &self.codec)
            .map_err(|e| {
                tracing::error!("Failed to start capture: {e:#}");
                RecordingError::DeviceUnavailable(format!("{e:#}"))
            })?;

        tracing::info!("Recording started: {}", output_path.display());
        self.session = Some(RecordingSession {
            handle,
            output_path,
            elapsed_millis: 0,
        });
        Ok(())
    }

    /// Finalizes and releases the capture. Idle is a no-op.
    ///
    /// Returns the finished file when a session was active. Release errors are
    /// logged and reported through [`FinishedRecording::saved`], never returned.
    ///
    /// Runs on the caller's thread. For non-PCM codecs this includes the ffmpeg
    /// conversion, so the caller's event loop is blocked until it completes.
    pub fn stop(&mut self) -> Option<FinishedRecording> {
        let session = self.session.take()?;
        let saved = match self.capture.stop_and_release(session.handle) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Error while releasing capture: {e:#}");
                false
            }
        };
        tracing::info!(
            "Recording stopped after {}ms: {} (saved: {})",
            session.elapsed_millis,
            session.output_path.display(),
            saved
        );
        Some(FinishedRecording {
            path: session.output_path,
            saved,
        })
    }

    /// Stops like [`stop`](Self::stop) and optionally deletes the scratch file.
    ///
    /// Returns the scratch path when a session was active.
    pub fn cancel(&mut self, discard: bool) -> Option<PathBuf> {
        let path = self.stop()?.path;
        if discard {
            discard_file(&path);
        }
        Some(path)
    }
}

impl<C: AudioCapture> SampleSource for RecordingController<C> {
    fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    fn elapsed_millis(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.elapsed_millis)
    }

    fn advance_elapsed(&mut self, millis: u64) {
        if let Some(session) = self.session.as_mut() {
            session.elapsed_millis += millis;
        }
    }

    fn current_amplitude(&mut self) -> f32 {
        let Some(session) = self.session.as_ref() else {
            return 0.0;
        };
        let peak = self.capture.peak_amplitude(&session.handle);
        calibrate_amplitude(peak)
    }
}

/// Maps a raw peak reading onto the bar-height scale.
///
/// Zero or negative peaks give a non-finite decibel value and map to 0.
pub fn calibrate_amplitude(peak: i32) -> f32 {
    let db = 20.0 * (peak as f64 / REFERENCE_MAX).log10();
    let value = db as f32 * DB_SCALE + DB_OFFSET;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn discard_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!("Discarded cancelled recording: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to discard {}: {}", path.display(), e),
    }
}
