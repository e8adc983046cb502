//! Interactive record screen.
//!
//! Hosts the hold-to-record widget with a start and a stop button. The widget
//! is driven from a single task: terminal input arrives over a channel, the
//! animation tick is a cancellable deadline, and repaints follow the widget's
//! redraw signal. SIGUSR1 stops an active recording from outside.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{self, VoxholdConfig};
use crate::recording::capture::{AudioCapture, Haptics};
use crate::recording::{
    wait_for_tick, CpalCapture, DrawList, HostAction, InputDeviceGate, PermissionGate,
    PointerRouter, RecordingController, RecordingError, StopOutcome, TerminalBell,
    VoiceRecordView, VoxholdTui,
};
use crate::ui::ErrorScreen;

type HostWidget = VoiceRecordView<CpalCapture, TerminalBell>;

const INPUT_POLL: Duration = Duration::from_millis(50);
const SIGNAL_POLL: Duration = Duration::from_millis(100);

/// Runs the record screen until the user quits.
///
/// # Errors
/// - If the configuration is invalid
/// - If the terminal cannot be set up or drawn
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== voxhold recorder started ===");

    let config_data = match VoxholdConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            let error_message = format!(
                "Configuration Error:\n\n{err:#}\n\nPlease check your ~/.config/voxhold/voxhold.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err:#}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, format={}, bars={}, tick={}ms/{}ms",
        config_data.audio.device,
        config_data.audio.sample_rate,
        config_data.audio.output_format,
        config_data.widget.number_of_bars,
        config_data.widget.tick_interval_ms,
        config_data.widget.sampling_interval_ms
    );

    let controller = RecordingController::new(
        CpalCapture::new(config_data.audio.device.clone()),
        config_data.codec(),
        config::get_scratch_dir(),
        config_data.audio.scratch_name.clone(),
    );
    let mut widget = VoiceRecordView::new(
        controller,
        config_data.widget.animator_settings(),
        TerminalBell,
        config_data.widget.discard_on_cancel,
    );
    let mut gate = InputDeviceGate::new(config_data.audio.device.clone());

    let external_stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&external_stop))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = VoxholdTui::new(config_data.widget.height_rows)?;
    let mut surface = DrawList::new();
    measure(&mut widget, &tui, &surface);

    let mut redraw = widget.subscribe_redraw();
    let mut events = spawn_input_reader();
    let mut router = PointerRouter::default();
    let mut signal_poll = tokio::time::interval(SIGNAL_POLL);
    let mut status = String::from("Ready");

    render(&mut tui, &widget, &mut surface, &status)?;

    loop {
        tokio::select! {
            _ = wait_for_tick(widget.next_tick()) => {
                widget.on_tick(Instant::now());
            }
            changed = redraw.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&mut tui, &widget, &mut surface, &status)?;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Terminal input closed");
                    break;
                };
                match router.route(&event, tui.layout()) {
                    HostAction::Start => status = start(&mut widget, &mut gate),
                    HostAction::Stop => {
                        if let Some(outcome) = widget.stop_recording() {
                            status = describe(&outcome);
                        }
                    }
                    HostAction::Pointer(pointer) => {
                        if let Some(outcome) = widget.handle_pointer(pointer) {
                            status = describe(&outcome);
                        }
                    }
                    HostAction::Resize => {
                        tui.relayout()?;
                        measure(&mut widget, &tui, &surface);
                    }
                    HostAction::Quit => break,
                    HostAction::None => continue,
                }
                render(&mut tui, &widget, &mut surface, &status)?;
            }
            _ = signal_poll.tick() => {
                if external_stop.swap(false, Ordering::Relaxed) {
                    tracing::info!("Received SIGUSR1: stopping recording");
                    if let Some(outcome) = widget.stop_recording() {
                        status = describe(&outcome);
                        render(&mut tui, &widget, &mut surface, &status)?;
                    }
                }
            }
        }
    }

    if let Some(outcome) = widget.stop_recording() {
        tracing::info!("{}", describe(&outcome));
    }
    tui.cleanup()?;
    tracing::info!("=== voxhold recorder exited ===");
    Ok(())
}

/// Starts a recording after checking record permission.
///
/// Returns the status line to show.
fn start<C: AudioCapture, H: Haptics>(
    widget: &mut VoiceRecordView<C, H>,
    gate: &mut impl PermissionGate,
) -> String {
    if widget.is_recording() {
        return "Recording".to_string();
    }
    if !gate.has_record_audio_permission() {
        gate.request_record_audio_permission();
        return RecordingError::PermissionDenied.to_string();
    }
    match widget.start_recording(Instant::now()) {
        Ok(()) => "Recording".to_string(),
        Err(e) => {
            tracing::error!("Failed to start recording: {}", e);
            e.to_string()
        }
    }
}

fn describe(outcome: &StopOutcome) -> String {
    match outcome {
        StopOutcome::Stopped(path) => format!("Saved {}", path.display()),
        StopOutcome::Failed(_) => "Recording failed to finalize, see logs".to_string(),
        StopOutcome::Cancelled {
            discarded: true, ..
        } => "Cancelled, recording discarded".to_string(),
        StopOutcome::Cancelled { path, .. } => format!("Cancelled, kept {}", path.display()),
    }
}

fn measure(widget: &mut HostWidget, tui: &VoxholdTui, surface: &DrawList) {
    let (width, height) = tui.layout().widget_size();
    widget.measure(width, height, surface);
}

fn render(
    tui: &mut VoxholdTui,
    widget: &HostWidget,
    surface: &mut DrawList,
    status: &str,
) -> anyhow::Result<()> {
    surface.clear();
    widget.paint(surface);
    let line = if widget.is_recording() {
        format!("{} {}", widget.elapsed_label(), status)
    } else {
        status.to_string()
    };
    tui.render(surface, widget.is_recording(), &line)
}

/// Reads terminal events on a blocking thread and forwards them.
///
/// The thread exits once the receiver is dropped.
fn spawn_input_reader() -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel(64);
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Failed to poll terminal events: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::controller::tests::controller;
    use std::path::PathBuf;

    struct FakeGate {
        granted: bool,
        requests: usize,
    }

    impl PermissionGate for FakeGate {
        fn has_record_audio_permission(&self) -> bool {
            self.granted
        }

        fn request_record_audio_permission(&mut self) {
            self.requests += 1;
        }
    }

    struct SilentHaptics;

    impl Haptics for SilentHaptics {
        fn perform_cue(&mut self) {}
    }

    fn view(
        dir: &std::path::Path,
    ) -> VoiceRecordView<crate::recording::controller::tests::FakeCapture, SilentHaptics> {
        let (controller, _) = controller(dir);
        VoiceRecordView::new(
            controller,
            crate::recording::AnimatorSettings::default(),
            SilentHaptics,
            true,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requests_missing_permission() {
        let dir = tempfile::tempdir().unwrap();
        let mut widget = view(dir.path());
        let mut gate = FakeGate {
            granted: false,
            requests: 0,
        };

        let status = start(&mut widget, &mut gate);
        assert_eq!(status, RecordingError::PermissionDenied.to_string());
        assert_eq!(gate.requests, 1);
        assert!(!widget.is_recording());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_release_status_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, device) = controller(dir.path());
        device.borrow_mut().fail_release = true;
        let mut widget = VoiceRecordView::new(
            controller,
            crate::recording::AnimatorSettings::default(),
            SilentHaptics,
            true,
        );
        let mut gate = FakeGate {
            granted: true,
            requests: 0,
        };

        assert_eq!(start(&mut widget, &mut gate), "Recording");
        let outcome = widget.stop_recording().unwrap();
        let status = describe(&outcome);
        assert_eq!(status, "Recording failed to finalize, see logs");
        assert!(!status.starts_with("Saved"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_permission_records_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut widget = view(dir.path());
        let mut gate = FakeGate {
            granted: true,
            requests: 0,
        };

        assert_eq!(start(&mut widget, &mut gate), "Recording");
        assert!(widget.is_recording());
        assert!(widget.next_tick().is_some());

        // Already recording: the gate is not consulted again
        gate.granted = false;
        assert_eq!(start(&mut widget, &mut gate), "Recording");
        assert_eq!(gate.requests, 0);

        assert!(matches!(
            widget.stop_recording(),
            Some(StopOutcome::Stopped(_))
        ));
    }

    #[test]
    fn test_describe_outcomes() {
        let path = PathBuf::from("/tmp/voxhold/audio.wav");
        assert_eq!(
            describe(&StopOutcome::Stopped(path.clone())),
            "Saved /tmp/voxhold/audio.wav"
        );
        assert_eq!(
            describe(&StopOutcome::Failed(path.clone())),
            "Recording failed to finalize, see logs"
        );
        assert_eq!(
            describe(&StopOutcome::Cancelled {
                path: path.clone(),
                discarded: true
            }),
            "Cancelled, recording discarded"
        );
        assert_eq!(
            describe(&StopOutcome::Cancelled {
                path,
                discarded: false
            }),
            "Cancelled, kept /tmp/voxhold/audio.wav"
        );
    }
}
