//! Hold-to-record widget.
//!
//! Provides the recording lifecycle, the sampling and animation loop behind
//! the scrolling waveform, drag-to-cancel gesture handling, and the terminal
//! host that embeds the widget.

pub mod animator;
pub mod audio;
pub mod capture;
pub mod controller;
pub mod ffmpeg;
pub mod gesture;
pub mod render;
pub mod scheduler;
pub mod ui;
pub mod visualizations;
pub mod widget;

pub use animator::AnimatorSettings;
pub use audio::{CpalCapture, InputDeviceGate};
pub use capture::{CodecConfig, PermissionGate};
pub use controller::{RecordingController, RecordingError};
pub use render::DrawList;
pub use scheduler::wait_for_tick;
pub use ui::{HostAction, PointerRouter, TerminalBell, VoxholdTui};
pub use widget::{StopOutcome, VoiceRecordView};
