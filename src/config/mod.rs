//! Configuration management for voxhold.
//!
//! Audio capture and widget settings live in a TOML file in the user's config
//! directory. Scratch recordings go to the user's cache directory.

pub mod file;

pub use file::{get_config_path, get_scratch_dir, AudioConfig, VoxholdConfig, WidgetConfig};
