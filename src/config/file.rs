//! Configuration file management for voxhold.
//!
//! Loads and saves the TOML configuration from the user's config directory.
//! A missing file is created with defaults on first load.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::recording::{AnimatorSettings, CodecConfig};

/// Audio capture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `voxhold list-devices`
    /// - device name from `voxhold list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz (8000 is voice grade)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Output format string: "codec [ffmpeg_options]". "pcm_s16le" writes WAV without ffmpeg.
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Scratch file name (without extension), overwritten every recording
    #[serde(default = "default_scratch_name")]
    pub scratch_name: String,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    8000
}

fn default_output_format() -> String {
    "pcm_s16le".to_string()
}

fn default_scratch_name() -> String {
    "audio".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            output_format: default_output_format(),
            scratch_name: default_scratch_name(),
        }
    }
}

/// Record widget appearance and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Number of bars in the scrolling waveform
    #[serde(default = "default_number_of_bars")]
    pub number_of_bars: usize,
    /// Milliseconds between new bars
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,
    /// Animation tick in milliseconds; must evenly divide the sampling interval
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Smallest bar height as a fraction of the bar area
    #[serde(default = "default_min_bar_height")]
    pub min_bar_height: f32,
    /// Delete the scratch file when a recording is cancelled by dragging off the button
    #[serde(default = "default_true")]
    pub discard_on_cancel: bool,
    /// Widget height in terminal rows
    #[serde(default = "default_height_rows")]
    pub height_rows: u16,
}

fn default_number_of_bars() -> usize {
    57
}

fn default_sampling_interval_ms() -> u64 {
    100
}

fn default_tick_interval_ms() -> u64 {
    25
}

fn default_min_bar_height() -> f32 {
    0.05
}

fn default_true() -> bool {
    true
}

fn default_height_rows() -> u16 {
    8
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            number_of_bars: default_number_of_bars(),
            sampling_interval_ms: default_sampling_interval_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            min_bar_height: default_min_bar_height(),
            discard_on_cancel: true,
            height_rows: default_height_rows(),
        }
    }
}

impl WidgetConfig {
    pub fn animator_settings(&self) -> AnimatorSettings {
        AnimatorSettings {
            number_of_bars: self.number_of_bars,
            sampling_interval: self.sampling_interval_ms,
            tick_interval: self.tick_interval_ms,
            min_bar_height: self.min_bar_height,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoxholdConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
}

impl VoxholdConfig {
    /// Loads configuration from the user's config directory, creating it with
    /// defaults when missing.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the file cannot be read or written
    /// - If the TOML is malformed or fails validation
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Default configuration written to {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: VoxholdConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// # Errors
    /// - If the widget timing or sizing is inconsistent
    /// - If the audio format or sample rate is empty
    pub fn validate(&self) -> anyhow::Result<()> {
        self.widget.animator_settings().validate()?;
        if self.widget.height_rows < 2 {
            return Err(anyhow!("widget.height_rows must be at least 2"));
        }
        if self.audio.sample_rate == 0 {
            return Err(anyhow!("audio.sample_rate must be greater than 0"));
        }
        if self.audio.output_format.trim().is_empty() {
            return Err(anyhow!("audio.output_format must not be empty"));
        }
        if self.audio.scratch_name.trim().is_empty() {
            return Err(anyhow!("audio.scratch_name must not be empty"));
        }
        Ok(())
    }

    pub fn codec(&self) -> CodecConfig {
        CodecConfig {
            sample_rate: self.audio.sample_rate,
            format: self.audio.output_format.clone(),
        }
    }
}

/// Path of the config file, `~/.config/voxhold/voxhold.toml`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("voxhold").join("voxhold.toml"))
}

/// Private cache directory for scratch recordings, under the temp dir when
/// there is no user cache directory.
pub fn get_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("voxhold")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("voxhold.toml");

        let config = VoxholdConfig::load_from(&path).unwrap();
        assert_eq!(config, VoxholdConfig::default());
        assert!(path.exists());

        let reloaded = VoxholdConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxhold.toml");
        fs::write(&path, "[widget]\nnumber_of_bars = 40\n").unwrap();

        let config = VoxholdConfig::load_from(&path).unwrap();
        assert_eq!(config.widget.number_of_bars, 40);
        assert_eq!(config.widget.tick_interval_ms, 25);
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.codec().extension(), "wav");
    }

    #[test]
    fn test_uneven_intervals_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxhold.toml");
        fs::write(
            &path,
            "[widget]\nsampling_interval_ms = 100\ntick_interval_ms = 30\n",
        )
        .unwrap();

        let err = VoxholdConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("sampling_interval_ms"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxhold.toml");
        fs::write(&path, "[widget\n").unwrap();
        assert!(VoxholdConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_scratch_dir_is_app_specific() {
        assert!(get_scratch_dir().ends_with("voxhold"));
    }

    #[test]
    fn test_too_many_bars_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxhold.toml");
        fs::write(&path, "[widget]\nnumber_of_bars = 1000000\n").unwrap();

        let err = VoxholdConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("number_of_bars"));
    }

    #[test]
    fn test_animator_settings_mapping() {
        let settings = WidgetConfig::default().animator_settings();
        assert_eq!(settings, AnimatorSettings::default());
    }
}
