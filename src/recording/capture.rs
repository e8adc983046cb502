//! Host-provided collaborators consumed by the record button.
//!
//! The widget core never talks to an audio device, a permission system or a
//! haptic engine directly. It goes through these traits so the terminal host,
//! tests and any other embedding can supply their own.

use std::path::{Path, PathBuf};

/// Codec settings for a capture session.
///
/// `format` follows the ffmpeg convention used in the config file:
/// `"codec [options]"`, e.g. `"pcm_s16le"` or `"libopencore_amrnb -ar 8000"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Requested capture rate in Hz
    pub sample_rate: u32,
    /// Format string, first token is the codec
    pub format: String,
}

impl CodecConfig {
    /// Voice-grade mono defaults: 8 kHz, uncompressed PCM.
    pub fn voice() -> Self {
        Self {
            sample_rate: 8000,
            format: "pcm_s16le".to_string(),
        }
    }

    /// First token of the format string.
    pub fn codec(&self) -> &str {
        self.format.split_whitespace().next().unwrap_or("pcm_s16le")
    }

    /// Whether the capture can be written straight to a WAV file.
    pub fn is_raw_pcm(&self) -> bool {
        self.codec() == "pcm_s16le"
    }

    /// File extension matching the codec.
    pub fn extension(&self) -> &str {
        match self.codec() {
            "pcm_s16le" => "wav",
            "libopus" | "libvorbis" => "ogg",
            "libopencore_amrnb" | "amr_nb" => "3gp",
            "flac" => "flac",
            "aac" => "m4a",
            other => other,
        }
    }

    /// Scratch file path for a session: fixed name, overwritten every time.
    pub fn scratch_path(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.{}", self.extension()))
    }
}

/// Platform audio capture primitive.
pub trait AudioCapture {
    /// Opaque handle to a running capture.
    type Handle;

    /// Opens the input device and starts writing to `output_path`.
    fn prepare_and_start(
        &mut self,
        output_path: &Path,
        codec: &CodecConfig,
    ) -> anyhow::Result<Self::Handle>;

    /// Largest absolute sample seen since the previous call, 0..=32767.
    fn peak_amplitude(&mut self, handle: &Self::Handle) -> i32;

    /// Finalizes the output file and releases the device.
    fn stop_and_release(&mut self, handle: Self::Handle) -> anyhow::Result<()>;
}

/// Record-audio permission as seen by the host.
pub trait PermissionGate {
    fn has_record_audio_permission(&self) -> bool;

    /// Asks for permission. The answer arrives later through the host.
    fn request_record_audio_permission(&mut self);
}

/// One-shot tactile cue.
pub trait Haptics {
    fn perform_cue(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_extension_mapping() {
        assert_eq!(CodecConfig::voice().extension(), "wav");
        let amr = CodecConfig {
            sample_rate: 8000,
            format: "libopencore_amrnb -ar 8000".to_string(),
        };
        assert_eq!(amr.codec(), "libopencore_amrnb");
        assert_eq!(amr.extension(), "3gp");
        assert!(!amr.is_raw_pcm());
    }

    #[test]
    fn test_scratch_path_is_fixed_per_codec() {
        let codec = CodecConfig::voice();
        let dir = Path::new("/tmp/voxhold");
        assert_eq!(
            codec.scratch_path(dir, "audio"),
            PathBuf::from("/tmp/voxhold/audio.wav")
        );
        assert_eq!(codec.scratch_path(dir, "audio"), codec.scratch_path(dir, "audio"));
    }
}
