//! Microphone capture backed by cpal and hound.
//!
//! Audio from the configured input device is mixed down to mono, streamed into
//! a 16-bit WAV file and tracked for its running peak. Non-PCM codecs are
//! produced from that WAV by ffmpeg when the capture is released.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::capture::{AudioCapture, CodecConfig, PermissionGate};
use super::ffmpeg;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

type SharedWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Captures from a named, indexed or default input device.
pub struct CpalCapture {
    /// Device name, numeric index, or "default"
    device_name: String,
}

/// A running capture. Dropping the stream stops the device callback.
pub struct CpalHandle {
    stream: cpal::Stream,
    writer: SharedWriter,
    peak: Arc<AtomicI32>,
    wav_path: PathBuf,
    output_path: PathBuf,
    codec: CodecConfig,
}

impl CpalCapture {
    pub fn new(device_name: String) -> Self {
        Self { device_name }
    }
}

impl AudioCapture for CpalCapture {
    type Handle = CpalHandle;

    fn prepare_and_start(&mut self, output_path: &Path, codec: &CodecConfig) -> Result<CpalHandle> {
        let device = suppress_alsa_warnings(|| open_device(&self.device_name))?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        if device_rate != codec.sample_rate {
            tracing::warn!(
                "Requested {}Hz but device uses {}Hz. Capturing at device rate.",
                codec.sample_rate,
                device_rate
            );
        }

        let wav_path = if codec.is_raw_pcm() {
            output_path.to_path_buf()
        } else {
            output_path.with_extension("capture.wav")
        };
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: device_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(&wav_path, spec)
            .with_context(|| format!("Failed to create {}", wav_path.display()))?;
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer)));
        let peak = Arc::new(AtomicI32::new(0));

        let stream = match device_config.sample_format() {
            cpal::SampleFormat::I16 => build_stream::<i16>(
                &device,
                &device_config.into(),
                channels,
                &writer,
                &peak,
                |s| s,
            )?,
            cpal::SampleFormat::F32 => build_stream::<f32>(
                &device,
                &device_config.into(),
                channels,
                &writer,
                &peak,
                |s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16,
            )?,
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };
        stream.play()?;

        tracing::debug!("Capture stream started: {}Hz, {} channels", device_rate, channels);
        Ok(CpalHandle {
            stream,
            writer,
            peak,
            wav_path,
            output_path: output_path.to_path_buf(),
            codec: codec.clone(),
        })
    }

    fn peak_amplitude(&mut self, handle: &CpalHandle) -> i32 {
        handle.peak.swap(0, Ordering::Relaxed)
    }

    fn stop_and_release(&mut self, handle: CpalHandle) -> Result<()> {
        if let Err(e) = handle.stream.pause() {
            tracing::debug!("Failed to pause stream: {e}");
        }
        drop(handle.stream);

        if let Some(writer) = lock(&handle.writer).take() {
            writer.finalize()?;
        }

        if !handle.codec.is_raw_pcm() {
            convert_capture(&handle.wav_path, &handle.output_path, &handle.codec)?;
        }

        let size = std::fs::metadata(&handle.output_path)?.len();
        tracing::info!(
            "Audio saved: {} ({} bytes, format: {})",
            handle.output_path.display(),
            size,
            handle.codec.format
        );
        Ok(())
    }
}

/// Transcodes the raw capture into `output_path`.
///
/// The raw capture is removed only after a successful conversion, so a failure
/// leaves the audio on disk.
fn convert_capture(wav_path: &Path, output_path: &Path, codec: &CodecConfig) -> Result<()> {
    ffmpeg::transcode(wav_path, output_path, codec)
        .with_context(|| format!("Raw capture kept at {}", wav_path.display()))?;
    if let Err(e) = std::fs::remove_file(wav_path) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }
    Ok(())
}

/// Recovers the writer even if an audio callback panicked while holding it.
fn lock(writer: &SharedWriter) -> MutexGuard<'_, Option<WavWriter<BufWriter<File>>>> {
    writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    writer: &SharedWriter,
    peak: &Arc<AtomicI32>,
    convert: fn(T) -> i16,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + Send + 'static,
{
    let writer = Arc::clone(writer);
    let peak = Arc::clone(peak);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = mix_to_mono(data, channels, convert);
            if let Some(max) = mono.iter().map(|s| (*s as i32).abs()).max() {
                peak.fetch_max(max, Ordering::Relaxed);
            }
            if let Some(writer) = lock(&writer).as_mut() {
                for sample in mono {
                    if let Err(e) = writer.write_sample(sample) {
                        tracing::error!("Failed to write audio sample: {}", e);
                        break;
                    }
                }
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Averages interleaved frames down to one channel.
fn mix_to_mono<T: Copy>(data: &[T], channels: usize, convert: fn(T) -> i16) -> Vec<i16> {
    if channels <= 1 {
        return data.iter().map(|&s| convert(s)).collect();
    }
    data.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| convert(s) as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

fn open_device(device_spec: &str) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if device_spec == "default" {
        return host
            .default_input_device()
            .ok_or_else(|| anyhow!("No audio input device available"));
    }
    find_device_by_name(&host, device_spec)
}

/// Finds an input device by numeric index or exact name.
///
/// # Errors
/// - If no device with the specified name/index is found
pub fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let mut devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    if let Ok(index) = device_spec.parse::<usize>() {
        return devices
            .nth(index)
            .ok_or_else(|| anyhow!("Device index {index} is out of range"));
    }

    devices
        .find(|d| d.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'voxhold list-devices' to see available devices."
            )
        })
}

/// Desktop record permission: granted when the configured input device can be opened.
pub struct InputDeviceGate {
    device_name: String,
}

impl InputDeviceGate {
    pub fn new(device_name: String) -> Self {
        Self { device_name }
    }
}

impl PermissionGate for InputDeviceGate {
    fn has_record_audio_permission(&self) -> bool {
        suppress_alsa_warnings(|| open_device(&self.device_name)).is_ok()
    }

    fn request_record_audio_permission(&mut self) {
        tracing::warn!(
            "No access to input device '{}'. Check microphone permissions and device settings.",
            self.device_name
        );
    }
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_conversion_keeps_raw_capture() {
        let dir = tempfile::tempdir().unwrap();
        let wav_path = dir.path().join("audio.capture.wav");
        let output_path = dir.path().join("audio.3gp");
        std::fs::write(&wav_path, b"not a wav file").unwrap();
        let codec = CodecConfig {
            sample_rate: 8000,
            format: "libopencore_amrnb".to_string(),
        };

        // Fails either because ffmpeg is missing or because the input is garbage
        let err = convert_capture(&wav_path, &output_path, &codec).unwrap_err();
        assert!(format!("{err:#}").contains("Raw capture kept at"));
        assert!(wav_path.exists());
    }

    #[test]
    fn test_mix_stereo_to_mono() {
        let data: [i16; 6] = [100, 300, -200, -400, 10, 20];
        assert_eq!(mix_to_mono(&data, 2, |s| s), vec![200, -300, 15]);
    }

    #[test]
    fn test_mix_mono_passthrough() {
        let data: [i16; 3] = [1, -2, 3];
        assert_eq!(mix_to_mono(&data, 1, |s| s), vec![1, -2, 3]);
    }

    #[test]
    fn test_mix_float_samples() {
        let data: [f32; 4] = [1.0, 1.0, -2.0, 0.0];
        let mono = mix_to_mono(&data, 2, |s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
        assert_eq!(mono, vec![i16::MAX, -(i16::MAX / 2)]);
    }

    #[test]
    fn test_mix_drops_partial_frame() {
        let data: [i16; 5] = [10, 20, 30, 40, 50];
        assert_eq!(mix_to_mono(&data, 2, |s| s), vec![15, 35]);
    }
}
