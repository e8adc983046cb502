//! Transcoding of finished captures through ffmpeg.
//!
//! Captures are always written as mono 16-bit WAV first. Any other configured
//! codec is produced by handing that file to ffmpeg when the session stops.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::capture::CodecConfig;

/// Locates the ffmpeg binary, checking well-known install locations before PATH.
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };
    let output = Command::new(search_cmd)
        .arg("ffmpeg")
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for ffmpeg: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.lines().next().unwrap_or("").trim());
        if !path.as_os_str().is_empty() {
            tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Install ffmpeg or set output_format = \"pcm_s16le\":\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)"
    ))
}

/// ffmpeg arguments converting `input_wav` into `output` with `codec`.
///
/// Mono output and the codec's sample rate are always enforced.
fn build_args(input_wav: &Path, output: &Path, codec: &CodecConfig) -> Result<Vec<OsString>> {
    let mut parts = codec.format.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| anyhow!("Invalid output format: empty"))?;

    let mut args: Vec<OsString> = vec![
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input_wav.into(),
        "-acodec".into(),
        name.into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        codec.sample_rate.to_string().into(),
        "-y".into(),
    ];
    args.extend(parts.map(OsString::from));
    args.push(output.into());
    Ok(args)
}

/// Converts a finished WAV capture into the configured codec.
///
/// # Errors
/// - If ffmpeg cannot be found or exits with an error
pub fn transcode(input_wav: &Path, output: &Path, codec: &CodecConfig) -> Result<()> {
    let args = build_args(input_wav, output, codec)?;
    let ffmpeg = find_ffmpeg()?;

    let result = Command::new(&ffmpeg).args(&args).output()?;
    if result.status.success() {
        tracing::debug!("Capture transcoded to {}", codec.codec());
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&result.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}
