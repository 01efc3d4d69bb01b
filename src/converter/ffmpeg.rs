//! FFmpeg binary resolution, argument construction, and process output parsing.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use thiserror::Error;

use super::formats::OutputFormat;
use super::request::{ConversionRequest, RequestError};

/// Errors that can occur while driving an FFmpeg conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("FFmpeg not found at: {}", .0.display())]
    ToolNotFound(PathBuf),
    #[error("Failed to spawn FFmpeg process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Conversion failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// How the application was deployed, which decides where FFmpeg lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    /// Installed build with binaries relocated into a resource directory.
    Packaged { resource_root: PathBuf },
    /// Running from a source checkout; FFmpeg comes from the environment.
    Development,
}

impl Deployment {
    /// Detect the deployment mode. Packaging wrappers set `GIFFY_RESOURCES`
    /// to the directory holding bundled binaries.
    pub fn detect() -> Self {
        match env::var_os("GIFFY_RESOURCES") {
            Some(root) => Deployment::Packaged {
                resource_root: PathBuf::from(root),
            },
            None => Deployment::Development,
        }
    }
}

/// Resolve the FFmpeg executable path for the given deployment.
///
/// Packaged builds prefer the bundled binary; if the bundle is incomplete the
/// development resolution is used instead so the failure, if any, surfaces at
/// conversion time rather than at startup.
pub fn resolve_ffmpeg(deployment: &Deployment) -> PathBuf {
    match deployment {
        Deployment::Packaged { resource_root } => {
            let bundled = resource_root.join(format!("ffmpeg{}", env::consts::EXE_SUFFIX));
            if bundled.exists() {
                log::info!("Using bundled FFmpeg at {}", bundled.display());
                bundled
            } else {
                log::warn!(
                    "Bundled FFmpeg missing at {}, falling back to system lookup",
                    bundled.display()
                );
                default_ffmpeg_path()
            }
        }
        Deployment::Development => default_ffmpeg_path(),
    }
}

/// Library-provided default: PATH lookup, then conventional install locations.
fn default_ffmpeg_path() -> PathBuf {
    if let Ok(path) = which::which("ffmpeg") {
        return path;
    }

    let common_paths: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/usr/local/bin/ffmpeg",
            "/opt/homebrew/bin/ffmpeg",
            "/opt/local/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"]
    };

    for path_str in common_paths {
        let path = PathBuf::from(path_str);
        if path.exists() {
            return path;
        }
    }

    // Last resort: a bare name that fails the pre-flight existence check
    // with a readable path in the error message.
    PathBuf::from("ffmpeg")
}

/// Format a frame rate for the filter string: integral values lose the
/// fractional part (`fps=10`, not `fps=10.0`).
fn format_fps(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as u64)
    } else {
        format!("{}", fps)
    }
}

/// Build the FFmpeg argument list for a request.
///
/// The filter chain is exactly two stages, frame-rate sampling then
/// Lanczos-resampled scaling, in that order. Downstream tooling matches the
/// literal `fps=<fps>,scale=<scale>:-1:flags=lanczos` string, so its shape
/// must not change.
pub fn build_args(request: &ConversionRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    args.push("-y".into());
    args.push("-progress".into());
    args.push("pipe:1".into());

    // Seek applies to the input, so it precedes -i.
    if let Some(start) = &request.start_time {
        args.push("-ss".into());
        args.push(start.into());
    }

    args.push("-i".into());
    args.push(request.input_path.clone().into());

    args.push("-vf".into());
    args.push(
        format!(
            "fps={},scale={}:-1:flags=lanczos",
            format_fps(request.fps),
            request.scale
        )
        .into(),
    );

    if let Some(duration) = &request.duration {
        args.push("-t".into());
        args.push(duration.into());
    }

    args.push("-f".into());
    args.push(OutputFormat::Gif.ffmpeg_format().into());

    args.push(request.output_path.clone().into());

    args
}

/// Spawn the FFmpeg process for a request.
///
/// Pre-flight: the binary path must exist on disk, otherwise this fails with
/// [`ConvertError::ToolNotFound`] and no process is launched.
pub fn start_conversion(
    ffmpeg_path: &Path,
    request: &ConversionRequest,
) -> Result<Child, ConvertError> {
    if !ffmpeg_path.exists() {
        return Err(ConvertError::ToolNotFound(ffmpeg_path.to_path_buf()));
    }

    let args = build_args(request);
    log::info!(
        "Starting conversion: {} -> {}",
        request.input_path.display(),
        request.output_path.display()
    );
    log::debug!("FFmpeg args: {:?}", args);

    let child = Command::new(ffmpeg_path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    Ok(child)
}

/// One `key=value` update block from `-progress pipe:1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// Output timestamp in microseconds
    pub out_time_us: Option<u64>,
    /// Output timestamp as FFmpeg's `HH:MM:SS.uuuuuu` string, verbatim
    pub out_time: Option<String>,
    /// Frames written so far
    pub frame: Option<u64>,
    /// Processing speed (e.g. "2.5x")
    pub speed: Option<String>,
    /// Set when the stream reports `progress=end`
    pub finished: bool,
}

impl ProgressUpdate {
    /// Fold a single progress line into this update. Returns true when the
    /// line closes an update block (`progress=continue` or `progress=end`).
    pub fn apply_line(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };
        match key {
            "frame" => self.frame = value.parse().ok(),
            "out_time_us" => self.out_time_us = value.parse().ok(),
            "out_time" => self.out_time = Some(value.to_string()),
            "speed" => self.speed = Some(value.trim().to_string()),
            "progress" => {
                self.finished = value == "end";
                return true;
            }
            _ => {}
        }
        false
    }
}

/// Best-effort percentage from the progress timestamp against the source
/// duration. Missing or non-numeric inputs normalize to 0, never NaN.
pub fn percent_complete(out_time_us: Option<u64>, duration_seconds: Option<f64>) -> u8 {
    let (Some(us), Some(duration)) = (out_time_us, duration_seconds) else {
        return 0;
    };
    if !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    let percent = (us as f64 / 1_000_000.0) / duration * 100.0;
    percent.round().clamp(0.0, 100.0) as u8
}

/// Parse the source duration from FFmpeg's stderr banner, e.g.
/// `  Duration: 00:01:05.48, start: 0.000000, bitrate: 1205 kb/s`.
pub fn parse_duration_line(line: &str) -> Option<f64> {
    let rest = line.trim_start().strip_prefix("Duration: ")?;
    let timestamp = rest.split(',').next()?.trim();
    if timestamp == "N/A" {
        return None;
    }

    let mut parts = timestamp.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
