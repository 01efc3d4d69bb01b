//! Conversion request definition and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by [`ConversionRequest::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Frame rate must be a positive number, got {0}")]
    InvalidFps(f64),
    #[error("Output width must be a positive number of pixels")]
    InvalidScale,
    #[error("Input file does not exist: {0}")]
    MissingInput(PathBuf),
    #[error("Output directory does not exist: {0}")]
    BadOutputDir(PathBuf),
    #[error("Time values must be non-empty when given")]
    EmptyTimeSpec,
}

/// A single video to GIF conversion, immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// Source video file
    pub input_path: PathBuf,
    /// Target GIF path
    pub output_path: PathBuf,
    /// Frames sampled per second of output
    pub fps: f64,
    /// Output width in pixels; height is derived to keep aspect ratio
    pub scale: u32,
    /// Optional seek into the source, FFmpeg time syntax (e.g. "5" or "00:00:05")
    pub start_time: Option<String>,
    /// Optional cap on how much source time is converted
    pub duration: Option<String>,
}

impl ConversionRequest {
    /// Create a request with no start offset or duration cap.
    pub fn new(input_path: PathBuf, output_path: PathBuf, fps: f64, scale: u32) -> Self {
        Self {
            input_path,
            output_path,
            fps,
            scale,
            start_time: None,
            duration: None,
        }
    }

    /// Reject malformed requests before any FFmpeg arguments are built.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(RequestError::InvalidFps(self.fps));
        }
        if self.scale == 0 {
            return Err(RequestError::InvalidScale);
        }
        if !self.input_path.exists() {
            return Err(RequestError::MissingInput(self.input_path.clone()));
        }
        if let Some(parent) = self.output_path.parent() {
            // An empty parent means a bare filename, resolved in the cwd.
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(RequestError::BadOutputDir(parent.to_path_buf()));
            }
        }
        for time in [&self.start_time, &self.duration].into_iter().flatten() {
            if time.trim().is_empty() {
                return Err(RequestError::EmptyTimeSpec);
            }
        }
        Ok(())
    }

    /// Get the input file name for display.
    pub fn input_filename(&self) -> String {
        self.input_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn request_with_input(dir: &std::path::Path) -> ConversionRequest {
        let input = dir.join("clip.mp4");
        File::create(&input).unwrap();
        ConversionRequest::new(input, dir.join("out.gif"), 10.0, 480)
    }

    #[test]
    fn test_valid_request_passes() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_with_input(dir.path());
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_fps() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_with_input(dir.path());
        request.fps = 0.0;
        assert!(matches!(
            request.validate(),
            Err(RequestError::InvalidFps(_))
        ));
        request.fps = f64::NAN;
        assert!(matches!(
            request.validate(),
            Err(RequestError::InvalidFps(_))
        ));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_with_input(dir.path());
        request.scale = 0;
        assert_eq!(request.validate(), Err(RequestError::InvalidScale));
    }

    #[test]
    fn test_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest::new(
            dir.path().join("nope.mp4"),
            dir.path().join("out.gif"),
            10.0,
            480,
        );
        assert!(matches!(
            request.validate(),
            Err(RequestError::MissingInput(_))
        ));
    }

    #[test]
    fn test_rejects_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_with_input(dir.path());
        request.output_path = dir.path().join("missing").join("out.gif");
        assert!(matches!(
            request.validate(),
            Err(RequestError::BadOutputDir(_))
        ));
    }

    #[test]
    fn test_bare_output_filename_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_with_input(dir.path());
        request.output_path = PathBuf::from("out.gif");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_empty_time_spec() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request_with_input(dir.path());
        request.start_time = Some("  ".to_string());
        assert_eq!(request.validate(), Err(RequestError::EmptyTimeSpec));
    }
}
