//! Input/output format definitions.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Output image format for conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Animated GIF
    #[default]
    Gif,
}

impl OutputFormat {
    /// Returns the FFmpeg muxer name passed to `-f`.
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
        }
    }
}

/// Supported input file extensions.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &["mp4", "avi", "mov", "mkv", "webm", "wmv", "flv", "3gp"]
}

/// Check if a file extension is supported for conversion.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_input_extensions().iter().any(|e| *e == ext_lower)
}

/// Default filename proposed by the save dialog, e.g. `converted-1724900000000.gif`.
pub fn default_output_filename() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("converted-{}.{}", millis, OutputFormat::Gif.extension())
}
