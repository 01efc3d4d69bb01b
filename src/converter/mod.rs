//! Video to GIF Converter Module
//!
//! Builds FFmpeg invocations from user requests and streams progress back.

mod ffmpeg;
mod formats;
mod request;
mod worker;

pub use ffmpeg::{resolve_ffmpeg, ConvertError, Deployment};
pub use formats::{default_output_filename, is_supported_extension, supported_input_extensions};
pub use request::{ConversionRequest, RequestError};
pub use worker::{ConversionOutcome, Converter, ConverterEvent, ProgressEvent};
