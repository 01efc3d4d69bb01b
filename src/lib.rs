//! Giffy Library
//!
//! A desktop video to GIF converter that drives an external FFmpeg binary.

pub mod app;
pub mod converter;
pub mod dialogs;

// Re-export commonly used types
pub use app::GiffyApp;
pub use converter::{
    ConversionOutcome, ConversionRequest, ConvertError, Converter, ConverterEvent, ProgressEvent,
};
