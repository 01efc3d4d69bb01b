//! Native file dialogs for picking the source video and GIF destination.
//!
//! Cancellation is an ordinary `None`, never an error; path validation is
//! owned by the conversion request, not the dialogs.

use std::path::PathBuf;

use crate::converter::{default_output_filename, supported_input_extensions};

/// Ask the user for a source video. `None` when the dialog is cancelled.
pub fn select_video() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Video Files", supported_input_extensions())
        .pick_file()
}

/// Ask the user where to save the GIF, proposing a timestamped filename.
/// `None` when the dialog is cancelled.
pub fn select_gif_destination() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("GIF Images", &["gif"])
        .set_file_name(default_output_filename())
        .save_file()
}
