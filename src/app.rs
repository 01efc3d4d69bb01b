//! Main application window.
//!
//! A single-panel form: pick a video, pick a destination, tune the sampling
//! parameters, convert. Worker events are drained every frame.

use std::path::PathBuf;

use crossbeam_channel::Receiver;
use eframe::egui::{self, Color32, RichText};

use crate::converter::{
    is_supported_extension, ConversionRequest, Converter, ConverterEvent, ProgressEvent,
};
use crate::dialogs;

/// Terminal state of the most recent conversion, for the status line.
enum LastOutcome {
    Success(String),
    Failure(String),
}

/// Main application state
pub struct GiffyApp {
    converter: Converter,
    /// Warning shown when the resolved FFmpeg binary is missing
    ffmpeg_warning: Option<String>,

    // Form state
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    fps: f64,
    scale: u32,
    start_time: String,
    duration: String,

    // Live conversion
    active: Option<Receiver<ConverterEvent>>,
    progress: Option<ProgressEvent>,
    last_outcome: Option<LastOutcome>,
}

impl Default for GiffyApp {
    fn default() -> Self {
        let converter = Converter::new();
        let ffmpeg_warning = if converter.ffmpeg_path().exists() {
            None
        } else {
            Some(format!(
                "FFmpeg not found at: {}",
                converter.ffmpeg_path().display()
            ))
        };

        Self {
            converter,
            ffmpeg_warning,
            input_path: None,
            output_path: None,
            fps: 10.0,
            scale: 480,
            start_time: String::new(),
            duration: String::new(),
            active: None,
            progress: None,
            last_outcome: None,
        }
    }
}

impl GiffyApp {
    /// Create a new application instance
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        log::info!("Initializing Giffy...");
        let app = Self::default();
        log::info!("Using FFmpeg at {}", app.converter.ffmpeg_path().display());
        app
    }

    fn is_converting(&self) -> bool {
        self.active.is_some()
    }

    /// Build a request from the current form state.
    fn build_request(&self) -> Option<ConversionRequest> {
        let input_path = self.input_path.clone()?;
        let output_path = self.output_path.clone()?;

        let mut request = ConversionRequest::new(input_path, output_path, self.fps, self.scale);
        if !self.start_time.trim().is_empty() {
            request.start_time = Some(self.start_time.trim().to_string());
        }
        if !self.duration.trim().is_empty() {
            request.duration = Some(self.duration.trim().to_string());
        }
        Some(request)
    }

    fn start_conversion(&mut self) {
        let Some(request) = self.build_request() else {
            return;
        };
        self.progress = None;
        self.last_outcome = None;
        self.active = Some(self.converter.spawn(request));
    }

    /// Drain worker events; the channel disconnects after the terminal event.
    fn poll_events(&mut self) {
        let Some(rx) = &self.active else {
            return;
        };

        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ConverterEvent::Progress(progress) => {
                    self.progress = Some(progress);
                }
                ConverterEvent::Finished(Ok(outcome)) => {
                    self.last_outcome = Some(LastOutcome::Success(format!(
                        "{} ({})",
                        outcome.message,
                        outcome.output_path.display()
                    )));
                    finished = true;
                }
                ConverterEvent::Finished(Err(err)) => {
                    self.last_outcome = Some(LastOutcome::Failure(err.to_string()));
                    finished = true;
                }
            }
        }

        if finished {
            self.active = None;
        }
    }

    /// Accept a video dropped onto the window.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Option<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .find(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(is_supported_extension)
                        .unwrap_or(false)
                })
        });

        if let Some(path) = dropped {
            log::info!("Video dropped: {}", path.display());
            self.input_path = Some(path);
        }
    }

    fn show_file_pickers(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("📂 Select Video...").clicked() {
                if let Some(path) = dialogs::select_video() {
                    self.input_path = Some(path);
                }
            }
            match &self.input_path {
                Some(path) => {
                    ui.label(RichText::new(path.display().to_string()).monospace().small());
                }
                None => {
                    ui.label(RichText::new("no video selected").italics().color(Color32::GRAY));
                }
            }
        });

        ui.horizontal(|ui| {
            if ui.button("💾 Save GIF As...").clicked() {
                if let Some(path) = dialogs::select_gif_destination() {
                    self.output_path = Some(path);
                }
            }
            match &self.output_path {
                Some(path) => {
                    ui.label(RichText::new(path.display().to_string()).monospace().small());
                }
                None => {
                    ui.label(RichText::new("no destination chosen").italics().color(Color32::GRAY));
                }
            }
        });
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Conversion Settings");

        ui.horizontal(|ui| {
            ui.label("Frame rate:");
            ui.add(
                egui::DragValue::new(&mut self.fps)
                    .speed(0.5)
                    .clamp_range(1.0..=60.0)
                    .suffix(" fps"),
            );

            ui.separator();

            ui.label("Width:");
            ui.add(
                egui::DragValue::new(&mut self.scale)
                    .speed(10.0)
                    .clamp_range(16..=3840)
                    .suffix("px"),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Start at:");
            ui.add(
                egui::TextEdit::singleline(&mut self.start_time)
                    .hint_text("00:00:00")
                    .desired_width(90.0),
            );

            ui.label("Duration:");
            ui.add(
                egui::TextEdit::singleline(&mut self.duration)
                    .hint_text("whole video")
                    .desired_width(90.0),
            );
        });

        ui.label(
            RichText::new("Height follows the source aspect ratio. Leave times empty to convert the whole video.")
                .italics()
                .small()
                .color(Color32::GRAY),
        );
    }

    fn show_progress(&mut self, ui: &mut egui::Ui) {
        let ready = self.input_path.is_some() && self.output_path.is_some();

        ui.add_enabled_ui(ready && !self.is_converting(), |ui| {
            if ui.button("▶ Convert to GIF").clicked() {
                self.start_conversion();
            }
        });

        if self.is_converting() {
            let percent = self.progress.as_ref().map(|p| p.percent).unwrap_or(0);
            let bar = egui::ProgressBar::new(percent as f32 / 100.0)
                .show_percentage()
                .animate(true);
            ui.add(bar);

            if let Some(progress) = &self.progress {
                if !progress.time.is_empty() {
                    ui.label(RichText::new(format!("Processed: {}", progress.time)).small());
                }
            }
        }

        match &self.last_outcome {
            Some(LastOutcome::Success(message)) => {
                ui.label(RichText::new(message).color(Color32::GREEN));
            }
            Some(LastOutcome::Failure(message)) => {
                ui.label(RichText::new(message).color(Color32::RED));
            }
            None => {}
        }
    }
}

impl eframe::App for GiffyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.handle_dropped_files(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Giffy");
            ui.label(
                RichText::new("Turn a video into an animated GIF")
                    .italics()
                    .color(Color32::GRAY),
            );

            if let Some(warning) = &self.ffmpeg_warning {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("⚠").color(Color32::YELLOW));
                    ui.label(RichText::new(warning).color(Color32::YELLOW).small());
                });
            }
            ui.separator();

            self.show_file_pickers(ui);
            ui.separator();

            self.show_settings(ui);
            ui.separator();

            self.show_progress(ui);
        });

        // Keep painting while a conversion runs so progress stays live.
        if self.is_converting() {
            ctx.request_repaint();
        }
    }
}
