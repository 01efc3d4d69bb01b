//! Background conversion worker.
//!
//! One thread per submitted request: validates, pre-flights the binary,
//! spawns FFmpeg, and forwards typed events to the UI over a channel. A
//! request settles with exactly one terminal event, always last.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::ffmpeg::{
    parse_duration_line, percent_complete, resolve_ffmpeg, start_conversion, ConvertError,
    Deployment, ProgressUpdate,
};
use super::request::ConversionRequest;

/// How many trailing stderr lines are kept for the failure message.
const STDERR_TAIL_LINES: usize = 12;

/// Progress snapshot forwarded to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Best-effort completion percentage, 0 when unknown
    pub percent: u8,
    /// FFmpeg's output timemark, verbatim (e.g. "00:00:02.500000")
    pub time: String,
}

/// Terminal success descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub output_path: PathBuf,
    pub message: String,
}

/// Events emitted over the lifetime of one conversion.
#[derive(Debug)]
pub enum ConverterEvent {
    /// Zero or more of these, only while the conversion is running
    Progress(ProgressEvent),
    /// Exactly one of these per request, always last
    Finished(Result<ConversionOutcome, ConvertError>),
}

/// Spawns conversions against a resolved FFmpeg binary.
pub struct Converter {
    ffmpeg_path: PathBuf,
}

impl Converter {
    /// Resolve FFmpeg for the detected deployment mode.
    pub fn new() -> Self {
        Self {
            ffmpeg_path: resolve_ffmpeg(&Deployment::detect()),
        }
    }

    /// Use an explicit FFmpeg binary path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Start a conversion on a background thread and return its event stream.
    ///
    /// The receiver yields zero or more `Progress` events followed by exactly
    /// one `Finished`, after which the channel disconnects.
    pub fn spawn(&self, request: ConversionRequest) -> Receiver<ConverterEvent> {
        let (tx, rx) = bounded::<ConverterEvent>(64);
        let ffmpeg_path = self.ffmpeg_path.clone();

        thread::spawn(move || {
            let result = run_conversion(&ffmpeg_path, &request, &tx);
            let _ = tx.send(ConverterEvent::Finished(result));
        });

        rx
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one conversion to completion, emitting progress along the way.
fn run_conversion(
    ffmpeg_path: &Path,
    request: &ConversionRequest,
    tx: &Sender<ConverterEvent>,
) -> Result<ConversionOutcome, ConvertError> {
    request.validate()?;

    let mut child = start_conversion(ffmpeg_path, request)?;

    // Duration comes from FFmpeg's own stderr banner; the stderr drain thread
    // fills it in so percent can be computed against it. Lines are debug
    // logged and the tail retained for the failure message.
    let duration: Arc<Mutex<Option<f64>>> = Arc::new(Mutex::new(None));
    let stderr_tail: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let stderr_thread = child.stderr.take().map(|stderr| {
        let duration = Arc::clone(&duration);
        let stderr_tail = Arc::clone(&stderr_tail);
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                log::debug!("FFmpeg: {}", line);
                if let Some(seconds) = parse_duration_line(&line) {
                    duration.lock().unwrap().get_or_insert(seconds);
                }
                let mut tail = stderr_tail.lock().unwrap();
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
        })
    });

    if let Some(stdout) = child.stdout.take() {
        let mut update = ProgressUpdate::default();
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if update.apply_line(&line) && !update.finished {
                let percent = percent_complete(update.out_time_us, *duration.lock().unwrap());
                let _ = tx.send(ConverterEvent::Progress(ProgressEvent {
                    percent,
                    time: update.out_time.clone().unwrap_or_default(),
                }));
            }
        }
    }

    let status = child.wait()?;
    if let Some(handle) = stderr_thread {
        let _ = handle.join();
    }

    if status.success() {
        log::info!("Conversion completed: {}", request.output_path.display());
        Ok(ConversionOutcome {
            output_path: request.output_path.clone(),
            message: "GIF created successfully!".to_string(),
        })
    } else {
        let tail = stderr_tail.lock().unwrap().join("\n");
        let detail = if tail.is_empty() {
            format!("FFmpeg exited with code: {:?}", status.code())
        } else {
            tail
        };
        log::error!("Conversion failed: {}", detail);
        Err(ConvertError::Failed(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn collect_events(rx: Receiver<ConverterEvent>) -> Vec<ConverterEvent> {
        rx.iter().collect()
    }

    fn terminal_count(events: &[ConverterEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ConverterEvent::Finished(_)))
            .count()
    }

    #[test]
    fn test_invalid_request_settles_once() {
        let dir = tempfile::tempdir().unwrap();
        let request = ConversionRequest::new(
            dir.path().join("missing.mp4"),
            dir.path().join("out.gif"),
            10.0,
            480,
        );

        let converter = Converter::with_ffmpeg_path(PathBuf::from("/nonexistent/ffmpeg"));
        let events = collect_events(converter.spawn(request));

        assert_eq!(events.len(), 1);
        assert_eq!(terminal_count(&events), 1);
        assert!(matches!(
            &events[0],
            ConverterEvent::Finished(Err(ConvertError::Request(_)))
        ));
    }

    #[test]
    fn test_missing_binary_settles_with_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        File::create(&input).unwrap();
        let request = ConversionRequest::new(input, dir.path().join("out.gif"), 10.0, 480);

        let converter = Converter::with_ffmpeg_path(PathBuf::from("/nonexistent/ffmpeg"));
        let events = collect_events(converter.spawn(request));

        assert_eq!(terminal_count(&events), 1);
        match events.last().unwrap() {
            ConverterEvent::Finished(Err(err)) => {
                assert!(err.to_string().contains("/nonexistent/ffmpeg"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    fn write_stub_ffmpeg(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_progress_then_single_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        File::create(&input).unwrap();

        // Stub that reports a duration on stderr and two progress blocks on
        // stdout, like `-progress pipe:1` does.
        let stub = write_stub_ffmpeg(
            dir.path(),
            "#!/bin/sh\n\
             echo '  Duration: 00:00:10.00, start: 0.000000, bitrate: 1 kb/s' >&2\n\
             sleep 0.2\n\
             echo 'out_time_us=2500000'\n\
             echo 'out_time=00:00:02.500000'\n\
             echo 'progress=continue'\n\
             echo 'out_time_us=5000000'\n\
             echo 'out_time=00:00:05.000000'\n\
             echo 'progress=continue'\n\
             echo 'progress=end'\n",
        );

        let request =
            ConversionRequest::new(input, dir.path().join("out.gif"), 10.0, 480);
        let converter = Converter::with_ffmpeg_path(stub);
        let events = collect_events(converter.spawn(request));

        assert_eq!(terminal_count(&events), 1);
        assert!(matches!(
            events.last().unwrap(),
            ConverterEvent::Finished(Ok(_))
        ));

        let progress: Vec<&ProgressEvent> = events
            .iter()
            .filter_map(|e| match e {
                ConverterEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].percent, 25);
        assert_eq!(progress[0].time, "00:00:02.500000");
        assert_eq!(progress[1].percent, 50);

        match events.last().unwrap() {
            ConverterEvent::Finished(Ok(outcome)) => {
                assert_eq!(outcome.message, "GIF created successfully!");
                assert_eq!(outcome.output_path, dir.path().join("out.gif"));
            }
            _ => unreachable!(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        File::create(&input).unwrap();

        let stub = write_stub_ffmpeg(
            dir.path(),
            "#!/bin/sh\n\
             echo 'a.mp4: Invalid data found when processing input' >&2\n\
             exit 1\n",
        );

        let request =
            ConversionRequest::new(input, dir.path().join("out.gif"), 10.0, 480);
        let converter = Converter::with_ffmpeg_path(stub);
        let events = collect_events(converter.spawn(request));

        assert_eq!(terminal_count(&events), 1);
        match events.last().unwrap() {
            ConverterEvent::Finished(Err(ConvertError::Failed(message))) => {
                assert!(message.contains("Invalid data found"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
