// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screen recording through an external `ffmpeg` process.
//!
//! A lookup thread finds the encoder once at startup. Every recording gets
//! its own worker thread which owns the encoder process, watches a stop flag
//! and reports back over a channel that the UI polls each frame.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// Environment variable pointing at a specific encoder binary.
pub const ENCODER_ENV: &str = "KIEKSTE_FFMPEG";

/// Name of the scratch directory inside the system temp dir.
pub const TMP_NAME: &str = "_kiekste_tmp";

/// How often the worker checks for a stop request.
const STOP_POLL: Duration = Duration::from_millis(100);

/// How often the worker checks whether the encoder has exited.
const EXIT_POLL: Duration = Duration::from_millis(200);

/// How long the encoder gets to finish the file after being asked to quit.
const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised by the capture worker.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("no video encoder available")]
    NoEncoder,
    #[error("a capture is already running")]
    Busy,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start encoder {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start capture thread: {0}")]
    Thread(#[source] std::io::Error),
    #[error("encoder exited before it was stopped ({0})")]
    EarlyExit(ExitStatus),
    #[error("encoder did not exit within {0:?}")]
    StopTimeout(Duration),
    #[error("failed to query encoder process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Parameters of one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Region on the virtual desktop, in pixels
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Bitrate in kbit/s
    pub quality: u32,
    pub draw_pointer: bool,
    pub output: PathBuf,
}

/// Reported once per recording when the worker is done.
#[derive(Debug)]
pub enum CaptureEvent {
    Stopped { output: PathBuf, success: bool },
    Failed(String),
}

/// Screen grabbing backend the encoder is driven with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    X11 { display: String },
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string());
            Platform::X11 { display }
        }
    }
}

/// Round down to an even size, as yuv420 output requires.
fn even(size: u32) -> u32 {
    (size & !1).max(2)
}

/// Build the encoder command line for `settings`.
pub fn encoder_args(settings: &CaptureSettings, platform: &Platform) -> Vec<String> {
    let (x, y) = (settings.x, settings.y);
    let (w, h) = (even(settings.width), even(settings.height));
    let fps = settings.fps.max(1);
    let pointer = u8::from(settings.draw_pointer);

    let input = match platform {
        Platform::Windows => format!(
            "-f gdigrab -draw_mouse {pointer} -framerate {fps} -offset_x {x} -offset_y {y} \
             -video_size {w}x{h} -show_region 0 -i desktop"
        ),
        Platform::X11 { display } => format!(
            "-f x11grab -draw_mouse {pointer} -framerate {fps} -video_size {w}x{h} \
             -i {display}+{x},{y}"
        ),
        Platform::MacOs => format!(
            "-f avfoundation -capture_cursor {pointer} -framerate {fps} -i 1:none \
             -vf crop={w}:{h}:{x}:{y}"
        ),
    };

    let mut args: Vec<String> = input.split_whitespace().map(String::from).collect();
    args.push("-b:v".to_string());
    args.push(format!("{}k", settings.quality));
    args.push("-y".to_string());
    args.push(settings.output.to_string_lossy().into_owned());
    args
}

/// Scratch directory for recordings and encoder logs.
pub fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(TMP_NAME)
}

/// Fresh output path for a recording.
pub fn temp_video_path() -> PathBuf {
    temp_dir().join(format!("_tmp_video{}.mp4", Uuid::new_v4()))
}

fn encoder_file_name() -> &'static str {
    if cfg!(windows) {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    }
}

/// First directory in `dirs` holding the encoder binary.
fn find_in_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(encoder_file_name()))
        .find(|candidate| candidate.is_file())
}

/// Look for the encoder: `$KIEKSTE_FFMPEG` first, then `PATH`.
pub fn find_encoder() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(ENCODER_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
        log::warn!("{} points to missing file {}", ENCODER_ENV, path.display());
    }
    let paths = std::env::var_os("PATH")?;
    find_in_dirs(std::env::split_paths(&paths))
}

/// Search for the encoder on a background thread.
pub fn spawn_encoder_lookup() -> Receiver<Option<PathBuf>> {
    let (sender, receiver) = channel();
    thread::spawn(move || {
        let found = find_encoder();
        match &found {
            Some(path) => log::info!("Found video encoder: {}", path.display()),
            None => log::info!("No video encoder found, video capture disabled"),
        }
        let _ = sender.send(found);
    });
    receiver
}

struct CaptureWorker {
    stop: Arc<AtomicBool>,
    events: Receiver<CaptureEvent>,
    handle: Option<JoinHandle<()>>,
    started: Instant,
}

/// Owns the encoder location and at most one running capture.
#[derive(Default)]
pub struct VideoMan {
    encoder: Option<PathBuf>,
    worker: Option<CaptureWorker>,
}

impl VideoMan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_encoder(&mut self, path: PathBuf) {
        self.encoder = Some(path);
    }

    pub fn is_available(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    /// Time since the running capture started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.worker.as_ref().map(|w| w.started.elapsed())
    }

    /// Start recording the region described by `settings`.
    pub fn capture(&mut self, settings: CaptureSettings) -> Result<(), VideoError> {
        let encoder = self.encoder.clone().ok_or(VideoError::NoEncoder)?;
        let args = encoder_args(&settings, &Platform::detect());
        self.start_worker(encoder, args, settings.output)
    }

    fn start_worker(
        &mut self,
        encoder: PathBuf,
        args: Vec<String>,
        output: PathBuf,
    ) -> Result<(), VideoError> {
        if self.worker.is_some() {
            return Err(VideoError::Busy);
        }

        let (sender, events) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("kiekste-capture".to_string())
            .spawn(move || {
                let event = match run_capture(&encoder, &args, &flag) {
                    Ok(success) => CaptureEvent::Stopped { output, success },
                    Err(e) => {
                        log::error!("Video capture failed: {}", e);
                        CaptureEvent::Failed(e.to_string())
                    }
                };
                let _ = sender.send(event);
            })
            .map_err(VideoError::Thread)?;

        self.worker = Some(CaptureWorker {
            stop,
            events,
            handle: Some(handle),
            started: Instant::now(),
        });
        Ok(())
    }

    /// Ask the running capture to stop. The result arrives through [`poll`].
    ///
    /// [`poll`]: VideoMan::poll
    pub fn stop(&self) {
        if let Some(worker) = &self.worker {
            worker.stop.store(true, Ordering::Relaxed);
        }
    }

    /// Collect the outcome of a finished capture.
    pub fn poll(&mut self) -> Option<CaptureEvent> {
        let worker = self.worker.as_mut()?;
        let event = match worker.events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                CaptureEvent::Failed("capture thread ended without a result".to_string())
            }
        };
        if let Some(handle) = worker.handle.take() {
            let _ = handle.join();
        }
        self.worker = None;
        Some(event)
    }
}

impl Drop for VideoMan {
    fn drop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Relaxed);
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

fn create_log(path: &Path) -> Result<File, VideoError> {
    File::create(path).map_err(|source| VideoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Worker body: run the encoder until `stop` is set, then shut it down.
///
/// Returns whether the encoder exited successfully.
fn run_capture(encoder: &Path, args: &[String], stop: &AtomicBool) -> Result<bool, VideoError> {
    let dir = temp_dir();
    fs::create_dir_all(&dir).map_err(|source| VideoError::Io {
        path: dir.clone(),
        source,
    })?;
    let stdout = create_log(&dir.join("_tmpout"))?;
    let stderr = create_log(&dir.join("_tmperr"))?;

    log::info!("Starting encoder: {} {}", encoder.display(), args.join(" "));
    let mut child = Command::new(encoder)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| VideoError::Spawn {
            path: encoder.to_path_buf(),
            source,
        })?;

    while !stop.load(Ordering::Relaxed) {
        if let Some(status) = child.try_wait().map_err(VideoError::Wait)? {
            return Err(VideoError::EarlyExit(status));
        }
        thread::sleep(STOP_POLL);
    }

    request_quit(&mut child);
    let status = wait_for_exit(&mut child, EXIT_POLL, EXIT_TIMEOUT)?;
    log::info!("Encoder exited with {}", status);
    Ok(status.success())
}

/// Ask the encoder to finish the file. `q` on stdin is ffmpeg's quit key;
/// closing stdin afterwards covers encoders that only watch for EOF.
fn request_quit(child: &mut Child) {
    match child.stdin.take() {
        Some(mut stdin) => {
            if let Err(e) = stdin.write_all(b"q\n") {
                log::warn!("Failed to ask the encoder to quit: {}", e);
            }
        }
        None => log::warn!("Encoder stdin is not connected"),
    }
}

/// Poll `child` every `poll` until it exits; kill it after `timeout`.
fn wait_for_exit(
    child: &mut Child,
    poll: Duration,
    timeout: Duration,
) -> Result<ExitStatus, VideoError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(VideoError::Wait)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                log::error!("Failed to kill encoder: {}", e);
            }
            let _ = child.wait();
            return Err(VideoError::StopTimeout(timeout));
        }
        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CaptureSettings {
        CaptureSettings {
            x: 100,
            y: 50,
            width: 641,
            height: 480,
            fps: 10,
            quality: 5000,
            draw_pointer: true,
            output: PathBuf::from("out.mp4"),
        }
    }

    #[test]
    fn test_windows_args_follow_gdigrab_template() {
        let args = encoder_args(&settings(), &Platform::Windows);
        let line = args.join(" ");
        assert_eq!(
            line,
            "-f gdigrab -draw_mouse 1 -framerate 10 -offset_x 100 -offset_y 50 \
             -video_size 640x480 -show_region 0 -i desktop -b:v 5000k -y out.mp4"
        );
    }

    #[test]
    fn test_x11_args_put_offset_in_input() {
        let platform = Platform::X11 {
            display: ":1".to_string(),
        };
        let mut capture = settings();
        capture.draw_pointer = false;
        let args = encoder_args(&capture, &platform);

        assert!(args.windows(2).any(|w| w == ["-i", ":1+100,50"]));
        assert!(args.windows(2).any(|w| w == ["-draw_mouse", "0"]));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_macos_args_crop_region() {
        let args = encoder_args(&settings(), &Platform::MacOs);
        assert!(args.windows(2).any(|w| w == ["-vf", "crop=640:480:100:50"]));
    }

    #[test]
    fn test_output_path_with_spaces_stays_one_argument() {
        let mut capture = settings();
        capture.output = PathBuf::from("my videos/clip one.mp4");
        let args = encoder_args(&capture, &Platform::Windows);
        assert_eq!(args.last().map(String::as_str), Some("my videos/clip one.mp4"));
    }

    #[test]
    fn test_even_dimensions() {
        assert_eq!(even(641), 640);
        assert_eq!(even(480), 480);
        assert_eq!(even(1), 2);
    }

    #[test]
    fn test_temp_video_paths_are_unique() {
        let a = temp_video_path();
        let b = temp_video_path();
        assert_ne!(a, b);
        assert!(a.starts_with(temp_dir()));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("mp4"));
    }

    #[test]
    fn test_find_in_dirs() {
        let empty = tempfile::tempdir().unwrap();
        let with_encoder = tempfile::tempdir().unwrap();
        std::fs::write(with_encoder.path().join(encoder_file_name()), b"").unwrap();

        let found = find_in_dirs(vec![
            empty.path().to_path_buf(),
            with_encoder.path().to_path_buf(),
        ]);
        assert_eq!(found, Some(with_encoder.path().join(encoder_file_name())));
        assert_eq!(find_in_dirs(vec![empty.path().to_path_buf()]), None);
    }

    #[test]
    fn test_capture_without_encoder_fails() {
        let mut videoman = VideoMan::new();
        assert!(matches!(videoman.capture(settings()), Err(VideoError::NoEncoder)));
        assert!(!videoman.is_capturing());
    }

    #[cfg(unix)]
    fn wait_for_event(videoman: &mut VideoMan) -> CaptureEvent {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(event) = videoman.poll() {
                return event;
            }
            assert!(Instant::now() < deadline, "capture worker did not report back");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_asks_encoder_to_quit() {
        let mut videoman = VideoMan::new();
        let output = PathBuf::from("/tmp/never-written.mp4");
        videoman
            .start_worker(
                PathBuf::from("/bin/sh"),
                vec!["-c".to_string(), "read line; test \"$line\" = q".to_string()],
                output.clone(),
            )
            .unwrap();
        assert!(videoman.is_capturing());
        assert!(videoman.elapsed().is_some());

        videoman.stop();
        match wait_for_event(&mut videoman) {
            CaptureEvent::Stopped { output: reported, success } => {
                assert_eq!(reported, output);
                assert!(success);
            }
            CaptureEvent::Failed(e) => panic!("capture failed: {}", e),
        }
        assert!(!videoman.is_capturing());
    }

    #[cfg(unix)]
    #[test]
    fn test_early_encoder_exit_is_reported() {
        let mut videoman = VideoMan::new();
        videoman
            .start_worker(
                PathBuf::from("/bin/sh"),
                vec!["-c".to_string(), "exit 3".to_string()],
                PathBuf::from("unused.mp4"),
            )
            .unwrap();

        assert!(matches!(wait_for_event(&mut videoman), CaptureEvent::Failed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_second_capture_is_refused_while_running() {
        let mut videoman = VideoMan::new();
        let args = vec!["-c".to_string(), "read line".to_string()];
        videoman
            .start_worker(PathBuf::from("/bin/sh"), args.clone(), PathBuf::from("a.mp4"))
            .unwrap();
        assert!(matches!(
            videoman.start_worker(PathBuf::from("/bin/sh"), args, PathBuf::from("b.mp4")),
            Err(VideoError::Busy)
        ));
        videoman.stop();
        wait_for_event(&mut videoman);
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_for_exit_kills_after_timeout() {
        let mut child = Command::new("/bin/sh")
            .args(["-c", "sleep 5"])
            .spawn()
            .unwrap();
        let result = wait_for_exit(
            &mut child,
            Duration::from_millis(20),
            Duration::from_millis(100),
        );
        assert!(matches!(result, Err(VideoError::StopTimeout(_))));
    }
}
