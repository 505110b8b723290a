// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `KieksteApp` owns the frozen screenshot, the overlay model, the settings
//! and the video manager. Each frame it polls the helper threads, advances
//! the fades, handles shortcuts and dispatches the actions returned by the
//! UI components.

use crate::io::{media, screen, serialization, video};
use crate::io::screen::Screenshot;
use crate::io::video::{CaptureEvent, CaptureSettings, VideoMan};
use crate::models::overlay::{Overlay, OverlayEvent};
use crate::models::settings::Settings;
use crate::ui::{canvas, properties, recording, toolbar};
use crate::util::geometry;
use crate::NAME;
use arboard::Clipboard;
use egui::{Key, Pos2, Vec2};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Delay between the end of a recording and grabbing the screen again, so
/// the transparent window is gone from the grab.
const REGRAB_DELAY: Duration = Duration::from_millis(250);

/// HUD refresh interval while recording.
const HUD_INTERVAL: Duration = Duration::from_millis(100);

/// What save/copy buttons act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Image,
    Video,
}

/// Where the app is in the select/record cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Selecting,
    Recording,
    /// Waiting to grab the screen again after a recording.
    Regrab { at: Instant },
}

/// What Esc does in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeAction {
    StopRecording,
    /// Undim, then close once the fade is done
    FadeOut,
    Ignore,
}

fn escape_action(phase: Phase, closing: bool) -> EscapeAction {
    match phase {
        Phase::Recording => EscapeAction::StopRecording,
        // The regrab dims again, which would swallow the fade out.
        Phase::Regrab { .. } => EscapeAction::Ignore,
        Phase::Selecting if closing => EscapeAction::Ignore,
        Phase::Selecting => EscapeAction::FadeOut,
    }
}

/// Pointer marker position in pixels. The first position egui reports after
/// a grab is kept, later ones are ignored.
fn seed_pointer(seen: Option<Pos2>, latest: Option<Pos2>, origin: Pos2, scale: f32) -> Option<Pos2> {
    seen.or_else(|| latest.map(|pos| geometry::to_pixels(pos, origin, scale)))
}

/// A recording may only start from the selection, and not while closing.
fn can_record(phase: Phase, closing: bool) -> bool {
    phase == Phase::Selecting && !closing
}

/// Main application state.
pub struct KieksteApp {
    screenshot: Screenshot,
    texture: egui::TextureHandle,
    overlay: Overlay,

    settings: Settings,
    settings_path: PathBuf,
    settings_open: bool,

    /// Tool box spinner values
    coords: [i32; 4],
    mode: Mode,
    phase: Phase,

    videoman: VideoMan,
    encoder_lookup: Option<Receiver<Option<PathBuf>>>,
    /// Finished recording waiting for the save dialog
    pending_video: Option<PathBuf>,

    /// Kept open so the copied image stays available
    clipboard: Option<Clipboard>,
    /// Pointer marker position in pixels
    pointer: Option<Pos2>,
    closing: bool,
    last_tick: Instant,
}

impl KieksteApp {
    /// Create the app around an already grabbed screenshot.
    pub fn new(cc: &eframe::CreationContext<'_>, screenshot: Screenshot) -> Self {
        let settings_path = serialization::settings_path();
        let settings = match serialization::load_settings(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings, using defaults: {:#}", e);
                Settings::default()
            }
        };

        let texture = load_texture(&cc.egui_ctx, &screenshot);
        let mut overlay = Overlay::new(image_size(&screenshot));
        let mut coords = [0; 4];
        if let Some(last) = settings.last_rect() {
            overlay.set_rect(geometry::from_xywh(last));
            coords = overlay.aligned_rect();
        }
        overlay.dim();

        Self {
            screenshot,
            texture,
            overlay,
            settings,
            settings_path,
            settings_open: false,
            coords,
            mode: Mode::Image,
            phase: Phase::Selecting,
            videoman: VideoMan::new(),
            encoder_lookup: Some(video::spawn_encoder_lookup()),
            pending_video: None,
            clipboard: None,
            pointer: None,
            closing: false,
            last_tick: Instant::now(),
        }
    }

    fn save_settings(&self) {
        match serialization::save_settings(&self.settings, &self.settings_path) {
            Ok(true) => log::debug!("Settings written"),
            Ok(false) => {}
            Err(e) => log::error!("Failed to save settings: {:#}", e),
        }
    }

    /// Store the current selection in the recent list.
    fn remember_rect(&mut self) {
        if self.settings.remember_rect(self.overlay.aligned_rect()) {
            self.save_settings();
        }
    }

    fn set_rect(&mut self, rect: [i32; 4]) {
        self.overlay.set_rect(geometry::from_xywh(rect));
        self.coords = self.overlay.aligned_rect();
    }

    fn shift_rect(&mut self, delta: Vec2) {
        if let Some(rect) = self.overlay.shift_rect(delta) {
            self.coords = geometry::aligned(rect);
        }
    }

    /// Save the selection to a PNG file chosen by the user.
    fn save_shot(&mut self, frame: &eframe::Frame) {
        if !self.overlay.has_selection() {
            return;
        }
        let rect = self.overlay.aligned_rect();

        let mut dialog = rfd::FileDialog::new()
            .set_title(format!("{NAME} Save Screenshot"))
            .add_filter("PNG", &["png"])
            .set_file_name("screenshot.png")
            .set_parent(frame);
        if !self.settings.last_save_path.is_empty() {
            dialog = dialog.set_directory(&self.settings.last_save_path);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        self.overlay.flash();
        match self
            .screenshot
            .crop(rect)
            .and_then(|cutout| media::save_png(&cutout, &path))
        {
            Ok(saved) => {
                log::info!("Saved screenshot to {}", saved.display());
                if let Some(dir) = saved.parent() {
                    self.settings.last_save_path = dir.to_string_lossy().into_owned();
                }
            }
            Err(e) => log::error!("Failed to save screenshot: {:#}", e),
        }
        self.remember_rect();
        self.save_settings();
    }

    /// Copy the selection to the clipboard.
    fn clip(&mut self) {
        if !self.overlay.has_selection() {
            return;
        }
        let rect = self.overlay.aligned_rect();
        self.overlay.flash();
        match self.screenshot.crop(rect).and_then(|cutout| {
            media::copy_to_clipboard(&mut self.clipboard, &cutout)?;
            Ok(cutout.dimensions())
        }) {
            Ok((w, h)) => log::info!("Copied {}x{} region to the clipboard", w, h),
            Err(e) => log::error!("Failed to copy to clipboard: {:#}", e),
        }
        self.remember_rect();
    }

    fn toggle_pointer(&mut self) {
        self.settings.draw_pointer = !self.settings.draw_pointer;
        self.save_settings();
    }

    fn toggle_mode(&mut self) {
        if !self.videoman.is_available() {
            return;
        }
        self.mode = match self.mode {
            Mode::Image => Mode::Video,
            Mode::Video => Mode::Image,
        };
        log::info!("Mode: {:?}", self.mode);
    }

    /// Start recording the selection, or stop the running recording.
    fn video_capture(&mut self) {
        match self.phase {
            Phase::Recording if self.videoman.is_capturing() => {
                log::info!("Stopping video capture");
                self.videoman.stop();
            }
            Phase::Selecting => self.start_recording(),
            Phase::Recording | Phase::Regrab { .. } => {}
        }
    }

    fn start_recording(&mut self) {
        if !can_record(self.phase, self.closing)
            || !self.videoman.is_available()
            || !self.overlay.has_selection()
        {
            return;
        }
        let Some([x, y, w, h]) = self.screenshot.capture_rect(self.overlay.aligned_rect()) else {
            log::warn!("Selection is off screen, nothing to record");
            return;
        };
        self.remember_rect();

        let capture = CaptureSettings {
            x,
            y,
            width: w as u32,
            height: h as u32,
            fps: self.settings.video_fps,
            quality: self.settings.video_quality,
            draw_pointer: self.settings.draw_pointer,
            output: video::temp_video_path(),
        };
        log::info!("Recording {}x{} at ({}, {})", w, h, x, y);

        match self.videoman.capture(capture) {
            Ok(()) => {
                self.overlay.undim();
                self.settings_open = false;
                self.phase = Phase::Recording;
            }
            Err(e) => log::error!("Failed to start video capture: {}", e),
        }
    }

    /// Esc: stop a recording, otherwise fade out and close.
    fn escape(&mut self) {
        match escape_action(self.phase, self.closing) {
            EscapeAction::StopRecording => self.videoman.stop(),
            EscapeAction::FadeOut => {
                self.closing = true;
                self.overlay.undim();
            }
            EscapeAction::Ignore => {}
        }
    }

    fn poll_helpers(&mut self) {
        if let Some(receiver) = &self.encoder_lookup {
            match receiver.try_recv() {
                Ok(found) => {
                    if let Some(path) = found {
                        self.videoman.set_encoder(path);
                    }
                    self.encoder_lookup = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.encoder_lookup = None,
            }
        }

        if let Some(event) = self.videoman.poll() {
            match event {
                CaptureEvent::Stopped { output, success } => {
                    if success {
                        log::info!("Recording finished: {}", output.display());
                        self.pending_video = Some(output);
                    } else {
                        log::error!(
                            "Encoder reported a failure, see the logs in {}",
                            video::temp_dir().display()
                        );
                    }
                }
                CaptureEvent::Failed(e) => log::error!("Recording failed: {}", e),
            }
            self.phase = Phase::Regrab {
                at: Instant::now() + REGRAB_DELAY,
            };
        }
    }

    /// Grab the screen again once the recording window is out of the way.
    fn regrab(&mut self, ctx: &egui::Context, frame: &eframe::Frame) {
        match screen::grab_primary() {
            Ok(screenshot) => {
                if image_size(&screenshot) != image_size(&self.screenshot) {
                    let rect = self.overlay.rect();
                    self.overlay = Overlay::new(image_size(&screenshot));
                    self.overlay.set_rect(rect);
                }
                self.texture = load_texture(ctx, &screenshot);
                self.screenshot = screenshot;
            }
            Err(e) => log::error!("Failed to grab the screen again: {:#}", e),
        }
        self.pointer = None;
        self.phase = Phase::Selecting;
        self.overlay.dim();

        if let Some(output) = self.pending_video.take() {
            self.offer_video(&output, frame);
        }
    }

    /// Ask where to keep a finished recording.
    fn offer_video(&mut self, output: &std::path::Path, frame: &eframe::Frame) {
        let mut dialog = rfd::FileDialog::new()
            .set_title(format!("{NAME} Save Video"))
            .add_filter("MP4", &["mp4"])
            .set_file_name("recording.mp4")
            .set_parent(frame);
        if !self.settings.last_save_path.is_empty() {
            dialog = dialog.set_directory(&self.settings.last_save_path);
        }
        let Some(target) = dialog.save_file() else {
            log::info!("Recording left at {}", output.display());
            return;
        };

        match media::keep_video(output, &target) {
            Ok(kept) => {
                log::info!("Saved video to {}", kept.display());
                if let Some(dir) = kept.parent() {
                    self.settings.last_save_path = dir.to_string_lossy().into_owned();
                    self.save_settings();
                }
            }
            Err(e) => log::error!("Failed to save video: {:#}", e),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context, frame: &eframe::Frame) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.escape();
        }
        if ctx.wants_keyboard_input() {
            return;
        }

        let (save, copy, record, space, shift) = ctx.input(|i| {
            let copy_event = i.events.iter().any(|e| matches!(e, egui::Event::Copy));
            (
                i.key_pressed(Key::S) && !i.modifiers.alt,
                (i.key_pressed(Key::C) && !i.modifiers.alt) || copy_event,
                i.key_pressed(Key::V) && i.modifiers.alt,
                i.key_down(Key::Space),
                arrow_shift(i),
            )
        });

        if record {
            self.video_capture();
        }
        if self.phase != Phase::Selecting {
            return;
        }

        self.overlay.space_press(space);
        if save {
            self.save_shot(frame);
        }
        if copy {
            self.clip();
        }
        if let Some(delta) = shift {
            self.shift_rect(delta);
        }
    }
}

/// Arrow key nudge for this frame: 1 px, 10 px with Shift.
fn arrow_shift(input: &egui::InputState) -> Option<Vec2> {
    let step = if input.modifiers.shift { 10.0 } else { 1.0 };
    let mut delta = Vec2::ZERO;
    if input.key_pressed(Key::ArrowLeft) {
        delta.x -= step;
    }
    if input.key_pressed(Key::ArrowRight) {
        delta.x += step;
    }
    if input.key_pressed(Key::ArrowUp) {
        delta.y -= step;
    }
    if input.key_pressed(Key::ArrowDown) {
        delta.y += step;
    }
    (delta != Vec2::ZERO).then_some(delta)
}

fn image_size(screenshot: &Screenshot) -> Vec2 {
    egui::vec2(screenshot.width() as f32, screenshot.height() as f32)
}

fn load_texture(ctx: &egui::Context, screenshot: &Screenshot) -> egui::TextureHandle {
    let size = [screenshot.width() as usize, screenshot.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, screenshot.image.as_raw());
    ctx.load_texture("screenshot", color_image, egui::TextureOptions::LINEAR)
}

impl eframe::App for KieksteApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.poll_helpers();

        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        if let Some(event) = self.overlay.tick(elapsed) {
            log::debug!("Overlay {:?}", event);
            if event == OverlayEvent::Undimmed && self.closing {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }

        if let Phase::Regrab { at } = self.phase {
            if now >= at {
                self.regrab(ctx, frame);
            } else {
                ctx.request_repaint_after(at - now);
            }
        }

        self.handle_shortcuts(ctx, frame);

        let screen = ctx.screen_rect();
        let scale = if screen.width() > 0.0 {
            self.screenshot.width() as f32 / screen.width()
        } else {
            1.0
        };
        if self.phase == Phase::Selecting {
            let latest = ctx.input(|i| i.pointer.latest_pos());
            self.pointer = seed_pointer(self.pointer, latest, screen.min, scale);
        }

        let recording = self.phase == Phase::Recording;
        let canvas_action = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if matches!(self.phase, Phase::Regrab { .. }) {
                    return canvas::CanvasAction::None;
                }
                let layers = canvas::CanvasLayers {
                    background: (!recording).then_some(&self.texture),
                    image_size: image_size(&self.screenshot),
                    pointer: self.pointer.filter(|_| self.settings.draw_pointer),
                    recording,
                };
                canvas::show(ui, &mut self.overlay, &layers)
            })
            .inner;

        if let canvas::CanvasAction::RectChanged(rect) = canvas_action {
            self.coords = geometry::aligned(rect);
        }

        match self.phase {
            Phase::Selecting => {
                let action = toolbar::show(
                    ctx,
                    toolbar::ToolbarState {
                        coords: &mut self.coords,
                        recent: &self.settings.last_rectangles,
                        draw_pointer: self.settings.draw_pointer,
                        mode: self.mode,
                        video_available: self.videoman.is_available(),
                        settings_open: self.settings_open,
                    },
                );
                match action {
                    toolbar::ToolbarAction::CoordsChanged(rect) => self.set_rect(rect),
                    toolbar::ToolbarAction::UseRecent(rect) => self.set_rect(rect),
                    toolbar::ToolbarAction::Save => self.save_shot(frame),
                    toolbar::ToolbarAction::Clip => self.clip(),
                    toolbar::ToolbarAction::TogglePointer => self.toggle_pointer(),
                    toolbar::ToolbarAction::ToggleMode => self.toggle_mode(),
                    toolbar::ToolbarAction::Record => self.video_capture(),
                    toolbar::ToolbarAction::ToggleSettings => {
                        self.settings_open = !self.settings_open;
                    }
                    toolbar::ToolbarAction::Close => self.escape(),
                    toolbar::ToolbarAction::None => {}
                }

                if self.settings_open {
                    match properties::show(ctx, &mut self.settings, &mut self.settings_open) {
                        properties::PropertiesAction::Changed => self.save_settings(),
                        properties::PropertiesAction::Close | properties::PropertiesAction::None => {}
                    }
                }
            }
            Phase::Recording => {
                let selection = geometry::to_points(self.overlay.rect(), screen.min, scale);
                let elapsed = self.videoman.elapsed().unwrap_or_default();
                if recording::show(ctx, selection, elapsed) == recording::RecordingAction::Stop {
                    self.video_capture();
                }
                ctx.request_repaint_after(HUD_INTERVAL);
            }
            Phase::Regrab { .. } => {}
        }

        if self.overlay.is_animating() {
            ctx.request_repaint();
        } else if self.encoder_lookup.is_some() {
            ctx.request_repaint_after(HUD_INTERVAL);
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }
}
