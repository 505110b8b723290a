// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! kiekste - screenshot and screen recording overlay
//!
//! Grabs the primary monitor, shows the frozen image full screen with a
//! dimmed layer around a selection rectangle, and saves, copies or records
//! the selected region.

mod app;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::KieksteApp;

/// Application name, used for window titles and the settings location.
pub const NAME: &str = "kiekste";

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Grab before the window exists so it is not in the picture
    let screenshot = io::screen::grab_primary()?;
    let (x, y) = screenshot.origin;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(NAME)
            .with_position([x as f32 / screenshot.scale_factor, y as f32 / screenshot.scale_factor])
            .with_fullscreen(true)
            .with_decorations(false)
            .with_transparent(true)
            .with_window_level(egui::WindowLevel::AlwaysOnTop),
        ..Default::default()
    };

    eframe::run_native(
        NAME,
        options,
        Box::new(move |cc| Ok(Box::new(KieksteApp::new(cc, screenshot)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
