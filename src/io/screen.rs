// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screen grabbing.
//!
//! The overlay works on a frozen still of the primary monitor taken before
//! the window appears.

use crate::util::geometry;
use anyhow::{bail, Context, Result};
use image::RgbaImage;
use xcap::Monitor;

/// A still image of one monitor.
pub struct Screenshot {
    pub image: RgbaImage,
    /// Monitor position on the virtual desktop
    pub origin: (i32, i32),
    pub scale_factor: f32,
}

impl Screenshot {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy the `[x, y, w, h]` region out of the screenshot, clamped to it.
    pub fn crop(&self, rect: [i32; 4]) -> Result<RgbaImage> {
        let (x, y, w, h) = geometry::crop_bounds(rect, self.width(), self.height())
            .with_context(|| format!("Selection {:?} lies outside the screenshot", rect))?;
        Ok(image::imageops::crop_imm(&self.image, x, y, w, h).to_image())
    }

    /// Translate a screenshot rectangle to virtual desktop coordinates.
    pub fn desktop_rect(&self, [x, y, w, h]: [i32; 4]) -> [i32; 4] {
        [x + self.origin.0, y + self.origin.1, w, h]
    }

    /// Desktop region to record for `rect`, clamped to this monitor like a
    /// crop. `None` when nothing of `rect` is on screen.
    pub fn capture_rect(&self, rect: [i32; 4]) -> Option<[i32; 4]> {
        let (x, y, w, h) = geometry::crop_bounds(rect, self.width(), self.height())?;
        Some(self.desktop_rect([x as i32, y as i32, w as i32, h as i32]))
    }
}

/// Grab the primary monitor, or the first one if none is flagged primary.
pub fn grab_primary() -> Result<Screenshot> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| monitors.first())
        .context("No monitors found")?;

    let captured = monitor
        .capture_image()
        .context("Failed to capture the screen")?;
    let (width, height) = (captured.width(), captured.height());
    if width == 0 || height == 0 {
        bail!("Captured an empty screenshot - possible permission issue or no display");
    }
    let image = RgbaImage::from_raw(width, height, captured.into_raw())
        .context("Screen capture returned a malformed pixel buffer")?;

    let origin = (monitor.x().unwrap_or(0), monitor.y().unwrap_or(0));
    let scale_factor = monitor.scale_factor().unwrap_or(1.0);
    log::info!(
        "Grabbed {}x{} screenshot at {:?} (scale {:.2})",
        width,
        height,
        origin,
        scale_factor
    );

    Ok(Screenshot {
        image,
        origin,
        scale_factor,
    })
}
