// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Output of captured media: PNG files, the clipboard and recorded videos.

use anyhow::{Context, Result};
use arboard::Clipboard;
use image::RgbaImage;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// `path` with a `.png` extension when it has none.
pub fn with_png_extension(path: &Path) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("png")
    } else {
        path.to_path_buf()
    }
}

/// Save `image` as PNG. Returns the path actually written.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<PathBuf> {
    let path = with_png_extension(path);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Put `image` on the clipboard, opening the clipboard on first use.
///
/// The clipboard handle is kept by the caller: on X11 the image is only
/// served while it is alive.
pub fn copy_to_clipboard(clipboard: &mut Option<Clipboard>, image: &RgbaImage) -> Result<()> {
    if clipboard.is_none() {
        *clipboard = Some(Clipboard::new().context("Failed to open the clipboard")?);
    }
    if let Some(clipboard) = clipboard.as_mut() {
        clipboard
            .set_image(arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Borrowed(image.as_raw()),
            })
            .context("Failed to copy the image to the clipboard")?;
    }
    Ok(())
}

/// Move a finished recording from the temp directory to `target`.
pub fn keep_video(source: &Path, target: &Path) -> Result<PathBuf> {
    let target = if target.extension().is_none() {
        target.with_extension("mp4")
    } else {
        target.to_path_buf()
    };
    if std::fs::rename(source, &target).is_err() {
        // Rename fails across file systems.
        std::fs::copy(source, &target).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), target.display())
        })?;
        if let Err(e) = std::fs::remove_file(source) {
            log::warn!("Failed to remove {}: {}", source.display(), e);
        }
    }
    Ok(target)
}
