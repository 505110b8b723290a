// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persistent user settings.
//!
//! A flat record mirrored field by field into the settings JSON file. Keys
//! this version does not know are carried in `extra` so they survive a
//! rewrite.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of remembered rectangles unless configured otherwise.
pub const DEFAULT_MAX_RECTANGLES: usize = 12;

/// User settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of the last saved screenshot
    pub last_save_path: String,
    /// Previously used selections as `[x, y, w, h]`, oldest first
    pub last_rectangles: Vec<[i32; 4]>,
    pub max_rectangles: usize,
    /// Draw the mouse pointer on the overlay and in recordings
    pub draw_pointer: bool,
    pub video_fps: u32,
    /// Encoder bitrate in kbit/s
    pub video_quality: u32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
    /// Keys whose stored value could not be read and fell back to the default
    #[serde(skip)]
    pub invalid_keys: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_save_path: String::new(),
            last_rectangles: Vec::new(),
            max_rectangles: DEFAULT_MAX_RECTANGLES,
            draw_pointer: true,
            video_fps: 10,
            video_quality: 5000,
            extra: BTreeMap::new(),
            invalid_keys: BTreeSet::new(),
        }
    }
}

impl Settings {
    /// Record `rect` as the most recently used rectangle.
    ///
    /// Returns `false` if it already was the most recent one.
    pub fn remember_rect(&mut self, rect: [i32; 4]) -> bool {
        if self.last_rectangles.last() == Some(&rect) {
            return false;
        }
        self.last_rectangles.retain(|r| *r != rect);
        self.last_rectangles.push(rect);
        self.trim_rectangles();
        true
    }

    /// Drop the oldest rectangles beyond `max_rectangles`.
    pub fn trim_rectangles(&mut self) {
        let max = self.max_rectangles.max(1);
        if self.last_rectangles.len() > max {
            let excess = self.last_rectangles.len() - max;
            self.last_rectangles.drain(..excess);
        }
    }

    /// Bring loaded values back within range. At least one rectangle is
    /// always kept. Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = (self.max_rectangles, self.last_rectangles.len());
        self.max_rectangles = self.max_rectangles.max(1);
        self.trim_rectangles();
        before != (self.max_rectangles, self.last_rectangles.len())
    }

    pub fn last_rect(&self) -> Option<[i32; 4]> {
        self.last_rectangles.last().copied()
    }
}
