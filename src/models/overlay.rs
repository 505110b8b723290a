// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Selection overlay state.
//!
//! The overlay is the dimmed layer over the frozen screenshot. It owns the
//! selection rectangle, the eight dim regions around it and the pointer
//! interaction state (drawing, panning, resizing). Everything is in
//! screenshot pixel space; painting lives in `ui::canvas`.

use crate::util::fade::{FadeStep, Fader};
use crate::util::geometry::{self, Side, Zone};
use egui::{vec2, CursorIcon, Pos2, Rect, Vec2};
use std::time::Duration;

/// Alpha of the dim regions once faded in.
pub const DIM_OPACITY: u8 = 170;

/// Starting alpha of the white flash after a save or copy.
pub const FLASH_OPACITY: u8 = 100;

/// How far the resize handles reach out from the selection.
pub const RESIZE_HANDLE_WIDTH: f32 = 50.0;

/// Wheel units per pixel of resize. One wheel notch is 120 units.
const WHEEL_DIVISOR: f32 = 10.0;

/// Fade completions reported by [`Overlay::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    Dimmed,
    Undimmed,
}

/// The dimmed layer and its selection rectangle.
pub struct Overlay {
    screen: Rect,
    rect: Rect,
    regions: [Rect; 8],

    lmouse: bool,
    space: bool,
    press_pos: Pos2,
    /// In-progress rectangle, not normalized
    drawing: Option<Rect>,
    panning: bool,
    resizing: bool,
    pos: Pos2,
    under_mouse: Option<Zone>,
    handle: Option<Rect>,
    handle_hovered: bool,

    dimmer: Fader,
    flasher: Fader,
}

impl Overlay {
    /// Create an overlay for a screenshot of the given pixel size.
    pub fn new(screen_size: Vec2) -> Self {
        let screen = Rect::from_min_size(Pos2::ZERO, screen_size);
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::ZERO);
        Self {
            screen,
            rect,
            regions: geometry::regions(rect, screen),
            lmouse: false,
            space: false,
            press_pos: Pos2::ZERO,
            drawing: None,
            panning: false,
            resizing: false,
            pos: Pos2::ZERO,
            under_mouse: None,
            handle: None,
            handle_hovered: false,
            dimmer: Fader::new(0),
            flasher: Fader::new(0),
        }
    }

    /// Current selection in pixels.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Current selection as an integer `[x, y, w, h]`.
    pub fn aligned_rect(&self) -> [i32; 4] {
        geometry::aligned(self.rect)
    }

    pub fn has_selection(&self) -> bool {
        let [_, _, w, h] = self.aligned_rect();
        w > 0 && h > 0
    }

    pub fn regions(&self) -> &[Rect; 8] {
        &self.regions
    }

    pub fn is_pressed(&self) -> bool {
        self.lmouse
    }

    #[cfg(test)]
    pub fn is_panning(&self) -> bool {
        self.panning
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    #[cfg(test)]
    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// Last cursor position fed to [`Overlay::cursor_move`].
    pub fn pos(&self) -> Pos2 {
        self.pos
    }

    #[cfg(test)]
    pub fn under_mouse(&self) -> Option<Zone> {
        self.under_mouse
    }

    /// Resize handle of the hovered side, if any.
    pub fn handle(&self) -> Option<Rect> {
        self.handle
    }

    pub fn handle_hovered(&self) -> bool {
        self.handle_hovered
    }

    /// Side region to outline while hovering.
    pub fn highlighted_side(&self) -> Option<Side> {
        match self.under_mouse {
            Some(Zone::Side(side)) if !self.lmouse && self.has_selection() => Some(side),
            _ => None,
        }
    }

    pub fn dim_alpha(&self) -> u8 {
        self.dimmer.alpha()
    }

    pub fn flash_alpha(&self) -> u8 {
        self.flasher.alpha()
    }

    pub fn is_animating(&self) -> bool {
        self.dimmer.is_running() || self.flasher.is_running()
    }

    /// Set the selection without reporting a change.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = geometry::normalize(rect);
        self.regions = geometry::regions(self.rect, self.screen);
        if self.lmouse {
            if let Some(Zone::Side(side)) = self.under_mouse {
                self.handle = self.handle_rect(side);
                self.handle_hovered = self.handle.is_some_and(|h| h.contains(self.pos));
            }
        } else if self.under_mouse.is_some() {
            // The selection may have moved away from a still pointer.
            self.check_zone();
        }
    }

    /// Set the selection and return it when it differs from the old one.
    fn update_rect(&mut self, rect: Rect) -> Option<Rect> {
        let before = self.rect;
        self.set_rect(rect);
        (self.rect != before).then_some(self.rect)
    }

    /// Move the selection by `delta` pixels.
    pub fn shift_rect(&mut self, delta: Vec2) -> Option<Rect> {
        if !self.has_selection() {
            return None;
        }
        self.update_rect(self.rect.translate(delta))
    }

    /// Feed a new cursor position. Returns the selection when it changed.
    pub fn cursor_move(&mut self, pos: Pos2) -> Option<Rect> {
        let diff = pos - self.pos;
        self.pos = pos;
        self.check_zone();
        if let Some(handle) = self.handle {
            self.handle_hovered = handle.contains(pos);
        }

        if !self.lmouse {
            return None;
        }

        if self.drawing.is_none() && self.under_mouse == Some(Zone::Center) {
            self.panning = true;
            return self.shift_rect(diff);
        }

        if self.resizing {
            return match self.under_mouse {
                Some(Zone::Side(side)) => self.resize_side(side, diff),
                _ => None,
            };
        }

        let start = self.press_pos;
        let drawing = self
            .drawing
            .get_or_insert_with(|| Rect::from_min_max(start, start));
        if self.space {
            *drawing = drawing.translate(diff);
        } else {
            drawing.max = pos;
        }
        let drawing = *drawing;
        self.handle = None;
        self.handle_hovered = false;
        self.update_rect(drawing)
    }

    /// Left mouse button state change.
    pub fn mouse_press(&mut self, down: bool) {
        self.lmouse = down;
        if down {
            self.press_pos = self.pos;
            self.resizing = matches!(self.under_mouse, Some(Zone::Side(_))) && self.handle_hovered;
        } else {
            self.panning = false;
            self.drawing = None;
            self.resizing = false;
            self.check_zone();
        }
    }

    /// Space bar state. While held, drawing moves the in-progress rectangle.
    pub fn space_press(&mut self, down: bool) {
        self.space = down;
    }

    /// Mouse wheel over the overlay, in wheel units.
    pub fn wheel_scroll(&mut self, delta: f32) -> Option<Rect> {
        if !self.has_selection() {
            return None;
        }
        let amount = delta / WHEEL_DIVISOR;
        match self.under_mouse? {
            Zone::Center => self.update_rect(geometry::grown(self.rect, amount)),
            Zone::Side(side) => self.resize_side(side, vec2(amount, amount)),
        }
    }

    /// Cursor shape for the current hover and press state.
    pub fn cursor(&self) -> CursorIcon {
        match self.under_mouse {
            Some(Zone::Center) if self.drawing.is_none() => {
                if self.lmouse {
                    CursorIcon::Grabbing
                } else {
                    CursorIcon::Move
                }
            }
            Some(Zone::Side(side)) if self.resizing || (self.handle_hovered && !self.lmouse) => {
                if self.lmouse {
                    CursorIcon::Grabbing
                } else {
                    side.cursor()
                }
            }
            _ => CursorIcon::Crosshair,
        }
    }

    /// Fade the dim regions in.
    pub fn dim(&mut self) {
        self.dimmer.fade(DIM_OPACITY);
    }

    /// Fade the dim regions out.
    pub fn undim(&mut self) {
        self.dimmer.fade(0);
    }

    /// Flash the selection white.
    pub fn flash(&mut self) {
        self.flasher.set_alpha(FLASH_OPACITY);
        self.flasher.fade(0);
    }

    /// Advance the fades by `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) -> Option<OverlayEvent> {
        self.flasher.advance(elapsed);
        match self.dimmer.advance(elapsed) {
            FadeStep::Finished if self.dimmer.alpha() == 0 => Some(OverlayEvent::Undimmed),
            FadeStep::Finished => Some(OverlayEvent::Dimmed),
            _ => None,
        }
    }

    fn resize_side(&mut self, side: Side, delta: Vec2) -> Option<Rect> {
        let resized = geometry::resize(self.rect, side, delta);
        let changed = self.update_rect(resized);
        if self.lmouse {
            self.handle = self.handle_rect(side);
        }
        changed
    }

    fn handle_rect(&self, side: Side) -> Option<Rect> {
        if !self.has_selection() {
            return None;
        }
        let grown = geometry::grown(self.rect, RESIZE_HANDLE_WIDTH);
        let handle = grown.intersect(self.regions[side.index()]);
        handle.is_positive().then_some(handle)
    }

    /// Work out which zone is under the cursor. Frozen while the button is down.
    fn check_zone(&mut self) {
        if self.lmouse {
            return;
        }

        let zone = if self.has_selection() && self.rect.contains(self.pos) {
            Zone::Center
        } else {
            Side::ALL
                .iter()
                .zip(self.regions.iter())
                .find(|(_, region)| region.contains(self.pos))
                .map(|(side, _)| Zone::Side(*side))
                .unwrap_or(Zone::Center)
        };

        self.under_mouse = Some(zone);
        self.handle = match zone {
            Zone::Side(side) => self.handle_rect(side),
            Zone::Center => None,
        };
        self.handle_hovered = self.handle.is_some_and(|h| h.contains(self.pos));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn overlay() -> Overlay {
        Overlay::new(vec2(1000.0, 800.0))
    }

    fn overlay_with_selection() -> Overlay {
        let mut overlay = overlay();
        overlay.set_rect(Rect::from_min_max(pos2(100.0, 100.0), pos2(300.0, 200.0)));
        overlay
    }

    fn drag(overlay: &mut Overlay, from: Pos2, to: Pos2) -> Option<Rect> {
        overlay.cursor_move(from);
        overlay.mouse_press(true);
        let changed = overlay.cursor_move(to);
        overlay.mouse_press(false);
        changed
    }

    #[test]
    fn test_drag_draws_normalized_rect() {
        let mut overlay = overlay();
        let changed = drag(&mut overlay, pos2(400.0, 300.0), pos2(200.0, 100.0));

        assert_eq!(changed, Some(Rect::from_min_max(pos2(200.0, 100.0), pos2(400.0, 300.0))));
        assert_eq!(overlay.aligned_rect(), [200, 100, 200, 200]);
        assert!(!overlay.is_drawing());
    }

    #[test]
    fn test_drag_inside_selection_pans() {
        let mut overlay = overlay_with_selection();
        drag(&mut overlay, pos2(150.0, 150.0), pos2(170.0, 140.0));

        assert_eq!(overlay.aligned_rect(), [120, 90, 200, 100]);
    }

    #[test]
    fn test_pan_keeps_going_outside_selection() {
        let mut overlay = overlay_with_selection();
        overlay.cursor_move(pos2(150.0, 150.0));
        overlay.mouse_press(true);
        overlay.cursor_move(pos2(600.0, 150.0));
        assert!(overlay.is_panning());
        overlay.cursor_move(pos2(650.0, 150.0));
        overlay.mouse_press(false);

        assert_eq!(overlay.aligned_rect(), [600, 100, 200, 100]);
        assert!(!overlay.is_panning());
    }

    #[test]
    fn test_drag_outside_handles_starts_new_rect() {
        let mut overlay = overlay_with_selection();
        drag(&mut overlay, pos2(700.0, 600.0), pos2(800.0, 700.0));

        assert_eq!(overlay.aligned_rect(), [700, 600, 100, 100]);
    }

    #[test]
    fn test_handle_drag_resizes_side() {
        let mut overlay = overlay_with_selection();
        // Just right of the selection, inside the right handle.
        overlay.cursor_move(pos2(320.0, 150.0));
        assert_eq!(overlay.under_mouse(), Some(Zone::Side(Side::Right)));
        assert!(overlay.handle_hovered());
        assert_eq!(overlay.cursor(), CursorIcon::ResizeHorizontal);

        overlay.mouse_press(true);
        assert!(overlay.is_resizing());
        assert_eq!(overlay.cursor(), CursorIcon::Grabbing);
        overlay.cursor_move(pos2(360.0, 170.0));
        overlay.mouse_press(false);

        assert_eq!(overlay.aligned_rect(), [100, 100, 240, 100]);
    }

    #[test]
    fn test_corner_handle_resizes_both_edges() {
        let mut overlay = overlay_with_selection();
        drag(&mut overlay, pos2(90.0, 90.0), pos2(80.0, 60.0));

        assert_eq!(overlay.aligned_rect(), [90, 70, 210, 130]);
    }

    #[test]
    fn test_space_moves_in_progress_rect() {
        let mut overlay = overlay();
        overlay.cursor_move(pos2(100.0, 100.0));
        overlay.mouse_press(true);
        overlay.cursor_move(pos2(200.0, 200.0));
        overlay.space_press(true);
        overlay.cursor_move(pos2(250.0, 210.0));
        overlay.space_press(false);
        overlay.cursor_move(pos2(300.0, 260.0));
        overlay.mouse_press(false);

        assert_eq!(overlay.aligned_rect(), [150, 110, 150, 150]);
    }

    #[test]
    fn test_wheel_over_side_moves_it() {
        let mut overlay = overlay_with_selection();
        overlay.cursor_move(pos2(50.0, 150.0));
        assert_eq!(overlay.under_mouse(), Some(Zone::Side(Side::Left)));

        let changed = overlay.wheel_scroll(120.0);
        assert!(changed.is_some());
        assert_eq!(overlay.aligned_rect(), [112, 100, 188, 100]);
    }

    #[test]
    fn test_wheel_over_selection_grows_it() {
        let mut overlay = overlay_with_selection();
        overlay.cursor_move(pos2(150.0, 150.0));
        overlay.wheel_scroll(100.0);

        assert_eq!(overlay.aligned_rect(), [90, 90, 220, 120]);
    }

    #[test]
    fn test_wheel_without_selection_is_ignored() {
        let mut overlay = overlay();
        overlay.cursor_move(pos2(150.0, 150.0));
        assert_eq!(overlay.wheel_scroll(120.0), None);
    }

    #[test]
    fn test_shift_rect() {
        let mut overlay = overlay_with_selection();
        assert!(overlay.shift_rect(vec2(-1.0, 0.0)).is_some());
        assert_eq!(overlay.aligned_rect(), [99, 100, 200, 100]);

        let mut empty = Overlay::new(vec2(1000.0, 800.0));
        assert_eq!(empty.shift_rect(vec2(1.0, 0.0)), None);
    }

    #[test]
    fn test_press_after_nudge_draws_instead_of_panning() {
        let mut overlay = overlay();
        overlay.set_rect(Rect::from_min_size(pos2(100.0, 100.0), vec2(10.0, 10.0)));
        overlay.cursor_move(pos2(105.0, 105.0));
        assert_eq!(overlay.under_mouse(), Some(Zone::Center));

        overlay.shift_rect(vec2(100.0, 100.0));
        assert_eq!(overlay.under_mouse(), Some(Zone::Side(Side::TopLeft)));
        assert!(!overlay.handle_hovered());

        overlay.mouse_press(true);
        overlay.cursor_move(pos2(125.0, 125.0));
        overlay.mouse_press(false);

        assert!(!overlay.is_panning());
        assert_eq!(overlay.aligned_rect(), [105, 105, 20, 20]);
    }

    #[test]
    fn test_set_rect_under_still_pointer_updates_zone() {
        let mut overlay = overlay_with_selection();
        overlay.cursor_move(pos2(500.0, 150.0));
        assert_eq!(overlay.under_mouse(), Some(Zone::Side(Side::Right)));
        assert_eq!(overlay.cursor(), CursorIcon::Crosshair);

        overlay.set_rect(Rect::from_min_max(pos2(400.0, 100.0), pos2(600.0, 200.0)));
        assert_eq!(overlay.under_mouse(), Some(Zone::Center));
        assert_eq!(overlay.cursor(), CursorIcon::Move);
    }

    #[test]
    fn test_set_rect_before_pointer_is_seen_keeps_zone_unknown() {
        let overlay = overlay_with_selection();
        assert_eq!(overlay.under_mouse(), None);
    }

    #[test]
    fn test_cursor_shapes() {
        let mut overlay = overlay_with_selection();
        overlay.cursor_move(pos2(150.0, 150.0));
        assert_eq!(overlay.cursor(), CursorIcon::Move);
        overlay.mouse_press(true);
        assert_eq!(overlay.cursor(), CursorIcon::Grabbing);
        overlay.mouse_press(false);

        overlay.cursor_move(pos2(900.0, 700.0));
        assert_eq!(overlay.cursor(), CursorIcon::Crosshair);
    }

    #[test]
    fn test_set_rect_does_not_report_but_updates_regions() {
        let mut overlay = overlay();
        overlay.set_rect(Rect::from_min_max(pos2(300.0, 300.0), pos2(100.0, 100.0)));

        assert_eq!(overlay.rect(), Rect::from_min_max(pos2(100.0, 100.0), pos2(300.0, 300.0)));
        assert_eq!(
            overlay.regions()[Side::Top.index()],
            Rect::from_min_max(pos2(100.0, 0.0), pos2(300.0, 100.0))
        );
    }

    #[test]
    fn test_dim_undim_and_flash() {
        let mut overlay = overlay_with_selection();
        overlay.dim();
        assert!(overlay.is_animating());
        assert_eq!(overlay.tick(Duration::from_millis(200)), None);
        assert_eq!(overlay.dim_alpha(), DIM_OPACITY);
        assert_eq!(overlay.tick(Duration::from_millis(20)), Some(OverlayEvent::Dimmed));

        overlay.flash();
        assert_eq!(overlay.flash_alpha(), FLASH_OPACITY);
        overlay.undim();
        assert_eq!(overlay.tick(Duration::from_millis(500)), Some(OverlayEvent::Undimmed));
        assert_eq!(overlay.dim_alpha(), 0);
        assert_eq!(overlay.flash_alpha(), 0);
        assert!(!overlay.is_animating());
    }
}
