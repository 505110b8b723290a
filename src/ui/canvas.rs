// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Full-screen canvas showing the frozen screenshot and the selection.
//!
//! The overlay model works in screenshot pixels. This module converts pointer
//! input from egui points into pixels, feeds it to the overlay and paints
//! the overlay state back in points.

use crate::models::overlay::Overlay;
use crate::util::geometry;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

/// egui scroll points per wheel unit. One wheel notch is about 50 points
/// and 120 units.
const SCROLL_TO_WHEEL: f32 = 2.4;

const BORDER_STROKE: f32 = 0.5;
const SIDE_HIGHLIGHT_STROKE: f32 = 0.3;
const HANDLE_ALPHA: u8 = 30;
const HANDLE_HOVER_ALPHA: u8 = 60;
const POINTER_SIZE: f32 = 14.0;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    RectChanged(Rect),
}

/// What the canvas should paint this frame.
pub struct CanvasLayers<'a> {
    /// Frozen screenshot, `None` while it must not be shown
    pub background: Option<&'a egui::TextureHandle>,
    /// Screenshot size in pixels
    pub image_size: Vec2,
    /// Pointer position in pixels. egui only learns it from the first
    /// pointer event after the window opens, so this is where the pointer
    /// was then, not necessarily at the instant of the grab.
    pub pointer: Option<Pos2>,
    /// Draw the border outside the selection and ignore pointer input
    pub recording: bool,
}

/// Display the canvas and handle pointer interaction.
pub fn show(ui: &mut egui::Ui, overlay: &mut Overlay, layers: &CanvasLayers) -> CanvasAction {
    let screen = ui.max_rect();
    let origin = screen.min;
    let scale = if screen.width() > 0.0 {
        layers.image_size.x / screen.width()
    } else {
        1.0
    };

    let response = ui.interact(screen, ui.id().with("overlay"), Sense::click_and_drag());
    let action = if layers.recording {
        CanvasAction::None
    } else {
        handle_input(ui, overlay, &response, origin, scale)
    };

    if response.hovered() || overlay.is_pressed() {
        ui.ctx().set_cursor_icon(if layers.recording {
            egui::CursorIcon::Default
        } else {
            overlay.cursor()
        });
    }

    let painter = ui.painter();
    let to_points = |rect: Rect| geometry::to_points(rect, origin, scale);

    if let Some(texture) = layers.background {
        painter.image(
            texture.id(),
            screen,
            Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    let dim = Color32::from_black_alpha(overlay.dim_alpha());
    if dim.a() > 0 {
        for region in overlay.regions() {
            if region.is_positive() {
                painter.rect_filled(to_points(*region), 0.0, dim);
            }
        }
    }

    if let Some(side) = overlay.highlighted_side() {
        let region = overlay.regions()[side.index()];
        painter.rect_stroke(
            to_points(region),
            0.0,
            Stroke::new(SIDE_HIGHLIGHT_STROKE, Color32::WHITE),
        );
    }

    let show_handle = overlay.is_resizing() || !overlay.is_pressed();
    if let Some(handle) = overlay.handle().filter(|_| show_handle) {
        let alpha = if overlay.handle_hovered() {
            HANDLE_HOVER_ALPHA
        } else {
            HANDLE_ALPHA
        };
        painter.rect_filled(to_points(handle), 0.0, Color32::from_white_alpha(alpha));
    }

    if overlay.has_selection() {
        let selection = to_points(overlay.rect());
        let flash = overlay.flash_alpha();
        if flash > 0 {
            painter.rect_filled(selection, 0.0, Color32::from_white_alpha(flash));
        }

        // Keep the border out of the recorded pixels.
        let border = if layers.recording {
            geometry::grown(selection, 1.0)
        } else {
            selection
        };
        painter.rect_stroke(border, 0.0, Stroke::new(BORDER_STROKE, Color32::WHITE));
    }

    if let (Some(pointer), false) = (layers.pointer, layers.recording) {
        draw_pointer(painter, origin + pointer.to_vec2() / scale);
    }

    action
}

/// Translate this frame's pointer input into overlay calls.
fn handle_input(
    ui: &egui::Ui,
    overlay: &mut Overlay,
    response: &egui::Response,
    origin: Pos2,
    scale: f32,
) -> CanvasAction {
    let (latest, pressed, released, scroll) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.raw_scroll_delta.y,
        )
    });

    let mut changed = None;
    let hovered = response.hovered();

    if let Some(pos) = latest.filter(|_| hovered || overlay.is_pressed()) {
        let pixel = geometry::to_pixels(pos, origin, scale);
        if pixel != overlay.pos() {
            changed = overlay.cursor_move(pixel).or(changed);
        }
    }

    if pressed && hovered && !overlay.is_pressed() {
        overlay.mouse_press(true);
    }
    if released && overlay.is_pressed() {
        overlay.mouse_press(false);
    }

    if hovered && scroll != 0.0 {
        changed = overlay.wheel_scroll(scroll * SCROLL_TO_WHEEL).or(changed);
    }

    match changed {
        Some(rect) => CanvasAction::RectChanged(rect),
        None => CanvasAction::None,
    }
}

/// Arrow marker where the mouse pointer was when the screen was grabbed.
fn draw_pointer(painter: &egui::Painter, tip: Pos2) {
    let points = vec![
        tip,
        tip + egui::vec2(0.0, POINTER_SIZE),
        tip + egui::vec2(POINTER_SIZE * 0.7, POINTER_SIZE * 0.7),
    ];
    painter.add(egui::Shape::convex_polygon(
        points,
        Color32::WHITE,
        Stroke::new(1.0, Color32::BLACK),
    ));
}
