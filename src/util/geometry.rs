// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! All selection math happens in screenshot pixel space. The canvas converts
//! between egui points and pixels with [`to_pixels`] and [`to_points`].

use egui::{pos2, vec2, CursorIcon, Pos2, Rect, Vec2};

/// One of the eight regions tiling the screen around the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Side {
    /// Same order as the array returned by [`regions`].
    pub const ALL: [Side; 8] = [
        Side::TopLeft,
        Side::Top,
        Side::TopRight,
        Side::Left,
        Side::Right,
        Side::BottomLeft,
        Side::Bottom,
        Side::BottomRight,
    ];

    /// Index into the [`regions`] array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Cursor shown while hovering the resize handle of this side.
    pub fn cursor(self) -> CursorIcon {
        match self {
            Side::Left | Side::Right => CursorIcon::ResizeHorizontal,
            Side::Top | Side::Bottom => CursorIcon::ResizeVertical,
            Side::TopLeft | Side::BottomRight => CursorIcon::ResizeNwSe,
            Side::TopRight | Side::BottomLeft => CursorIcon::ResizeNeSw,
        }
    }

    /// Which edges (left, top, right, bottom) this side moves.
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Side::TopLeft => (true, true, false, false),
            Side::Top => (false, true, false, false),
            Side::TopRight => (false, true, true, false),
            Side::Left => (true, false, false, false),
            Side::Right => (false, false, true, false),
            Side::BottomLeft => (true, false, false, true),
            Side::Bottom => (false, false, false, true),
            Side::BottomRight => (false, false, true, true),
        }
    }
}

/// What part of the overlay the cursor is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Center,
    Side(Side),
}

/// Flip a rectangle whose min corner ended up past its max corner.
pub fn normalize(rect: Rect) -> Rect {
    Rect::from_two_pos(rect.min, rect.max)
}

/// Smallest integer rectangle containing `rect`, as `[x, y, w, h]`.
pub fn aligned(rect: Rect) -> [i32; 4] {
    let rect = normalize(rect);
    let min_x = rect.min.x.floor() as i32;
    let min_y = rect.min.y.floor() as i32;
    let max_x = rect.max.x.ceil() as i32;
    let max_y = rect.max.y.ceil() as i32;
    [min_x, min_y, max_x - min_x, max_y - min_y]
}

/// Rectangle from `[x, y, w, h]`.
pub fn from_xywh([x, y, w, h]: [i32; 4]) -> Rect {
    normalize(Rect::from_min_size(
        pos2(x as f32, y as f32),
        vec2(w as f32, h as f32),
    ))
}

/// `rect` expanded by `amount` on every side. Negative amounts shrink and
/// may invert the rectangle.
pub fn grown(rect: Rect, amount: f32) -> Rect {
    Rect::from_min_max(rect.min - Vec2::splat(amount), rect.max + Vec2::splat(amount))
}

/// The eight rectangles tiling `screen` around `selection`, ordered like
/// [`Side::ALL`]. The selection is clamped to the screen first so the
/// regions never overlap or invert.
pub fn regions(selection: Rect, screen: Rect) -> [Rect; 8] {
    let left = selection.min.x.clamp(screen.min.x, screen.max.x);
    let top = selection.min.y.clamp(screen.min.y, screen.max.y);
    let right = selection.max.x.clamp(left, screen.max.x);
    let bottom = selection.max.y.clamp(top, screen.max.y);
    let (sl, st, sr, sb) = (screen.min.x, screen.min.y, screen.max.x, screen.max.y);

    [
        Rect::from_min_max(pos2(sl, st), pos2(left, top)),
        Rect::from_min_max(pos2(left, st), pos2(right, top)),
        Rect::from_min_max(pos2(right, st), pos2(sr, top)),
        Rect::from_min_max(pos2(sl, top), pos2(left, bottom)),
        Rect::from_min_max(pos2(right, top), pos2(sr, bottom)),
        Rect::from_min_max(pos2(sl, bottom), pos2(left, sb)),
        Rect::from_min_max(pos2(left, bottom), pos2(right, sb)),
        Rect::from_min_max(pos2(right, bottom), pos2(sr, sb)),
    ]
}

/// Move the edges named by `side` by `delta`. The result is not normalized.
pub fn resize(rect: Rect, side: Side, delta: Vec2) -> Rect {
    let (left, top, right, bottom) = side.edges();
    let mut rect = rect;
    if left {
        rect.min.x += delta.x;
    }
    if top {
        rect.min.y += delta.y;
    }
    if right {
        rect.max.x += delta.x;
    }
    if bottom {
        rect.max.y += delta.y;
    }
    rect
}

/// Clamp an `[x, y, w, h]` rectangle to an image of the given size.
/// Returns `(x, y, w, h)` or `None` when nothing of it is inside.
pub fn crop_bounds([x, y, w, h]: [i32; 4], width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(w).min(width as i32);
    let y1 = y.saturating_add(h).min(height as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Convert a position in egui points to screenshot pixels.
pub fn to_pixels(pos: Pos2, origin: Pos2, scale: f32) -> Pos2 {
    pos2((pos.x - origin.x) * scale, (pos.y - origin.y) * scale)
}

/// Convert a screenshot pixel rectangle to egui points.
pub fn to_points(rect: Rect, origin: Pos2, scale: f32) -> Rect {
    Rect::from_min_max(
        origin + rect.min.to_vec2() / scale,
        origin + rect.max.to_vec2() / scale,
    )
}
