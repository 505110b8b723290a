// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Floating tool box.
//!
//! A translucent strip centered at the top of the screen holding the
//! selection coordinates, the recent selections menu and the action
//! buttons. It becomes more opaque while hovered.

use crate::app::Mode;

const IDLE_OPACITY: f32 = 0.4;
const HOVER_OPACITY: f32 = 0.8;

/// Upper bound for the coordinate spinners.
const MAX_COORD: i32 = 32_000;

/// Result of tool box interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    CoordsChanged([i32; 4]),
    UseRecent([i32; 4]),
    Save,
    Clip,
    TogglePointer,
    ToggleMode,
    Record,
    ToggleSettings,
    Close,
}

/// Everything the tool box displays.
pub struct ToolbarState<'a> {
    /// Spinner values `[x, y, w, h]`
    pub coords: &'a mut [i32; 4],
    /// Remembered rectangles, oldest first
    pub recent: &'a [[i32; 4]],
    pub draw_pointer: bool,
    pub mode: Mode,
    /// Video mode can be switched to
    pub video_available: bool,
    pub settings_open: bool,
}

/// Display the tool box and return the requested action.
pub fn show(ctx: &egui::Context, state: ToolbarState) -> ToolbarAction {
    let id = egui::Id::new("toolbox");
    let hovered = ctx.data(|d| d.get_temp::<bool>(id).unwrap_or(false));
    let mut action = ToolbarAction::None;

    let area = egui::Area::new(id)
        .anchor(egui::Align2::CENTER_TOP, egui::Vec2::ZERO)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            ui.set_opacity(if hovered { HOVER_OPACITY } else { IDLE_OPACITY });
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 4.0;
                    action = show_contents(ui, state);
                });
            });
        });

    let hovered_now = ctx
        .pointer_hover_pos()
        .is_some_and(|pos| area.response.rect.contains(pos));
    if hovered_now != hovered {
        ctx.data_mut(|d| d.insert_temp(id, hovered_now));
        ctx.request_repaint();
    }

    action
}

fn show_contents(ui: &mut egui::Ui, state: ToolbarState) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    let mut coords_changed = false;
    for (i, value) in state.coords.iter_mut().enumerate() {
        let min = if i < 2 { -MAX_COORD } else { 0 };
        coords_changed |= ui
            .add(egui::DragValue::new(value).clamp_range(min..=MAX_COORD))
            .changed();
    }
    if coords_changed {
        action = ToolbarAction::CoordsChanged(*state.coords);
    }

    ui.add_enabled_ui(!state.recent.is_empty(), |ui| {
        ui.menu_button("⏷", |ui| {
            for rect in state.recent.iter().rev() {
                let [x, y, w, h] = *rect;
                if ui.button(format!("{x}, {y}  {w} × {h}")).clicked() {
                    action = ToolbarAction::UseRecent(*rect);
                    ui.close_menu();
                }
            }
        })
        .response
        .on_hover_text("Recent selections");
    });

    ui.separator();

    match state.mode {
        Mode::Image => {
            if ui.button("💾").on_hover_text("Save (S)").clicked() {
                action = ToolbarAction::Save;
            }
            if ui.button("📋").on_hover_text("Copy to clipboard (C)").clicked() {
                action = ToolbarAction::Clip;
            }
        }
        Mode::Video => {
            if ui.button("⏺").on_hover_text("Record (Alt+V)").clicked() {
                action = ToolbarAction::Record;
            }
        }
    }

    if ui
        .selectable_label(state.draw_pointer, "⬉")
        .on_hover_text("Draw mouse pointer")
        .clicked()
    {
        action = ToolbarAction::TogglePointer;
    }

    let mode_label = match state.mode {
        Mode::Image => "📷",
        Mode::Video => "🎥",
    };
    if ui
        .add_enabled(state.video_available, egui::Button::new(mode_label))
        .on_hover_text("Switch between screenshot and video")
        .on_disabled_hover_text("No video encoder found")
        .clicked()
    {
        action = ToolbarAction::ToggleMode;
    }

    if ui
        .selectable_label(state.settings_open, "⚙")
        .on_hover_text("Settings")
        .clicked()
    {
        action = ToolbarAction::ToggleSettings;
    }

    if ui.button("❌").on_hover_text("Close (Esc)").clicked() {
        action = ToolbarAction::Close;
    }

    action
}
