// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings panel.
//!
//! A small window below the tool box for the values kept in the settings
//! file: pointer drawing, video frame rate and quality, and how many
//! selections are remembered.

use crate::models::settings::Settings;

/// Result of settings panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesAction {
    None,
    /// A value was edited and should be saved
    Changed,
    Close,
}

/// Display the settings panel while `open` is set.
pub fn show(ctx: &egui::Context, settings: &mut Settings, open: &mut bool) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    let mut window_open = *open;

    egui::Window::new("Settings")
        .open(&mut window_open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 48.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Draw pointer");
                    if ui.checkbox(&mut settings.draw_pointer, "").changed() {
                        action = PropertiesAction::Changed;
                    }
                    ui.end_row();

                    ui.label("Video frame rate");
                    if ui
                        .add(
                            egui::DragValue::new(&mut settings.video_fps)
                                .clamp_range(1..=60)
                                .suffix(" fps"),
                        )
                        .changed()
                    {
                        action = PropertiesAction::Changed;
                    }
                    ui.end_row();

                    ui.label("Video quality");
                    if ui
                        .add(
                            egui::DragValue::new(&mut settings.video_quality)
                                .clamp_range(100..=50_000)
                                .speed(50.0)
                                .suffix(" kbit/s"),
                        )
                        .changed()
                    {
                        action = PropertiesAction::Changed;
                    }
                    ui.end_row();

                    ui.label("Remembered selections");
                    if ui
                        .add(egui::DragValue::new(&mut settings.max_rectangles).clamp_range(1..=50))
                        .changed()
                    {
                        settings.trim_rectangles();
                        action = PropertiesAction::Changed;
                    }
                    ui.end_row();

                    ui.label("Save folder");
                    if settings.last_save_path.is_empty() {
                        ui.label(egui::RichText::new("not set").italics().weak());
                    } else {
                        ui.label(&settings.last_save_path);
                    }
                    ui.end_row();
                });
        });

    if !window_open {
        *open = false;
        action = PropertiesAction::Close;
    }
    action
}
