// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Recording HUD shown below the selection while a video is captured.

use std::time::Duration;

/// Gap between the selection and the HUD, in points.
const HUD_OFFSET: f32 = 10.0;

/// Result of HUD interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingAction {
    None,
    Stop,
}

/// Elapsed recording time with 0.1 s resolution.
pub fn format_elapsed(elapsed: Duration) -> String {
    let tenths = elapsed.as_millis() / 100;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Display the HUD. `selection` is the recorded region in points.
pub fn show(ctx: &egui::Context, selection: egui::Rect, elapsed: Duration) -> RecordingAction {
    let mut action = RecordingAction::None;
    let screen = ctx.screen_rect();

    // Flip above the selection when there is no room below it.
    let mut pos = egui::pos2(selection.min.x, selection.max.y + HUD_OFFSET);
    if pos.y + 40.0 > screen.max.y {
        pos.y = (selection.min.y - HUD_OFFSET - 40.0).max(screen.min.y);
    }

    egui::Area::new(egui::Id::new("recording_hud"))
        .fixed_pos(pos)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("⏺").color(egui::Color32::RED));
                    ui.monospace(format_elapsed(elapsed));
                    if ui.button("⏹").on_hover_text("Stop recording (Esc)").clicked() {
                        action = RecordingAction::Stop;
                    }
                });
            });
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0.0");
        assert_eq!(format_elapsed(Duration::from_millis(1_290)), "1.2");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "75.0");
    }
}
