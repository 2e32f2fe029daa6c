//! 底部播放控制栏

use egui::{Align, Layout, RichText, Ui};

use crate::state::AppState;
use crate::ui::theme::MidiTheme;

pub struct PlayerDeck;

impl PlayerDeck {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        egui::Frame::none()
            .fill(MidiTheme::BG_SURFACE)
            .inner_margin(egui::Margin::symmetric(16.0, 10.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                ui.horizontal(|ui| {
                    Self::transport(ui, state);
                    ui.add_space(12.0);
                    Self::track_info(ui, state);
                });

                ui.add_space(6.0);
                Self::progress(ui, state);
            });
    }

    fn transport(ui: &mut Ui, state: &mut AppState) {
        ui.add_enabled_ui(state.selected.is_some(), |ui| {
            if ui
                .add(egui::Button::new(RichText::new("▶").size(20.0)))
                .on_hover_text("Play selected")
                .clicked()
            {
                state.play_selected();
            }
        });

        ui.add_enabled_ui(state.is_busy(), |ui| {
            if ui
                .add(egui::Button::new(RichText::new("⏹").size(20.0)))
                .on_hover_text("Stop")
                .clicked()
            {
                state.stop();
            }
        });

        if ui.button("📂").on_hover_text("Play local file").clicked() {
            state.play_local_dialog();
        }
    }

    fn track_info(ui: &mut Ui, state: &AppState) {
        ui.vertical(|ui| match &state.now_playing {
            Some(label) => {
                ui.label(
                    RichText::new(label)
                        .color(MidiTheme::TEXT_PRIMARY)
                        .size(14.0),
                );
                ui.label(
                    RichText::new(format!("→ {}", state.port_name))
                        .color(MidiTheme::TEXT_MUTED)
                        .size(11.0),
                );
            }
            None => {
                ui.label(
                    RichText::new("Nothing playing")
                        .color(MidiTheme::TEXT_MUTED)
                        .size(14.0),
                );
            }
        });
    }

    fn progress(ui: &mut Ui, state: &AppState) {
        let fraction = if state.duration > 0.0 {
            (state.position / state.duration).clamp(0.0, 1.0) as f32
        } else {
            0.0
        };

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format_duration(state.position))
                    .color(MidiTheme::TEXT_MUTED)
                    .size(11.0),
            );

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(format_duration(state.duration))
                        .color(MidiTheme::TEXT_MUTED)
                        .size(11.0),
                );
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .desired_height(6.0)
                        .fill(MidiTheme::ACCENT),
                );
            });
        });
    }
}

fn format_duration(secs: f64) -> String {
    let secs = secs.max(0.0);
    format!("{:02}:{:02}", (secs / 60.0) as u32, (secs % 60.0) as u32)
}
