//! 侧边栏 - 远程曲库

use egui::{RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::theme::MidiTheme;

pub struct LibrarySidebar;

impl LibrarySidebar {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        egui::Frame::none()
            .fill(MidiTheme::BG_SURFACE)
            .inner_margin(egui::Margin::same(12.0))
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("Library")
                                .color(MidiTheme::TEXT_PRIMARY)
                                .size(18.0)
                                .strong(),
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("🛠").on_hover_text("Manage files").clicked() {
                                state.show_manager = true;
                            }
                            ui.add_enabled_ui(!state.catalog_loading, |ui| {
                                if ui.button("⟳").on_hover_text("Refresh").clicked() {
                                    state.refresh_catalog();
                                }
                            });
                            if state.catalog_loading {
                                ui.add(egui::Spinner::new());
                            }
                        });
                    });

                    ui.add_space(8.0);

                    ui.horizontal(|ui| {
                        ui.label("🔍");
                        ui.add(
                            egui::TextEdit::singleline(&mut state.search_query)
                                .hint_text("Filter...")
                                .desired_width(ui.available_width()),
                        );
                    });

                    ui.add_space(8.0);
                    ui.separator();

                    ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            Self::entries(ui, state);
                        });
                });
            });
    }

    fn entries(ui: &mut Ui, state: &mut AppState) {
        let entries = state.visible_entries();

        if entries.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(
                    RichText::new("No files")
                        .color(MidiTheme::TEXT_MUTED)
                        .size(14.0),
                );
                ui.add_space(6.0);
                ui.label(
                    RichText::new("Check the server address and refresh")
                        .color(MidiTheme::TEXT_MUTED)
                        .size(12.0),
                );
            });
            return;
        }

        let mut double_clicked = false;

        for name in entries {
            let is_selected = state.selected.as_deref() == Some(name.as_str());
            let is_playing = state.now_playing.as_deref() == Some(name.as_str());

            let mut text = RichText::new(&name).size(13.0);
            if is_playing {
                text = text.color(MidiTheme::ACCENT);
            }

            let response = ui.add_sized(
                [ui.available_width(), 22.0],
                egui::SelectableLabel::new(is_selected, text),
            );
            if response.clicked() {
                state.selected = Some(name.clone());
            }
            if response.double_clicked() {
                state.selected = Some(name);
                double_clicked = true;
            }
        }

        if double_clicked {
            state.play_selected();
        }
    }
}
