//! 曲库管理窗口（上传/重命名/删除）

use egui::{RichText, Ui};

use crate::state::AppState;
use crate::ui::theme::MidiTheme;

pub struct ManageWindow;

impl ManageWindow {
    pub fn show(ctx: &egui::Context, state: &mut AppState) {
        let mut open = state.show_manager;

        egui::Window::new("Manage files")
            .open(&mut open)
            .default_width(420.0)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (text, color) = if state.is_logged_in() {
                        ("Logged in", MidiTheme::SUCCESS)
                    } else {
                        ("Not logged in: changes will be refused", MidiTheme::TEXT_MUTED)
                    };
                    ui.label(RichText::new(text).color(color).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if state.task_running {
                            ui.add(egui::Spinner::new());
                        }
                    });
                });

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                ui.add_enabled_ui(!state.task_running, |ui| {
                    if ui
                        .add_sized([ui.available_width(), 32.0], egui::Button::new("Upload .mid..."))
                        .clicked()
                    {
                        state.upload_dialog();
                    }

                    ui.add_space(12.0);
                    Self::selected_ui(ui, state);
                });
            });

        state.show_manager = open;
    }

    fn selected_ui(ui: &mut Ui, state: &mut AppState) {
        let Some(selected) = state.selected.clone() else {
            ui.label(
                RichText::new("Select a file in the library to rename or delete it")
                    .color(MidiTheme::TEXT_MUTED),
            );
            return;
        };

        ui.label(RichText::new("Selected").color(MidiTheme::TEXT_MUTED));
        ui.label(RichText::new(&selected).color(MidiTheme::TEXT_PRIMARY).strong());

        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut state.rename_to)
                    .hint_text("New name")
                    .desired_width(ui.available_width() - 90.0),
            );
            let new_name = state.rename_to.trim();
            let can_rename = !new_name.is_empty() && new_name != selected;
            ui.add_enabled_ui(can_rename, |ui| {
                if ui.add_sized([80.0, 24.0], egui::Button::new("Rename")).clicked() {
                    state.rename_selected();
                }
            });
        });

        ui.add_space(8.0);

        let delete = egui::Button::new(RichText::new("Delete").color(MidiTheme::DANGER));
        if ui.add_sized([ui.available_width(), 28.0], delete).clicked() {
            state.delete_selected();
        }
    }
}
