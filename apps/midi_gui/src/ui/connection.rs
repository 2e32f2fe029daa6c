//! 顶部连接栏：MIDI 端口、服务地址、登录

use egui::{RichText, Ui};

use crate::state::AppState;
use crate::ui::theme::MidiTheme;

pub struct ConnectionBar;

impl ConnectionBar {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Port").color(MidiTheme::TEXT_MUTED));

            let ports = state.available_ports.clone();
            egui::ComboBox::from_id_source("midi_port")
                .selected_text(state.port_name.as_str())
                .width(200.0)
                .show_ui(ui, |ui| {
                    if ports.is_empty() {
                        ui.label(RichText::new("No ports").color(MidiTheme::TEXT_MUTED));
                    }
                    for port in ports {
                        ui.selectable_value(&mut state.port_name, port.clone(), port);
                    }
                });

            if ui.button("⟳").on_hover_text("Rescan ports").clicked() {
                state.refresh_ports();
            }

            ui.separator();

            ui.label(RichText::new("Server").color(MidiTheme::TEXT_MUTED));
            let response = ui.add(
                egui::TextEdit::singleline(&mut state.api_url)
                    .hint_text("http://host:5000/midi_files")
                    .desired_width(260.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                state.refresh_catalog();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                Self::login(ui, state);
            });
        });
        ui.add_space(6.0);
    }

    fn login(ui: &mut Ui, state: &mut AppState) {
        if state.is_logged_in() {
            if ui.button("Log out").clicked() {
                state.logout();
            }
            ui.label(RichText::new("● Logged in").color(MidiTheme::SUCCESS));
            return;
        }

        ui.add_enabled_ui(!state.task_running && !state.password.is_empty(), |ui| {
            if ui.button("Log in").clicked() {
                state.login();
            }
        });
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.password)
                .password(true)
                .hint_text("Password")
                .desired_width(140.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            state.login();
        }
    }
}
