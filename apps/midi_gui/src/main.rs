//! MIDI Remote GUI

mod state;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use midi_catalog::CatalogConfig;
use midi_player::{spawn_player, MidirBackend, OutputBackend, PlayerConfig};

use state::AppState;
use ui::{ConnectionBar, LibrarySidebar, ManageWindow, MidiTheme, PlayerDeck};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("MIDI Remote"),
        ..Default::default()
    };

    eframe::run_native(
        "MIDI Remote",
        options,
        Box::new(|cc| {
            MidiTheme::apply(&cc.egui_ctx);

            let player_config = PlayerConfig::from_env();
            let backend: Arc<dyn OutputBackend> =
                Arc::new(MidirBackend::new(player_config.client_name.clone()));
            let handle = spawn_player(backend.clone(), player_config.clone());
            log::info!("Player engine started");

            let state = AppState::new(handle, backend, &player_config, CatalogConfig::from_env());
            Ok(Box::new(MidiRemoteApp { state }))
        }),
    )
}

struct MidiRemoteApp {
    state: AppState,
}

impl eframe::App for MidiRemoteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();
        self.state.poll_catalog_events();

        egui::TopBottomPanel::top("connection").show(ctx, |ui| {
            ConnectionBar::show(ui, &mut self.state);
        });

        egui::TopBottomPanel::bottom("player_deck")
            .resizable(false)
            .show(ctx, |ui| {
                PlayerDeck::show(ui, &mut self.state);
                Self::notice(ui, &self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            LibrarySidebar::show(ui, &mut self.state);
        });

        if self.state.show_manager {
            ManageWindow::show(ctx, &mut self.state);
        }

        // 下载、播放或后台任务未完成时持续刷新
        if self.state.is_busy() || self.state.catalog_loading || self.state.task_running {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl MidiRemoteApp {
    fn notice(ui: &mut egui::Ui, state: &AppState) {
        let Some(notice) = &state.notice else {
            return;
        };
        let color = if notice.ok {
            MidiTheme::SUCCESS
        } else {
            MidiTheme::DANGER
        };
        ui.label(egui::RichText::new(&notice.message).color(color).size(12.0));
        ui.add_space(4.0);
    }
}
