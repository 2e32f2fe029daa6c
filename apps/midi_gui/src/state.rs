//! 应用状态

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use midi_catalog::{filter_entries, list_catalog_with, CatalogClient, CatalogConfig, CatalogError};
use midi_player::{
    OutputBackend, PlayRequest, PlaybackState, PlayerConfig, PlayerEvent, PlayerHandle,
    StopReason, TrackSource,
};

/// 状态栏消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub ok: bool,
    pub message: String,
}

impl Notice {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// 已提交但尚未收到 Finished 的播放会话数
///
/// 下载期间引擎还没有进入 Playing，UI 靠它继续刷新并允许停止。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PendingSessions(usize);

impl PendingSessions {
    fn started(&mut self) {
        self.0 += 1;
    }

    fn finished(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    fn any(&self) -> bool {
        self.0 > 0
    }
}

/// 曲库后台任务的结果
#[derive(Debug)]
enum CatalogEvent {
    Listed(Vec<String>),
    LoggedIn(Result<String, CatalogError>),
    Finished {
        action: &'static str,
        result: Result<(), CatalogError>,
    },
}

/// 应用状态
pub struct AppState {
    // 连接配置
    pub port_name: String,
    pub api_url: String,
    pub available_ports: Vec<String>,
    pub password: String,
    token: Option<String>,

    // 播放状态
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
    pub now_playing: Option<String>,
    pending_play: PendingSessions,

    // 曲库
    catalog: Vec<String>,
    pub search_query: String,
    pub selected: Option<String>,
    pub catalog_loading: bool,

    // 管理窗口
    pub show_manager: bool,
    pub rename_to: String,
    pub task_running: bool,
    pub notice: Option<Notice>,

    player: PlayerHandle,
    backend: Arc<dyn OutputBackend>,
    catalog_config: CatalogConfig,

    catalog_evt_tx: Sender<CatalogEvent>,
    catalog_evt_rx: Receiver<CatalogEvent>,
}

impl AppState {
    pub fn new(
        player: PlayerHandle,
        backend: Arc<dyn OutputBackend>,
        player_config: &PlayerConfig,
        catalog_config: CatalogConfig,
    ) -> Self {
        let (catalog_evt_tx, catalog_evt_rx) = crossbeam_channel::bounded(16);
        let mut state = Self {
            port_name: player_config.port_name.clone(),
            api_url: catalog_config.api_url.clone(),
            available_ports: Vec::new(),
            password: String::new(),
            token: catalog_config.token.clone(),
            is_playing: false,
            position: 0.0,
            duration: 0.0,
            now_playing: None,
            pending_play: PendingSessions::default(),
            catalog: Vec::new(),
            search_query: String::new(),
            selected: None,
            catalog_loading: false,
            show_manager: false,
            rename_to: String::new(),
            task_running: false,
            notice: None,
            player,
            backend,
            catalog_config,
            catalog_evt_tx,
            catalog_evt_rx,
        };
        state.refresh_ports();
        state.refresh_catalog();
        state
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// 正在下载或播放
    pub fn is_busy(&self) -> bool {
        self.is_playing || self.pending_play.any()
    }

    /// 当前搜索条件下可见的文件
    pub fn visible_entries(&self) -> Vec<String> {
        filter_entries(self.catalog.clone(), &self.search_query)
    }

    /// 处理播放引擎事件
    pub fn poll_events(&mut self) {
        let events: Vec<_> = self.player.evt_rx.try_iter().collect();

        for event in events {
            match event {
                PlayerEvent::StateChanged(state) => {
                    self.is_playing = state == PlaybackState::Playing;
                }
                PlayerEvent::Progress(progress) => {
                    if progress.is_idle() {
                        self.position = 0.0;
                        self.duration = 0.0;
                    } else {
                        self.position = progress.elapsed.as_secs_f64();
                        self.duration = progress.total.as_secs_f64();
                    }
                }
                PlayerEvent::TrackInfo(info) => {
                    self.duration = info.duration.as_secs_f64();
                    self.now_playing = Some(info.label);
                }
                PlayerEvent::Finished(reason) => {
                    self.pending_play.finished();
                    if reason != StopReason::Cancelled {
                        self.now_playing = None;
                    }
                }
                PlayerEvent::Error(e) => {
                    self.notice = Some(Notice::error(format!("Playback failed: {}", e)));
                }
            }
        }
    }

    /// 处理曲库后台任务事件
    pub fn poll_catalog_events(&mut self) {
        let events: Vec<_> = self.catalog_evt_rx.try_iter().collect();
        let mut should_refresh = false;

        for event in events {
            match event {
                CatalogEvent::Listed(entries) => {
                    self.catalog_loading = false;
                    if let Some(selected) = &self.selected {
                        if !entries.contains(selected) {
                            self.selected = None;
                        }
                    }
                    self.catalog = entries;
                }
                CatalogEvent::LoggedIn(result) => {
                    self.task_running = false;
                    match result {
                        Ok(token) => {
                            self.token = Some(token);
                            self.password.clear();
                            self.notice = Some(Notice::ok("Logged in"));
                        }
                        Err(e) => {
                            self.notice = Some(notice_for("Login", &Err(e)).0);
                        }
                    }
                }
                CatalogEvent::Finished { action, result } => {
                    self.task_running = false;
                    let (notice, refresh) = notice_for(action, &result);
                    self.notice = Some(notice);
                    should_refresh |= refresh;
                }
            }
        }

        if should_refresh {
            self.refresh_catalog();
        }
    }

    fn current_catalog_config(&self) -> CatalogConfig {
        let mut config = self.catalog_config.clone();
        config.api_url = self.api_url.trim().to_string();
        config.token = self.token.clone();
        config
    }

    pub fn refresh_ports(&mut self) {
        match self.backend.port_names() {
            Ok(ports) => self.available_ports = ports,
            Err(e) => {
                log::warn!("Failed to enumerate MIDI ports: {}", e);
                self.available_ports.clear();
            }
        }
    }

    pub fn refresh_catalog(&mut self) {
        if self.catalog_loading {
            return;
        }
        self.catalog_loading = true;

        let config = self.current_catalog_config();
        let tx = self.catalog_evt_tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(CatalogEvent::Listed(list_catalog_with(&config, "")));
        });
    }

    pub fn play_selected(&mut self) {
        let Some(name) = self.selected.clone() else {
            self.notice = Some(Notice::error("Select a file first"));
            return;
        };

        let url = CatalogClient::new(&self.current_catalog_config())
            .and_then(|client| client.file_url(&name));
        match url {
            Ok(url) => self.play(TrackSource::Remote(url.to_string())),
            Err(e) => self.notice = Some(Notice::error(e.to_string())),
        }
    }

    pub fn play_local_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("MIDI", &["mid", "midi"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.play(TrackSource::Local(path));
        }
    }

    fn play(&mut self, source: TrackSource) {
        self.now_playing = Some(source.label());
        self.position = 0.0;
        self.pending_play.started();
        self.player
            .play(PlayRequest::new(source, self.port_name.trim()));
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    pub fn login(&mut self) {
        if self.task_running || self.password.is_empty() {
            return;
        }
        self.task_running = true;

        let config = self.current_catalog_config();
        let password = self.password.clone();
        let tx = self.catalog_evt_tx.clone();
        std::thread::spawn(move || {
            let result = CatalogClient::new(&config).and_then(|mut client| client.login(&password));
            let _ = tx.send(CatalogEvent::LoggedIn(result));
        });
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.notice = Some(Notice::ok("Logged out"));
    }

    pub fn upload_dialog(&mut self) {
        if self.task_running {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("MIDI", &["mid", "midi"])
            .pick_file()
        else {
            return;
        };

        self.run_task("Upload", move |client| client.upload(&path));
    }

    pub fn rename_selected(&mut self) {
        let Some(old_name) = self.selected.clone() else {
            self.notice = Some(Notice::error("Select a file first"));
            return;
        };
        let new_name = self.rename_to.trim().to_string();
        if new_name.is_empty() || new_name == old_name {
            return;
        }

        self.rename_to.clear();
        self.run_task("Rename", move |client| client.rename(&old_name, &new_name));
    }

    pub fn delete_selected(&mut self) {
        let Some(name) = self.selected.clone() else {
            self.notice = Some(Notice::error("Select a file first"));
            return;
        };

        self.run_task("Delete", move |client| client.delete(&name));
    }

    fn run_task<F>(&mut self, action: &'static str, task: F)
    where
        F: FnOnce(&CatalogClient) -> Result<(), CatalogError> + Send + 'static,
    {
        if self.task_running {
            return;
        }
        self.task_running = true;
        self.notice = Some(Notice::ok(format!("{}...", action)));

        let config = self.current_catalog_config();
        let tx = self.catalog_evt_tx.clone();
        std::thread::spawn(move || {
            let result = CatalogClient::new(&config).and_then(|client| task(&client));
            let _ = tx.send(CatalogEvent::Finished { action, result });
        });
    }
}

/// 操作结果 -> (状态栏消息, 是否刷新列表)
fn notice_for(action: &str, result: &Result<(), CatalogError>) -> (Notice, bool) {
    match result {
        Ok(()) => (Notice::ok(format!("{} succeeded", action)), true),
        Err(CatalogError::Forbidden) => (
            Notice::error(format!("{} forbidden: log in first", action)),
            false,
        ),
        Err(CatalogError::Status(code)) => (
            Notice::error(format!("{} failed (status {})", action, code)),
            false,
        ),
        Err(e) => (Notice::error(format!("{} failed: {}", action, e)), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_sessions() {
        let mut pending = PendingSessions::default();
        assert!(!pending.any());

        // 连续两次播放：第一个会话被取消后第二个仍在等待
        pending.started();
        pending.started();
        pending.finished();
        assert!(pending.any());
        pending.finished();
        assert!(!pending.any());

        pending.finished();
        assert_eq!(pending, PendingSessions(0));
    }

    #[test]
    fn test_success_refreshes() {
        let (notice, refresh) = notice_for("Rename", &Ok(()));
        assert!(notice.ok);
        assert!(refresh);
    }

    #[test]
    fn test_forbidden_does_not_refresh() {
        let (notice, refresh) = notice_for("Delete", &Err(CatalogError::Forbidden));
        assert!(!notice.ok);
        assert!(notice.message.contains("forbidden"));
        assert!(!refresh);
    }

    #[test]
    fn test_server_error_carries_status() {
        let (notice, refresh) = notice_for("Upload", &Err(CatalogError::Status(500)));
        assert!(!notice.ok);
        assert!(notice.message.contains("500"));
        assert!(!refresh);
    }
}
