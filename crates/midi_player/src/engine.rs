//! 播放引擎
//!
//! 引擎线程接收命令并管理会话；每个会话在独立的工作线程中
//! 下载、解码并按时间发送消息。同一时刻最多一个会话。

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::{
    CancelToken, DecodeError, MidiSink, MidirBackend, OutputBackend, OutputError, PlayRequest,
    PlaybackState, PlayerCommand, PlayerConfig, PlayerEvent, Progress, SharedStatus, SourceError,
    StopReason, Track, TrackInfo,
};

/// 会话内的错误，在工作线程边界被捕获
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Failed to fetch: {0}")]
    Source(#[from] SourceError),
    #[error("Failed to decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("MIDI output error: {0}")]
    Output(#[from] OutputError),
}

/// 播放引擎句柄
pub struct PlayerHandle {
    pub cmd_tx: Sender<PlayerCommand>,
    pub evt_rx: Receiver<PlayerEvent>,
    status: SharedStatus,
    engine: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// 开始播放；立即返回
    pub fn play(&self, request: PlayRequest) {
        self.send(PlayerCommand::Play(request));
    }

    /// 请求停止当前会话；不等待
    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    pub fn state(&self) -> PlaybackState {
        self.status.get()
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    /// 停止引擎并等待当前会话结束
    pub fn shutdown(mut self) {
        self.send(PlayerCommand::Shutdown);
        if let Some(engine) = self.engine.take() {
            if engine.join().is_err() {
                log::error!("Player engine thread panicked");
            }
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("Player engine is not running");
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        if self.engine.is_some() {
            let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
        }
    }
}

/// 启动播放引擎
pub fn spawn_player(backend: Arc<dyn OutputBackend>, config: PlayerConfig) -> PlayerHandle {
    let (cmd_tx, cmd_rx) = bounded(32);
    let (evt_tx, evt_rx) = unbounded();
    let status = SharedStatus::default();

    let state = EngineState::new(backend, config, evt_tx, status.clone());
    let engine = thread::spawn(move || {
        run_engine(cmd_rx, state);
    });

    PlayerHandle {
        cmd_tx,
        evt_rx,
        status,
        engine: Some(engine),
    }
}

/// 使用系统 MIDI 后端启动播放引擎
pub fn spawn_default_player(config: PlayerConfig) -> PlayerHandle {
    let backend = Arc::new(MidirBackend::new(config.client_name.clone()));
    spawn_player(backend, config)
}

fn run_engine(cmd_rx: Receiver<PlayerCommand>, mut state: EngineState) {
    let _ = state
        .evt_tx
        .send(PlayerEvent::StateChanged(PlaybackState::Idle));

    while let Ok(cmd) = cmd_rx.recv() {
        if !state.handle_command(cmd) {
            break;
        }
    }

    state.end_session();
}

struct EngineState {
    backend: Arc<dyn OutputBackend>,
    config: PlayerConfig,
    evt_tx: Sender<PlayerEvent>,
    status: SharedStatus,
    session: Option<Session>,
}

struct Session {
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

impl EngineState {
    fn new(
        backend: Arc<dyn OutputBackend>,
        config: PlayerConfig,
        evt_tx: Sender<PlayerEvent>,
        status: SharedStatus,
    ) -> Self {
        Self {
            backend,
            config,
            evt_tx,
            status,
            session: None,
        }
    }

    fn handle_command(&mut self, cmd: PlayerCommand) -> bool {
        match cmd {
            PlayerCommand::Play(request) => {
                self.end_session();
                self.start_session(request);
            }
            PlayerCommand::Stop => {
                if let Some(session) = &self.session {
                    session.cancel.cancel();
                }
            }
            PlayerCommand::Shutdown => {
                return false;
            }
        }
        true
    }

    fn start_session(&mut self, request: PlayRequest) {
        let cancel = CancelToken::new();
        let worker = SessionWorker {
            request,
            backend: self.backend.clone(),
            config: self.config.clone(),
            evt_tx: self.evt_tx.clone(),
            status: self.status.clone(),
            cancel: cancel.clone(),
        };

        let worker = thread::spawn(move || worker.run());
        self.session = Some(Session { cancel, worker });
    }

    /// 取消并等待上一个会话释放端口
    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            if session.worker.join().is_err() {
                log::error!("Playback worker panicked");
                self.status.set(PlaybackState::Idle);
            }
        }
    }
}

struct SessionWorker {
    request: PlayRequest,
    backend: Arc<dyn OutputBackend>,
    config: PlayerConfig,
    evt_tx: Sender<PlayerEvent>,
    status: SharedStatus,
    cancel: CancelToken,
}

impl SessionWorker {
    fn run(self) {
        let label = self.request.source.label();
        log::info!("Starting playback: {}", self.request.source);

        let reason = match self.play() {
            Ok(reason) => reason,
            Err(e) => {
                log::error!("Playback of {} failed: {}", label, e);
                let _ = self.evt_tx.send(PlayerEvent::Error(e.to_string()));
                StopReason::Failed
            }
        };

        // 此时端口已释放
        if self.status.is_playing() {
            self.status.set(PlaybackState::Idle);
            let _ = self
                .evt_tx
                .send(PlayerEvent::StateChanged(PlaybackState::Idle));
        }
        if self.request.report_progress {
            let _ = self.evt_tx.send(PlayerEvent::Progress(Progress::IDLE));
        }
        let _ = self.evt_tx.send(PlayerEvent::Finished(reason));

        log::info!("Playback of {} ended: {:?}", label, reason);
    }

    fn play(&self) -> Result<StopReason, PlayerError> {
        let data = self.request.source.fetch(&self.config)?;
        if self.cancel.is_cancelled() {
            return Ok(StopReason::Cancelled);
        }

        let track = Track::decode(&data)?;
        let _ = self.evt_tx.send(PlayerEvent::TrackInfo(TrackInfo {
            label: self.request.source.label(),
            format: track.format().to_string(),
            message_count: track.len(),
            duration: track.duration(),
        }));

        let mut sink = self.backend.open(&self.request.port_name)?;

        self.status.set(PlaybackState::Playing);
        let _ = self
            .evt_tx
            .send(PlayerEvent::StateChanged(PlaybackState::Playing));

        let result = self.stream(&track, sink.as_mut());

        if matches!(result, Ok(StopReason::Cancelled)) && self.config.reset_on_stop {
            if let Err(e) = sink.all_notes_off() {
                log::warn!("All notes off failed: {}", e);
            }
        }

        result
    }

    fn stream(&self, track: &Track, sink: &mut dyn MidiSink) -> Result<StopReason, PlayerError> {
        let start = Instant::now();
        let total = track.duration();

        for message in track.messages() {
            // wait_until 在返回 true 之前检查过取消标志
            if !self.cancel.wait_until(start + message.at) {
                return Ok(StopReason::Cancelled);
            }

            sink.send(&message.bytes)?;
            log::trace!("-> {:02X?}", message.bytes);

            if self.request.report_progress {
                let _ = self.evt_tx.send(PlayerEvent::Progress(Progress {
                    elapsed: start.elapsed(),
                    total,
                }));
            }
        }

        // 末尾的 meta 事件也计入时长
        if !self.cancel.wait_until(start + total) {
            return Ok(StopReason::Cancelled);
        }

        Ok(StopReason::Completed)
    }
}
