//! MIDI 输出
//!
//! 使用 midir 打开系统 MIDI 输出端口

use midir::{MidiOutput, MidiOutputConnection};

/// MIDI 输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("MIDI backend unavailable: {0}")]
    Init(String),
    #[error("MIDI output port not found: {0}")]
    PortNotFound(String),
    #[error("Failed to connect to port: {0}")]
    Connect(String),
    #[error("Send error: {0}")]
    Send(String),
}

/// 已打开的输出端口，drop 时释放
pub trait MidiSink {
    fn send(&mut self, message: &[u8]) -> Result<(), OutputError>;

    /// 在全部 16 个通道上发送 All Notes Off (CC 123)
    fn all_notes_off(&mut self) -> Result<(), OutputError> {
        for channel in 0..16u8 {
            self.send(&[0xB0 | channel, 123, 0])?;
        }
        Ok(())
    }
}

/// 按名称打开输出端口
pub trait OutputBackend: Send + Sync {
    fn port_names(&self) -> Result<Vec<String>, OutputError>;

    fn open(&self, port_name: &str) -> Result<Box<dyn MidiSink>, OutputError>;
}

/// 系统 MIDI 后端
#[derive(Debug, Clone)]
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn midi_output(&self) -> Result<MidiOutput, OutputError> {
        MidiOutput::new(&self.client_name).map_err(|e| OutputError::Init(e.to_string()))
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        Self::new("midi-remote")
    }
}

impl OutputBackend for MidirBackend {
    fn port_names(&self) -> Result<Vec<String>, OutputError> {
        let midi_out = self.midi_output()?;
        let names = midi_out
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| {
                midi_out
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Port {}", index))
            })
            .collect();
        Ok(names)
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn MidiSink>, OutputError> {
        let midi_out = self.midi_output()?;
        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_out.port_name(port).unwrap_or_default())
            .collect();

        let index = resolve_port(&names, port_name)
            .ok_or_else(|| OutputError::PortNotFound(port_name.to_string()))?;

        log::debug!("Resolved MIDI port '{}' -> '{}'", port_name, names[index]);

        let connection = midi_out
            .connect(&ports[index], &self.client_name)
            .map_err(|e| OutputError::Connect(e.to_string()))?;

        log::info!("Opened MIDI output: {}", names[index]);

        Ok(Box::new(MidirSink {
            connection: Some(connection),
            name: names[index].clone(),
        }))
    }
}

/// 先精确匹配，再按前缀匹配（部分平台会在端口名后追加序号）
pub fn resolve_port(names: &[String], wanted: &str) -> Option<usize> {
    names
        .iter()
        .position(|name| name == wanted)
        .or_else(|| names.iter().position(|name| name.starts_with(wanted)))
}

struct MidirSink {
    connection: Option<MidiOutputConnection>,
    name: String,
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: &[u8]) -> Result<(), OutputError> {
        match self.connection.as_mut() {
            Some(conn) => conn
                .send(message)
                .map_err(|e| OutputError::Send(e.to_string())),
            None => Err(OutputError::Send("port closed".to_string())),
        }
    }
}

impl Drop for MidirSink {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            log::info!("Closed MIDI output: {}", self.name);
        }
    }
}
