//! midi_player - MIDI 播放引擎
//!
//! 获取 MIDI 文件（本地或远程）、解码为带时间戳的消息序列，
//! 并实时发送到指定的 MIDI 输出端口。

mod command;
mod config;
mod decoder;
mod engine;
mod output;
mod session;
mod source;

#[cfg(test)]
mod test_server;

pub use command::*;
pub use config::*;
pub use decoder::*;
pub use engine::*;
pub use output::*;
pub use session::*;
pub use source::*;
