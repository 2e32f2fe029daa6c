//! MIDI 解码器
//!
//! 使用 midly 解析标准 MIDI 文件，合并所有轨道并按速度表换算为绝对时间。

use std::time::Duration;

use midly::live::LiveEvent;
use midly::{Format, MetaMessage, Smf, Timing, TrackEventKind};

/// 标准 MIDI 默认速度：120 BPM
const DEFAULT_TEMPO_US: u32 = 500_000;

/// 解码器错误
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Malformed MIDI data: {0}")]
    Parse(#[from] midly::Error),
    #[error("Unsupported MIDI format: {0}")]
    UnsupportedFormat(&'static str),
    #[error("Invalid timing division")]
    InvalidTiming,
    #[error("Encode error: {0}")]
    Encode(#[from] std::io::Error),
}

/// 一条待发送的 MIDI 消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedMessage {
    /// 相对于播放开始的偏移
    pub at: Duration,
    /// 原始字节（状态字节 + 数据）
    pub bytes: Vec<u8>,
}

/// 解码后的曲目，不可变
#[derive(Debug, Clone)]
pub struct Track {
    messages: Vec<TimedMessage>,
    duration: Duration,
    format: &'static str,
}

impl Track {
    /// 从 SMF 字节解码
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let smf = Smf::parse(data)?;

        let format = match smf.header.format {
            Format::SingleTrack => "single-track",
            Format::Parallel => "parallel",
            // 各轨道互相独立，没有统一的时间线
            Format::Sequential => return Err(DecodeError::UnsupportedFormat("sequential")),
        };

        let clock = TickClock::new(smf.header.timing)?;

        // 各轨道换算成绝对 tick 后稳定排序，同一 tick 保持轨道顺序
        let mut merged: Vec<(u64, &TrackEventKind)> = Vec::new();
        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += u64::from(event.delta.as_int());
                merged.push((tick, &event.kind));
            }
        }
        merged.sort_by_key(|(tick, _)| *tick);

        let mut messages = Vec::new();
        let mut tempo = DEFAULT_TEMPO_US;
        let mut last_tick = 0u64;
        let mut seconds = 0f64;

        for (tick, kind) in merged {
            seconds += clock.seconds(tick - last_tick, tempo);
            last_tick = tick;

            match kind {
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => {
                    tempo = t.as_int();
                }
                TrackEventKind::Midi { channel, message } => {
                    let mut bytes = Vec::with_capacity(3);
                    LiveEvent::Midi {
                        channel: *channel,
                        message: *message,
                    }
                    .write_std(&mut bytes)?;
                    messages.push(TimedMessage {
                        at: Duration::from_secs_f64(seconds),
                        bytes,
                    });
                }
                TrackEventKind::SysEx(data) => {
                    let mut bytes = Vec::with_capacity(data.len() + 2);
                    bytes.push(0xF0);
                    bytes.extend_from_slice(data);
                    if bytes.last() != Some(&0xF7) {
                        bytes.push(0xF7);
                    }
                    messages.push(TimedMessage {
                        at: Duration::from_secs_f64(seconds),
                        bytes,
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            messages,
            duration: Duration::from_secs_f64(seconds),
            format,
        })
    }

    pub fn messages(&self) -> &[TimedMessage] {
        &self.messages
    }

    /// 总时长（包含末尾的 meta 事件）
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn format(&self) -> &'static str {
        self.format
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// tick -> 秒
enum TickClock {
    /// 每四分音符 tick 数，受速度事件影响
    Metrical(f64),
    /// SMPTE：每 tick 固定秒数
    Timecode(f64),
}

impl TickClock {
    fn new(timing: Timing) -> Result<Self, DecodeError> {
        match timing {
            Timing::Metrical(ppq) => {
                let ppq = ppq.as_int();
                if ppq == 0 {
                    return Err(DecodeError::InvalidTiming);
                }
                Ok(TickClock::Metrical(f64::from(ppq)))
            }
            Timing::Timecode(fps, subframes) => {
                let ticks_per_second = f64::from(fps.as_f32()) * f64::from(subframes);
                if ticks_per_second <= 0.0 {
                    return Err(DecodeError::InvalidTiming);
                }
                Ok(TickClock::Timecode(1.0 / ticks_per_second))
            }
        }
    }

    fn seconds(&self, ticks: u64, tempo_us: u32) -> f64 {
        if ticks == 0 {
            return 0.0;
        }
        match self {
            TickClock::Metrical(ppq) => ticks as f64 * f64::from(tempo_us) / 1_000_000.0 / ppq,
            TickClock::Timecode(per_tick) => ticks as f64 * per_tick,
        }
    }
}

/// 测试用的 SMF 构造工具
#[cfg(test)]
pub(crate) mod testing {
    /// (delta tick, 事件字节)
    pub type RawEvent = (u32, Vec<u8>);

    pub fn vlq(mut value: u32) -> Vec<u8> {
        let mut out = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            out.insert(0, ((value & 0x7F) as u8) | 0x80);
            value >>= 7;
        }
        out
    }

    pub fn track_chunk(events: &[RawEvent]) -> Vec<u8> {
        let mut body = Vec::new();
        for (delta, bytes) in events {
            body.extend(vlq(*delta));
            body.extend_from_slice(bytes);
        }
        // End of Track
        body.extend([0x00, 0xFF, 0x2F, 0x00]);

        let mut chunk = b"MTrk".to_vec();
        chunk.extend((body.len() as u32).to_be_bytes());
        chunk.extend(body);
        chunk
    }

    pub fn smf(format: u16, division: u16, tracks: &[Vec<RawEvent>]) -> Vec<u8> {
        let mut data = b"MThd".to_vec();
        data.extend(6u32.to_be_bytes());
        data.extend(format.to_be_bytes());
        data.extend((tracks.len() as u16).to_be_bytes());
        data.extend(division.to_be_bytes());
        for events in tracks {
            data.extend(track_chunk(events));
        }
        data
    }

    pub fn note_on(key: u8) -> Vec<u8> {
        vec![0x90, key, 0x64]
    }

    pub fn note_off(key: u8) -> Vec<u8> {
        vec![0x80, key, 0x40]
    }

    pub fn tempo(us_per_quarter: u32) -> Vec<u8> {
        let b = us_per_quarter.to_be_bytes();
        vec![0xFF, 0x51, 0x03, b[1], b[2], b[3]]
    }

    /// 单轨，`count` 个音符，每个间隔 `gap` tick
    pub fn scale(count: u8, gap: u32, division: u16) -> Vec<u8> {
        let events: Vec<RawEvent> = (0..count)
            .map(|i| (if i == 0 { 0 } else { gap }, note_on(60 + i)))
            .collect();
        smf(0, division, &[events])
    }
}
