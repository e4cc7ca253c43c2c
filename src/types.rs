// src/types.rs
use std::fmt;

/// One GSR reading as reported by the device.
///
/// `time` is the device clock in seconds, before any normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub raw: i64,
    pub resistance: f64,
    pub conductance: f64,
}

/// Classification of a single line received from the device.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceLine {
    Empty,
    // 设备同步/注释行, 丢弃
    Header,
    Sample(Sample),
    /// `DATA:` frame with the wrong number of fields.
    Truncated { fields: usize },
    // 设备的调试/提示信息
    Diagnostic(String),
}

// 录制会话状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    Recording,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Connected => "connected",
            SessionState::Recording => "recording",
        };
        f.write_str(label)
    }
}

// 设备命令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceCommand {
    Start,
    Stop,
}

impl DeviceCommand {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            DeviceCommand::Start => b"START\n",
            DeviceCommand::Stop => b"STOP\n",
        }
    }
}
