//! Line protocol spoken by the Grove GSR sketch.
//!
//! Inbound lines are one of:
//! - `DATA:<ms>,<raw>,<resistance>,<conductance>` for a sample,
//! - `HEADER...` for column/sync information (ignored),
//! - anything else, which is free-form diagnostic text from the firmware.
use log::warn;

use crate::drivers::error::FrameError;
use crate::types::{DeviceLine, Sample};

pub const DATA_TAG: &str = "DATA:";
pub const HEADER_TAG: &str = "HEADER";
const DATA_FIELDS: usize = 4;

/// Classifies one line that has already been stripped of its terminator.
pub fn parse_line(line: &str) -> Result<DeviceLine, FrameError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(DeviceLine::Empty);
    }
    if let Some(payload) = line.strip_prefix(DATA_TAG) {
        return parse_data(payload);
    }
    if line.starts_with(HEADER_TAG) {
        return Ok(DeviceLine::Header);
    }
    Ok(DeviceLine::Diagnostic(line.to_string()))
}

fn parse_data(payload: &str) -> Result<DeviceLine, FrameError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() != DATA_FIELDS {
        return Ok(DeviceLine::Truncated {
            fields: fields.len(),
        });
    }
    let millis: f64 = parse_field(fields[0], "timestamp")?;
    let raw: i64 = parse_field(fields[1], "raw")?;
    let resistance: f64 = parse_field(fields[2], "resistance")?;
    let conductance: f64 = parse_field(fields[3], "conductance")?;
    Ok(DeviceLine::Sample(Sample {
        time: millis / 1000.0,
        raw,
        resistance,
        conductance,
    }))
}

fn parse_field<T: std::str::FromStr>(text: &str, field: &'static str) -> Result<T, FrameError> {
    text.trim().parse().map_err(|_| FrameError {
        field,
        value: text.to_string(),
    })
}

/// Splits an unframed byte stream into complete text lines.
///
/// Bytes after the last `\n` are held until the terminator arrives. Invalid
/// UTF-8 is dropped rather than reported.
pub struct LineFramer {
    pending: Vec<u8>,
    max_line_len: usize,
}

impl LineFramer {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(256),
            max_line_len: max_line_len.max(1),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_lossy(&raw[..pos]));
        }
        if self.pending.len() > self.max_line_len {
            warn!(
                "discarding {} bytes of unterminated device output",
                self.pending.len()
            );
            self.pending.clear();
        }
        lines
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect::<String>()
        .trim()
        .to_string()
}
