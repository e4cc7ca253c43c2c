// src/session.rs
use std::thread;

use log::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::drivers::{parse_line, DeviceLink, GsrError, LineFramer, SampleBuffer, SerialLink};
use crate::types::{DeviceCommand, DeviceLine, SessionState};

/// One device connection and the recording made over it.
///
/// The session is the only owner of the link. Dropping it releases the link,
/// sending `STOP` first if a recording is still running.
pub struct RecordingSession<L: DeviceLink> {
    link: Option<L>,
    port_name: String,
    state: SessionState,
    framer: LineFramer,
    buffer: Option<SampleBuffer>,
    progress_every: usize,
}

impl<L: DeviceLink> RecordingSession<L> {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            link: None,
            port_name: String::new(),
            state: SessionState::Idle,
            framer: LineFramer::new(config.max_line_len),
            buffer: None,
            progress_every: config.progress_every,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Samples of the current (or last) recording.
    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    #[cfg(test)]
    pub fn link(&self) -> Option<&L> {
        self.link.as_ref()
    }

    /// Takes ownership of an opened link, waits for the device to settle and
    /// logs whatever banner it printed.
    pub fn attach(
        &mut self,
        link: L,
        port_name: &str,
        config: &CollectorConfig,
    ) -> Result<(), GsrError> {
        if self.state != SessionState::Idle {
            return Err(GsrError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }
        self.link = Some(link);
        self.port_name = port_name.to_string();
        self.state = SessionState::Connected;
        info!("connected to {port_name}");
        let settle = config.settle_delay();
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        if let Err(e) = self.drain() {
            self.close();
            return Err(e);
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), GsrError> {
        match self.state {
            SessionState::Idle => return Err(GsrError::NotConnected),
            SessionState::Recording => {
                return Err(GsrError::InvalidState {
                    operation: "start",
                    state: self.state,
                })
            }
            SessionState::Connected => {}
        }
        self.buffer = Some(SampleBuffer::new());
        self.send(DeviceCommand::Start)?;
        self.state = SessionState::Recording;
        info!("recording started");
        Ok(())
    }

    /// Sends `STOP`. Frames already in flight still arrive; call [`drain`]
    /// once more after a short grace delay to keep them.
    ///
    /// [`drain`]: RecordingSession::drain
    pub fn stop(&mut self) -> Result<(), GsrError> {
        match self.state {
            SessionState::Idle => return Err(GsrError::NotConnected),
            SessionState::Connected => {
                return Err(GsrError::InvalidState {
                    operation: "stop",
                    state: self.state,
                })
            }
            SessionState::Recording => {}
        }
        // leave Recording even if the write fails; the device is unreachable anyway
        self.state = SessionState::Connected;
        self.send(DeviceCommand::Stop)?;
        info!("recording stopped");
        Ok(())
    }

    /// Reads whatever the link has buffered and returns how many samples were
    /// appended. Bad frames are logged and skipped.
    pub fn drain(&mut self) -> Result<usize, GsrError> {
        let Some(link) = self.link.as_mut() else {
            return Ok(0);
        };
        let bytes = link.read_available()?;
        if bytes.is_empty() {
            return Ok(0);
        }
        let mut appended = 0;
        for line in self.framer.push(&bytes) {
            match parse_line(&line) {
                Ok(DeviceLine::Sample(sample)) => {
                    let Some(buffer) = self.buffer.as_mut() else {
                        debug!("discarding sample before recording: {line}");
                        continue;
                    };
                    buffer.append(sample);
                    appended += 1;
                    if self.progress_every > 0 && buffer.len() % self.progress_every == 0 {
                        info!(
                            "captured {} samples ({:.1} s) - conductance {:.2} uS",
                            buffer.len(),
                            sample.time,
                            sample.conductance
                        );
                    }
                }
                Ok(DeviceLine::Truncated { fields }) => {
                    debug!("dropping DATA frame with {fields} fields: {line}");
                }
                Ok(DeviceLine::Diagnostic(text)) => info!("device: {text}"),
                Ok(DeviceLine::Header) | Ok(DeviceLine::Empty) => {}
                Err(e) => warn!("{e}; line dropped"),
            }
        }
        Ok(appended)
    }

    /// Stops a running recording, then releases the link. Safe to call any
    /// number of times.
    pub fn close(&mut self) {
        if self.state == SessionState::Recording {
            if let Err(e) = self.stop() {
                warn!("failed to stop recording while closing: {e}");
            }
        }
        if self.link.take().is_some() {
            info!("disconnected from {}", self.port_name);
        }
        self.state = SessionState::Idle;
    }

    fn send(&mut self, command: DeviceCommand) -> Result<(), GsrError> {
        let link = self.link.as_mut().ok_or(GsrError::NotConnected)?;
        link.send(command)
    }
}

impl RecordingSession<SerialLink> {
    /// Opens `port_name` and attaches it. On failure the session stays idle so
    /// the caller can try another port.
    pub fn connect(&mut self, port_name: &str, config: &CollectorConfig) -> Result<(), GsrError> {
        if self.state != SessionState::Idle {
            return Err(GsrError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }
        let link = SerialLink::open(port_name, config.baud_rate, config.read_timeout())?;
        self.attach(link, port_name, config)
    }
}

impl<L: DeviceLink> Drop for RecordingSession<L> {
    fn drop(&mut self) {
        self.close();
    }
}
