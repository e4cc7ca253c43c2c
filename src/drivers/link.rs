use std::f64::consts::PI;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use rand::Rng;
use serialport::{SerialPort, SerialPortType};

use crate::drivers::error::GsrError;
use crate::types::DeviceCommand;

/// Byte transport to a GSR device.
pub trait DeviceLink {
    /// Returns the bytes the transport has already buffered. Never waits for more.
    fn read_available(&mut self) -> Result<Vec<u8>, GsrError>;
    fn send(&mut self, command: DeviceCommand) -> Result<(), GsrError>;
}

/// Serial port entry as shown to the operator.
#[derive(Clone, Debug)]
pub struct PortDescription {
    pub name: String,
    pub description: String,
}

/// USB-serial connection to the Arduino running the GSR sketch.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, GsrError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| GsrError::Connect {
                port: port_name.to_string(),
                source,
            })?;
        Ok(Self { port })
    }

    pub fn available_ports() -> Vec<PortDescription> {
        serialport::available_ports()
            .map(|ports| {
                ports
                    .into_iter()
                    .map(|p| {
                        let description = match &p.port_type {
                            SerialPortType::UsbPort(usb) => usb
                                .product
                                .clone()
                                .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
                            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                            SerialPortType::PciPort => "PCI".to_string(),
                            SerialPortType::Unknown => "n/a".to_string(),
                        };
                        PortDescription {
                            name: p.port_name,
                            description,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DeviceLink for SerialLink {
    fn read_available(&mut self) -> Result<Vec<u8>, GsrError> {
        let waiting = self
            .port
            .bytes_to_read()
            .map_err(std::io::Error::from)? as usize;
        if waiting == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; waiting];
        match self.port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn send(&mut self, command: DeviceCommand) -> Result<(), GsrError> {
        self.port.write_all(command.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

/// Synthetic GSR device for dry runs without hardware.
///
/// Emits a banner on creation, then `DATA:` frames at `rate_hz` between
/// `START` and `STOP`, timestamped with its own millisecond clock.
pub struct SimulatedLink {
    clock: Instant,
    period_ms: f64,
    next_emit_ms: f64,
    recording: bool,
    outbox: Vec<u8>,
}

impl SimulatedLink {
    pub fn new(rate_hz: f64) -> Self {
        let rate_hz = if rate_hz > 0.0 { rate_hz } else { 10.0 };
        let mut outbox = Vec::new();
        outbox.extend_from_slice(b"Grove GSR simulator\r\n");
        outbox.extend_from_slice(b"HEADER:time_ms,raw,resistance_ohm,conductance_us\r\n");
        Self {
            clock: Instant::now(),
            period_ms: 1000.0 / rate_hz,
            next_emit_ms: 0.0,
            recording: false,
            outbox,
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    fn emit_frame(&mut self, at_ms: f64) {
        let mut rng = rand::thread_rng();
        // slow drift plus a little sensor noise, around 5 uS
        let conductance =
            5.0 + 0.8 * (2.0 * PI * at_ms / 20_000.0).sin() + rng.gen_range(-0.05..0.05);
        let resistance = 1.0e6 / conductance;
        // inverse of the Grove transfer function R = (1024 + 2r) * 10k / (512 - r)
        let raw = ((512.0 * resistance - 10_240_000.0) / (resistance + 20_000.0))
            .round()
            .clamp(0.0, 1023.0) as i64;
        let line = format!(
            "DATA:{},{},{:.2},{:.4}\r\n",
            at_ms.round() as u64,
            raw,
            resistance,
            conductance
        );
        self.outbox.extend_from_slice(line.as_bytes());
    }
}

impl DeviceLink for SimulatedLink {
    fn read_available(&mut self) -> Result<Vec<u8>, GsrError> {
        if self.recording {
            let now_ms = self.elapsed_ms();
            while self.next_emit_ms <= now_ms {
                let at = self.next_emit_ms;
                self.emit_frame(at);
                self.next_emit_ms += self.period_ms;
            }
        }
        Ok(std::mem::take(&mut self.outbox))
    }

    fn send(&mut self, command: DeviceCommand) -> Result<(), GsrError> {
        match command {
            DeviceCommand::Start => {
                self.recording = true;
                self.next_emit_ms = self.elapsed_ms();
                self.outbox.extend_from_slice(b"Recording started\r\n");
            }
            DeviceCommand::Stop => {
                self.recording = false;
                self.outbox.extend_from_slice(b"Recording stopped\r\n");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub use manual::ManualLink;

#[cfg(test)]
mod manual {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::DeviceLink;
    use crate::drivers::error::GsrError;
    use crate::types::DeviceCommand;

    /// Scripted link: each read returns the next queued chunk.
    pub struct ManualLink {
        chunks: VecDeque<Vec<u8>>,
        sent: Rc<RefCell<Vec<u8>>>,
        fail_reads: bool,
    }

    impl ManualLink {
        pub fn new<I, B>(chunks: I) -> Self
        where
            I: IntoIterator<Item = B>,
            B: AsRef<[u8]>,
        {
            Self {
                chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
                sent: Rc::new(RefCell::new(Vec::new())),
                fail_reads: false,
            }
        }

        pub fn failing() -> Self {
            let mut link = Self::new(Vec::<Vec<u8>>::new());
            link.fail_reads = true;
            link
        }

        /// Shared view of everything written to the device, still readable after
        /// the link has been dropped.
        pub fn transcript(&self) -> Rc<RefCell<Vec<u8>>> {
            Rc::clone(&self.sent)
        }

        pub fn queue(&mut self, chunk: impl AsRef<[u8]>) {
            self.chunks.push_back(chunk.as_ref().to_vec());
        }
    }

    impl DeviceLink for ManualLink {
        fn read_available(&mut self) -> Result<Vec<u8>, GsrError> {
            if self.fail_reads {
                return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged").into());
            }
            Ok(self.chunks.pop_front().unwrap_or_default())
        }

        fn send(&mut self, command: DeviceCommand) -> Result<(), GsrError> {
            self.sent.borrow_mut().extend_from_slice(command.as_bytes());
            Ok(())
        }
    }
}
