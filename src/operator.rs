// src/operator.rs
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::warn;

use crate::drivers::PortDescription;

/// Polled once per acquisition loop iteration.
pub trait StopSignal {
    fn operator_requested_stop(&mut self) -> bool;
}

/// Console front end: stdin lines and Ctrl-C.
///
/// A single background thread owns stdin and forwards every line, so prompts
/// and the stop keypress never compete for input.
pub struct Console {
    lines: Receiver<String>,
    interrupted: Arc<AtomicBool>,
}

impl Console {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            warn!("Ctrl-C handler unavailable, use Enter to stop: {e}");
        }
        Self {
            lines: rx,
            interrupted,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Prints `prompt` and waits for one line. `None` on Ctrl-C or end of input.
    pub fn ask(&self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        io::stdout().flush().ok();
        self.next_line().map(|l| l.trim().to_string())
    }

    /// Waits for Enter (`true`) or Ctrl-C / end of input (`false`).
    pub fn wait_for_enter(&self, prompt: &str) -> bool {
        println!("{prompt}");
        self.next_line().is_some()
    }

    fn next_line(&self) -> Option<String> {
        loop {
            if self.interrupted() {
                return None;
            }
            match self.lines.recv_timeout(Duration::from_millis(100)) {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl StopSignal for Console {
    fn operator_requested_stop(&mut self) -> bool {
        if self.interrupted() {
            return true;
        }
        match self.lines.try_recv() {
            Ok(_) => true,
            Err(TryRecvError::Empty) => false,
            // stdin closed: nobody can press Enter any more
            Err(TryRecvError::Disconnected) => true,
        }
    }
}

/// Picks a port: the only one if there is exactly one, otherwise the
/// operator's 1-based choice.
pub fn choose_port(ports: &[PortDescription], console: &Console) -> Result<String> {
    match ports {
        [] => Err(anyhow!("no serial ports found")),
        [only] => {
            println!("Auto-selected: {}", only.name);
            Ok(only.name.clone())
        }
        _ => {
            print_ports(ports);
            let answer = console
                .ask("Select port number: ")
                .ok_or_else(|| anyhow!("no port selected"))?;
            pick_port(ports, &answer)
        }
    }
}

pub fn pick_port(ports: &[PortDescription], answer: &str) -> Result<String> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| ports.get(i))
        .map(|p| p.name.clone())
        .ok_or_else(|| anyhow!("invalid selection `{}`", answer.trim()))
}

pub fn print_ports(ports: &[PortDescription]) {
    println!("\nAvailable serial ports:");
    for (i, port) in ports.iter().enumerate() {
        println!("  {}. {} - {}", i + 1, port.name, port.description);
    }
}

/// Ledalab steps for whichever file actually made it to disk.
pub fn print_import_hints(mat_written: bool, text_written: bool) {
    println!("\nLedalab import:");
    println!("  1. Start MATLAB and run `ledalab`");
    if mat_written {
        println!("  2. File -> Import Data, format 'Matlab'");
        println!("  3. Pick the generated .mat file and click Import");
        if text_written {
            println!("If the MAT file does not import, load the .txt file with the 'Text-file' format.");
        }
    } else if text_written {
        println!("  2. File -> Import Data, format 'Text-file'");
        println!("  3. Pick the generated .txt file and click Import");
    } else {
        println!("  no importable file was written; check the errors above");
    }
}

/// Stops after a fixed number of polls; used to drive the loop in tests.
#[cfg(test)]
pub struct StopAfter(pub usize);

#[cfg(test)]
impl StopSignal for StopAfter {
    fn operator_requested_stop(&mut self) -> bool {
        if self.0 == 0 {
            return true;
        }
        self.0 -= 1;
        false
    }
}
