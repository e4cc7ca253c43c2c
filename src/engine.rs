// src/engine.rs
use std::thread;

use log::info;

use crate::config::CollectorConfig;
use crate::drivers::{DeviceLink, GsrError};
use crate::operator::StopSignal;
use crate::session::RecordingSession;

/// Records until the operator asks to stop, then collects the frames that were
/// still in flight. Returns the number of samples in the recording.
pub fn record_until_stopped<L: DeviceLink, S: StopSignal>(
    session: &mut RecordingSession<L>,
    stop: &mut S,
    config: &CollectorConfig,
) -> Result<usize, GsrError> {
    session.start()?;
    let poll = config.poll_interval();
    loop {
        session.drain()?;
        if stop.operator_requested_stop() {
            break;
        }
        if !poll.is_zero() {
            thread::sleep(poll);
        }
    }
    session.stop()?;
    let grace = config.stop_grace();
    if !grace.is_zero() {
        thread::sleep(grace);
    }
    let late = session.drain()?;
    if late > 0 {
        info!("collected {late} samples sent after STOP");
    }
    Ok(session.buffer().map_or(0, |b| b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::link::ManualLink;
    use crate::export::export_recording;
    use crate::operator::StopAfter;
    use crate::types::SessionState;

    #[test]
    fn loop_keeps_samples_sent_after_stop() {
        let link = ManualLink::new([
            "Grove GSR ready\n",
            "DATA:1000,512,10000.0,0.1\n",
            "DATA:1100,520,9900.0,0.1010\nDATA:1150,1\n",
            "",
            // arrives only in the post-stop drain
            "DATA:1200,530,9800.0,0.1020\n",
        ]);
        let transcript = link.transcript();
        let config = CollectorConfig::immediate();
        let mut session = RecordingSession::new(&config);
        session.attach(link, "manual", &config).unwrap();

        let count = record_until_stopped(&mut session, &mut StopAfter(2), &config).unwrap();
        assert_eq!(count, 3);
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(transcript.borrow().as_slice(), b"START\nSTOP\n");

        let times: Vec<f64> = session
            .buffer()
            .unwrap()
            .snapshot()
            .iter()
            .map(|s| s.time)
            .collect();
        assert_eq!(times, vec![1.0, 1.1, 1.2]);
    }

    #[test]
    fn immediate_stop_with_silent_device_exports_nothing() {
        let config = CollectorConfig::immediate();
        let mut session = RecordingSession::new(&config);
        session.attach(ManualLink::new([""]), "manual", &config).unwrap();
        let count = record_until_stopped(&mut session, &mut StopAfter(0), &config).unwrap();
        assert_eq!(count, 0);

        let dir = tempfile::tempdir().unwrap();
        let export_config = CollectorConfig {
            output_dir: dir.path().to_path_buf(),
            ..config
        };
        let samples = session.buffer().unwrap().snapshot();
        assert!(matches!(
            export_recording(samples, None, &export_config),
            Err(GsrError::EmptyBuffer)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn not_connected_session_cannot_record() {
        let config = CollectorConfig::immediate();
        let mut session: RecordingSession<ManualLink> = RecordingSession::new(&config);
        assert!(matches!(
            record_until_stopped(&mut session, &mut StopAfter(0), &config),
            Err(GsrError::NotConnected)
        ));
    }
}
