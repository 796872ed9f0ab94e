//! Passive serial console with auto-reconnect.
//!
//! Relays everything the board prints to a writer (normally stdout). When the
//! link drops, the monitor waits and reopens the same port with the same
//! [`SerialSettings`], including reset suppression, until the board is back.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::transport::{Connector, SerialSettings, Transport, TransportError};

/// Largest single read from the port.
const READ_BUFFER_SIZE: usize = 4096;

/// Timing for the relay loop.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Sleep when no bytes are waiting
    pub idle_delay: Duration,
    /// Pause between a transport error and the reopen attempt
    pub reconnect_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_millis(10),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Counters reported when the monitor stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    pub bytes_relayed: usize,
    pub reconnects: usize,
    pub errors: usize,
}

/// Errors that end the monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The first connection could not be opened
    #[error(transparent)]
    Connect(#[from] TransportError),

    #[error("Failed to list serial ports: {0}")]
    PortScan(#[from] serialport::Error),

    /// The output sink (stdout) failed
    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Serial relay loop over a [`Connector`].
pub struct Monitor<C: Connector> {
    connector: C,
    serial: SerialSettings,
    settings: MonitorSettings,
}

impl<C: Connector> Monitor<C> {
    pub fn new(connector: C, serial: SerialSettings, settings: MonitorSettings) -> Self {
        Self {
            connector,
            serial,
            settings,
        }
    }

    pub fn serial_settings(&self) -> &SerialSettings {
        &self.serial
    }

    /// Open the port and relay bytes to `out` until `stop` is set.
    ///
    /// Transport errors never end the loop; only a failed initial open or a
    /// failing `out` do.
    pub fn run<W: Write>(
        &mut self,
        out: &mut W,
        stop: &AtomicBool,
    ) -> Result<MonitorStats, MonitorError> {
        let mut conn = Some(self.connector.connect(&self.serial)?);
        let mut stats = MonitorStats::default();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        if self.serial.suppress_reset {
            eprintln!("Connected (DTR disabled)! Monitoring... (Ctrl+C to stop)\n");
        } else {
            eprintln!("Connected! Monitoring... (Ctrl+C to stop)\n");
        }

        while !stop.load(Ordering::SeqCst) {
            let result = match conn.as_mut() {
                Some(c) => relay_once(c, &mut buf, out),
                None => Err(RelayError::Transport(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "port is closed",
                ))),
            };

            match result {
                Ok(0) => thread::sleep(self.settings.idle_delay),
                Ok(n) => stats.bytes_relayed += n,
                Err(RelayError::Output(e)) => return Err(MonitorError::Output(e)),
                Err(RelayError::Transport(e)) => {
                    stats.errors += 1;
                    // Only announce the first failure of an outage
                    if conn.is_some() {
                        eprintln!("\nSerial error: {}", e);
                        eprintln!("Reconnecting...");
                    } else {
                        log::debug!("Port still unavailable: {}", e);
                    }
                    conn = None;
                    thread::sleep(self.settings.reconnect_delay);
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }

                    match self.connector.connect(&self.serial) {
                        Ok(c) => {
                            conn = Some(c);
                            stats.reconnects += 1;
                            eprintln!("Reconnected!");
                        }
                        Err(e) => log::debug!("Reconnect failed: {}", e),
                    }
                }
            }
        }

        Ok(stats)
    }
}

enum RelayError {
    Transport(io::Error),
    Output(io::Error),
}

/// Copy whatever is waiting on `conn` to `out`. Returns the byte count.
fn relay_once<T: Transport, W: Write>(
    conn: &mut T,
    buf: &mut [u8],
    out: &mut W,
) -> Result<usize, RelayError> {
    let available = conn.bytes_available().map_err(RelayError::Transport)?;
    if available == 0 {
        return Ok(0);
    }

    let want = available.min(buf.len());
    let n = conn.read(&mut buf[..want]).map_err(RelayError::Transport)?;
    if n == 0 {
        return Ok(0);
    }

    let text = String::from_utf8_lossy(&buf[..n]);
    out.write_all(text.as_bytes()).map_err(RelayError::Output)?;
    out.flush().map_err(RelayError::Output)?;
    Ok(n)
}

/// Global flag for handling Ctrl+C
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// The flag set by the handler installed with [`setup_ctrlc_handler`].
pub fn ctrlc_flag() -> &'static AtomicBool {
    &CTRLC_RECEIVED
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted {
        reads: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Transport for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn bytes_available(&mut self) -> io::Result<usize> {
            match self.reads.front() {
                Some(Ok(data)) => Ok(data.len()),
                Some(Err(_)) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
                None => Ok(0),
            }
        }
        fn discard_input(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_relay_once_decodes_lossily() {
        let mut conn = Scripted {
            reads: VecDeque::from([Ok(vec![b'o', b'k', 0xFF, b'\n'])]),
        };
        let mut buf = [0u8; 16];
        let mut out = Vec::new();
        let n = relay_once(&mut conn, &mut buf, &mut out).ok().unwrap();
        assert_eq!(n, 4);
        assert_eq!(String::from_utf8(out).unwrap(), "ok\u{FFFD}\n");
    }

    #[test]
    fn test_relay_once_idle() {
        let mut conn = Scripted {
            reads: VecDeque::new(),
        };
        let mut buf = [0u8; 16];
        let mut out = Vec::new();
        assert_eq!(relay_once(&mut conn, &mut buf, &mut out).ok(), Some(0));
        assert!(out.is_empty());
    }

    #[test]
    fn test_relay_once_reports_transport_error() {
        let mut conn = Scripted {
            reads: VecDeque::from([Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))]),
        };
        let mut buf = [0u8; 16];
        let mut out = Vec::new();
        assert!(matches!(
            relay_once(&mut conn, &mut buf, &mut out),
            Err(RelayError::Transport(_))
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.idle_delay, Duration::from_millis(10));
        assert_eq!(settings.reconnect_delay, Duration::from_secs(1));
    }
}
