//! Serial transport abstraction.
//!
//! The capture client and the monitor loop only need a handful of byte-level
//! operations, so they are written against the [`Transport`] trait. The real
//! implementation wraps a `serialport` handle; tests drive the same code with
//! scripted in-memory transports.

use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Default baud rate used by the SuperPico firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Byte-level operations on an open link to the device.
pub trait Transport {
    /// Read whatever is available into `buf`.
    ///
    /// Returns `Ok(0)` when the read timeout elapsed without data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data` to the device.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush pending output.
    fn flush(&mut self) -> io::Result<()>;

    /// Number of bytes waiting in the input buffer.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Drop everything currently buffered on the input side.
    fn discard_input(&mut self) -> io::Result<()>;
}

/// Errors raised while opening a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Failed to configure {port}: {source}")]
    Configure {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

/// Everything needed to open a connection.
///
/// Reconnects reuse the same value, so a reopened link gets exactly the same
/// configuration as the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// OS-level port identifier (`/dev/ttyACM0`, `COM3`, ...)
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for a single blocking read
    pub read_timeout: Duration,
    /// Keep DTR and RTS deasserted so the board does not reset on connect
    pub suppress_reset: bool,
}

impl SerialSettings {
    pub fn new(port: impl Into<String>, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout,
            suppress_reset: false,
        }
    }

    pub fn with_suppress_reset(mut self, suppress: bool) -> Self {
        self.suppress_reset = suppress;
        self
    }
}

/// A `serialport` handle behind the [`Transport`] trait.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a port with the given settings.
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let mut builder =
            serialport::new(&settings.port, settings.baud_rate).timeout(settings.read_timeout);
        if settings.suppress_reset {
            builder = builder.dtr_on_open(false);
        }

        let mut port = builder.open().map_err(|e| TransportError::Open {
            port: settings.port.clone(),
            source: e,
        })?;

        if settings.suppress_reset {
            port.write_data_terminal_ready(false)
                .and_then(|_| port.write_request_to_send(false))
                .map_err(|e| TransportError::Configure {
                    port: settings.port.clone(),
                    source: e,
                })?;
            log::debug!("{}: DTR/RTS deasserted", settings.port);
        }

        log::debug!(
            "Opened {} at {} baud (timeout {:?})",
            settings.port,
            settings.baud_rate,
            settings.read_timeout
        );
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.port)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }
}

/// Something that can open a [`Transport`] from [`SerialSettings`].
///
/// The monitor owns a connector rather than a transport so it can reopen the
/// link after an error.
pub trait Connector {
    type Conn: Transport;

    fn connect(&mut self, settings: &SerialSettings) -> Result<Self::Conn, TransportError>;
}

/// Connector backed by real serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Conn = SerialTransport;

    fn connect(&mut self, settings: &SerialSettings) -> Result<SerialTransport, TransportError> {
        SerialTransport::open(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_keeps_reset_lines() {
        let settings = SerialSettings::new("/dev/ttyACM0", DEFAULT_BAUD_RATE, Duration::from_secs(5));
        assert!(!settings.suppress_reset);
        assert_eq!(settings.baud_rate, 115_200);
    }

    #[test]
    fn test_settings_with_suppress_reset() {
        let settings = SerialSettings::new("COM3", 9600, Duration::from_millis(100))
            .with_suppress_reset(true);
        assert!(settings.suppress_reset);
        assert_eq!(settings.port, "COM3");
    }

    #[test]
    fn test_open_missing_port_fails() {
        let settings = SerialSettings::new(
            "/dev/does-not-exist-superpico",
            DEFAULT_BAUD_RATE,
            Duration::from_millis(10),
        );
        let err = SerialTransport::open(&settings).err().expect("open should fail");
        assert!(err.to_string().contains("/dev/does-not-exist-superpico"));
    }
}
