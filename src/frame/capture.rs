//! Single-frame capture protocol client.
//!
//! The exchange is:
//!
//! 1. host sends `C`
//! 2. device prints diagnostic text lines
//! 3. device sends `FRAME_START:<width>:<height>`
//! 4. device sends `(width / 8) * height` raw bytes
//! 5. device prints a trailing `FRAME_END` line
//!
//! A line containing `ERROR` before the header aborts the capture.

use std::thread;
use std::time::{Duration, Instant};

use image::GrayImage;

use super::bitmap;
use super::error::CaptureError;
use super::header::FrameHeader;
use crate::transport::Transport;

/// Byte that asks the firmware for one frame.
pub const CAPTURE_COMMAND: u8 = b'C';

/// Substring that marks a device-side failure.
pub const ERROR_MARKER: &str = "ERROR";

/// Largest single payload read.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Upper bound on trailing bytes collected after the payload.
const MAX_TRAILER_BYTES: usize = 4096;

/// Largest up-front allocation for the payload buffer. The header comes from
/// the device, so larger frames grow the buffer as bytes arrive.
const MAX_PAYLOAD_PREALLOC: usize = 64 * 1024;

/// Sleep between polls while waiting for header bytes.
const HEADER_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Timing and sizing knobs for one capture.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Pause after opening before stale input is discarded
    pub settle: Duration,
    /// Upper bound on the wait for `FRAME_START`. Reads only happen when bytes
    /// are waiting, so the port's own read timeout does not extend it.
    pub header_timeout: Duration,
    /// Upper bound on the payload phase, measured from its start
    pub payload_timeout: Duration,
    pub chunk_size: usize,
    /// Pause before the trailing lines are drained
    pub trailer_delay: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            header_timeout: Duration::from_secs(15),
            payload_timeout: Duration::from_secs(10),
            chunk_size: DEFAULT_CHUNK_SIZE,
            trailer_delay: Duration::from_millis(200),
        }
    }
}

/// A complete frame as received from the device.
///
/// The payload always holds at least `header.payload_len()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    header: FrameHeader,
    payload: Vec<u8>,
}

impl CapturedFrame {
    /// Pair a header with its payload. Fails if the payload is short.
    pub fn new(header: FrameHeader, payload: Vec<u8>) -> Result<Self, CaptureError> {
        if payload.len() < header.payload_len() {
            return Err(CaptureError::IncompletePayload {
                received: payload.len(),
                expected: header.payload_len(),
            });
        }
        Ok(Self { header, payload })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Decode the packed payload into a grayscale image.
    pub fn to_image(&self) -> GrayImage {
        // unpack only fails on a short payload, which `new` rejects
        bitmap::unpack(&self.header, &self.payload)
            .unwrap_or_else(|| GrayImage::new(self.header.width, self.header.height))
    }
}

/// Drives the capture exchange over a [`Transport`].
///
/// Keeps its own line buffer so bytes that arrive in the same read as the
/// header line are counted towards the payload.
pub struct FrameClient<T: Transport> {
    transport: T,
    settings: CaptureSettings,
    pending: Vec<u8>,
}

impl<T: Transport> FrameClient<T> {
    pub fn new(transport: T, settings: CaptureSettings) -> Self {
        Self {
            transport,
            settings,
            pending: Vec::new(),
        }
    }

    /// Run the whole exchange and return the received frame.
    pub fn capture(&mut self) -> Result<CapturedFrame, CaptureError> {
        self.prepare()?;
        self.request()?;
        let header = self.wait_for_header()?;
        log::info!("Frame dimensions: {}", header);

        let payload = self.read_payload(&header)?;
        self.drain_trailer()?;

        CapturedFrame::new(header, payload)
    }

    /// Let the device settle, then throw away anything sent before this session.
    pub fn prepare(&mut self) -> Result<(), CaptureError> {
        if !self.settings.settle.is_zero() {
            thread::sleep(self.settings.settle);
        }
        let stale = self.transport.bytes_available()?;
        if stale > 0 {
            log::debug!("Discarding {} stale byte(s)", stale);
        }
        self.transport.discard_input()?;
        self.pending.clear();
        Ok(())
    }

    /// Send the capture command.
    pub fn request(&mut self) -> Result<(), CaptureError> {
        log::info!("Sending capture command...");
        self.transport.write_all(&[CAPTURE_COMMAND])?;
        self.transport.flush()?;
        Ok(())
    }

    /// Read lines until `FRAME_START` arrives.
    ///
    /// Fails on an `ERROR` line or when `header_timeout` elapses.
    pub fn wait_for_header(&mut self) -> Result<FrameHeader, CaptureError> {
        log::info!("Waiting for frame header...");
        let deadline = Instant::now() + self.settings.header_timeout;

        loop {
            let line = match self.read_line(deadline)? {
                Some(line) => line,
                None => return Err(CaptureError::HeaderTimeout(self.settings.header_timeout)),
            };
            log::info!("  < {}", line);

            if FrameHeader::is_header_line(&line) {
                return Ok(FrameHeader::parse(&line)?);
            }
            if line.contains(ERROR_MARKER) {
                return Err(CaptureError::DeviceError(line));
            }
        }
    }

    /// Read the packed payload for `header`.
    ///
    /// Returns early with a short buffer if `payload_timeout` elapses.
    pub fn read_payload(&mut self, header: &FrameHeader) -> Result<Vec<u8>, CaptureError> {
        let expected = header.payload_len();
        log::info!("Expecting {} bytes of image data...", expected);

        let mut data = Vec::with_capacity(expected.min(MAX_PAYLOAD_PREALLOC));
        let buffered = self.pending.len().min(expected);
        data.extend(self.pending.drain(..buffered));

        let chunk_size = self.settings.chunk_size.max(1);
        let mut chunk = vec![0u8; chunk_size];
        let start = Instant::now();

        while data.len() < expected {
            if start.elapsed() > self.settings.payload_timeout {
                log::warn!("Timeout! Only got {}/{} bytes", data.len(), expected);
                break;
            }
            let want = chunk_size.min(expected - data.len());
            let n = self.transport.read(&mut chunk[..want])?;
            if n > 0 {
                data.extend_from_slice(&chunk[..n]);
                log::info!("  Received {}/{} bytes", data.len(), expected);
            }
        }

        log::info!("Received {} bytes", data.len());
        Ok(data)
    }

    /// Log whatever the device sends after the payload. Content is not checked.
    pub fn drain_trailer(&mut self) -> Result<Vec<String>, CaptureError> {
        if !self.settings.trailer_delay.is_zero() {
            thread::sleep(self.settings.trailer_delay);
        }

        let mut chunk = [0u8; DEFAULT_CHUNK_SIZE];
        while self.pending.len() < MAX_TRAILER_BYTES {
            let available = self.transport.bytes_available()?;
            if available == 0 {
                break;
            }
            let want = available.min(DEFAULT_CHUNK_SIZE);
            let n = self.transport.read(&mut chunk[..want])?;
            if n == 0 {
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }

        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();

        let lines: Vec<String> = text
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        for line in &lines {
            log::info!("  < {}", line);
        }
        Ok(lines)
    }

    /// Give the transport back, e.g. to inspect a test double.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Next newline-terminated line, or `None` once `deadline` has passed.
    fn read_line(&mut self, deadline: Instant) -> Result<Option<String>, CaptureError> {
        let mut chunk = [0u8; DEFAULT_CHUNK_SIZE];
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = self.pending.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw).trim().to_string();
                return Ok(Some(line));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let available = self.transport.bytes_available()?;
            if available == 0 {
                thread::sleep(HEADER_POLL_INTERVAL.min(deadline - now));
                continue;
            }
            let want = available.min(DEFAULT_CHUNK_SIZE);
            let n = self.transport.read(&mut chunk[..want])?;
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Capture one frame over `transport`, which is closed before returning.
pub fn capture_frame<T: Transport>(
    transport: T,
    settings: CaptureSettings,
) -> Result<CapturedFrame, CaptureError> {
    let mut client = FrameClient::new(transport, settings);
    let result = client.capture();
    drop(client);
    result
}
