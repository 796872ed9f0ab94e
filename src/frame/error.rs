//! Frame capture error types

use std::path::PathBuf;
use std::time::Duration;

use super::header::HeaderError;
use crate::transport::TransportError;

/// Error type for frame capture
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// No port given and none matched during auto-detection
    #[error("No SuperPico found. Connect the board or pass --port.")]
    NoDevice,

    /// Device answered with an `ERROR` line before the frame header
    #[error("Capture failed, device reported: {0}")]
    DeviceError(String),

    /// `FRAME_START` line could not be parsed
    #[error("Invalid frame header: {0}")]
    InvalidHeader(#[from] HeaderError),

    /// Device never sent `FRAME_START`
    #[error("No frame header received within {0:?}")]
    HeaderTimeout(Duration),

    /// Payload timeout elapsed before the full frame arrived
    #[error("Incomplete frame data: received {received}/{expected} bytes")]
    IncompletePayload { received: usize, expected: usize },

    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to list serial ports: {0}")]
    PortScan(#[from] serialport::Error),

    #[error("Failed to save image to '{}': {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_payload_message() {
        let err = CaptureError::IncompletePayload {
            received: 100,
            expected: 9600,
        };
        assert_eq!(err.to_string(), "Incomplete frame data: received 100/9600 bytes");
    }

    #[test]
    fn test_device_error_message_keeps_line() {
        let err = CaptureError::DeviceError("ERROR: camera not ready".to_string());
        assert!(err.to_string().contains("ERROR: camera not ready"));
    }

    #[test]
    fn test_header_error_converts() {
        let err: CaptureError = HeaderError::UnalignedWidth(12).into();
        assert!(matches!(err, CaptureError::InvalidHeader(_)));
        assert!(err.to_string().contains("12"));
    }
}
