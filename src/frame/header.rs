//! `FRAME_START:<width>:<height>` header line.

use std::fmt;

/// Prefix of the line announcing a binary frame.
pub const FRAME_START_PREFIX: &str = "FRAME_START:";

/// Dimensions announced by the device before the packed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
}

/// Reasons a header line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("expected FRAME_START:<width>:<height>, got '{0}'")]
    Malformed(String),

    #[error("frame dimensions must be positive, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("frame width {0} is not a multiple of 8")]
    UnalignedWidth(u32),
}

impl FrameHeader {
    pub fn new(width: u32, height: u32) -> Result<Self, HeaderError> {
        if width == 0 || height == 0 {
            return Err(HeaderError::EmptyFrame { width, height });
        }
        if width % 8 != 0 {
            return Err(HeaderError::UnalignedWidth(width));
        }
        Ok(Self { width, height })
    }

    /// True if `line` announces a frame, whether or not it parses.
    pub fn is_header_line(line: &str) -> bool {
        line.trim().starts_with(FRAME_START_PREFIX)
    }

    /// Parse a header line.
    pub fn parse(line: &str) -> Result<Self, HeaderError> {
        let line = line.trim();
        let malformed = || HeaderError::Malformed(line.to_string());

        let rest = line.strip_prefix(FRAME_START_PREFIX).ok_or_else(malformed)?;
        let mut parts = rest.split(':');
        let width = parts
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(malformed)?;
        let height = parts
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(malformed)?;

        Self::new(width, height)
    }

    /// Packed bytes per row (1 bit per pixel).
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize / 8
    }

    /// Total payload size that follows the header.
    pub fn payload_len(&self) -> usize {
        self.bytes_per_row().saturating_mul(self.height as usize)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_header() {
        let header = FrameHeader::parse("FRAME_START:320:240").unwrap();
        assert_eq!(header, FrameHeader { width: 320, height: 240 });
        assert_eq!(header.bytes_per_row(), 40);
        assert_eq!(header.payload_len(), 9600);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let header = FrameHeader::parse("  FRAME_START:8:2\r\n").unwrap();
        assert_eq!(header.width, 8);
        assert_eq!(header.height, 2);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let header = FrameHeader::parse("FRAME_START:16:4:1bpp").unwrap();
        assert_eq!(header, FrameHeader { width: 16, height: 4 });
    }

    #[test]
    fn test_parse_rejects_missing_height() {
        assert!(matches!(
            FrameHeader::parse("FRAME_START:320"),
            Err(HeaderError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            FrameHeader::parse("FRAME_START:abc:240"),
            Err(HeaderError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!(matches!(
            FrameHeader::parse("FRAME_END"),
            Err(HeaderError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unaligned_width() {
        assert_eq!(
            FrameHeader::parse("FRAME_START:10:2"),
            Err(HeaderError::UnalignedWidth(10))
        );
    }

    #[test]
    fn test_parse_rejects_zero_dimension() {
        assert_eq!(
            FrameHeader::parse("FRAME_START:0:240"),
            Err(HeaderError::EmptyFrame { width: 0, height: 240 })
        );
        assert!(FrameHeader::parse("FRAME_START:8:0").is_err());
    }

    #[test]
    fn test_is_header_line() {
        assert!(FrameHeader::is_header_line("FRAME_START:8:2"));
        assert!(FrameHeader::is_header_line("FRAME_START:garbage"));
        assert!(!FrameHeader::is_header_line("Camera ready"));
        assert!(!FrameHeader::is_header_line("got FRAME_START:8:2"));
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameHeader::new(64, 48).unwrap().to_string(), "64x48");
    }
}
