//! Frame capture from the SuperPico camera.
//!
//! - Header parsing via [`FrameHeader`]
//! - 1-bpp payload conversion in [`bitmap`]
//! - The serial exchange via [`FrameClient`] / [`capture_frame`]
//! - Output via [`capture_to_file`] and [`show_image`]

pub mod bitmap;
mod capture;
mod error;
mod header;
mod output;

pub use capture::{
    capture_frame, CaptureSettings, CapturedFrame, FrameClient, CAPTURE_COMMAND,
    DEFAULT_CHUNK_SIZE, ERROR_MARKER,
};
pub use error::CaptureError;
pub use header::{FrameHeader, HeaderError, FRAME_START_PREFIX};
pub use output::{capture_to_file, save_image, show_image, DEFAULT_OUTPUT};
