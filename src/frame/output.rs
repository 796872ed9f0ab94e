//! Writing decoded frames to disk and handing them to a viewer.

use std::path::Path;
use std::process::{Command, Stdio};

use image::GrayImage;

use super::capture::{capture_frame, CaptureSettings, CapturedFrame};
use super::error::CaptureError;
use crate::transport::Transport;

/// Default output path for `capture-frame`.
pub const DEFAULT_OUTPUT: &str = "frame.png";

/// Save `img` as 8-bit grayscale. The format follows the file extension.
pub fn save_image(img: &GrayImage, path: &Path) -> Result<(), CaptureError> {
    img.save(path).map_err(|e| CaptureError::Save {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Capture a frame over `transport` and write it to `output`.
///
/// Nothing is written unless the full payload arrived.
pub fn capture_to_file<T: Transport>(
    transport: T,
    settings: CaptureSettings,
    output: &Path,
) -> Result<CapturedFrame, CaptureError> {
    let frame = capture_frame(transport, settings)?;
    log::info!("Converting to image...");
    save_image(&frame.to_image(), output)?;
    Ok(frame)
}

/// Open `path` in the platform's default image viewer.
///
/// Best effort: failures are logged at debug level and otherwise ignored.
pub fn show_image(path: &Path) {
    let mut cmd = viewer_command(path);
    let result = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        log::debug!("Could not open viewer for {}: {}", path.display(), e);
    }
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameHeader;

    #[test]
    fn test_save_image_png_is_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let header = FrameHeader::new(8, 2).unwrap();
        let img = crate::frame::bitmap::unpack(&header, &[0xF0, 0x0F]).unwrap();
        save_image(&img, &path).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.color(), image::ColorType::L8);
        let gray = loaded.to_luma8();
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(7, 0)[0], 0);
        assert_eq!(gray.get_pixel(0, 1)[0], 0);
        assert_eq!(gray.get_pixel(7, 1)[0], 255);
    }

    #[test]
    fn test_save_image_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.unknownformat");
        let img = GrayImage::new(8, 1);

        let err = save_image(&img, &path).unwrap_err();
        assert!(matches!(err, CaptureError::Save { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_image_bmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        save_image(&GrayImage::new(16, 4), &path).unwrap();
        assert!(path.exists());
    }
}
