//! 1-bit-per-pixel packed bitmap conversion.
//!
//! Eight horizontal pixels share one byte, most-significant bit first. A set
//! bit is white (255), a clear bit black (0). Rows are byte aligned.

use image::{GrayImage, Luma};

use super::header::FrameHeader;

pub const WHITE: u8 = 255;
pub const BLACK: u8 = 0;

/// Unpack a 1-bpp payload into an 8-bit grayscale image.
///
/// Returns `None` if `payload` is shorter than `header.payload_len()`.
/// Trailing bytes beyond that length are ignored.
pub fn unpack(header: &FrameHeader, payload: &[u8]) -> Option<GrayImage> {
    if payload.len() < header.payload_len() {
        return None;
    }

    let width = header.width;
    let bytes_per_row = header.bytes_per_row();
    let mut img = GrayImage::new(width, header.height);
    if bytes_per_row == 0 {
        return Some(img);
    }

    for (y, row) in payload
        .chunks_exact(bytes_per_row)
        .take(header.height as usize)
        .enumerate()
    {
        for (bx, &byte) in row.iter().enumerate() {
            for bit in 0..8u32 {
                let x = bx as u32 * 8 + bit;
                if x >= width {
                    continue;
                }
                let on = (byte >> (7 - bit)) & 1 == 1;
                img.put_pixel(x, y as u32, Luma([if on { WHITE } else { BLACK }]));
            }
        }
    }

    Some(img)
}

/// Pack a row-major on/off pattern into the device's wire format.
///
/// Returns `None` unless `pixels.len()` equals `header.pixel_count()`.
pub fn pack(header: &FrameHeader, pixels: &[bool]) -> Option<Vec<u8>> {
    if pixels.len() != header.pixel_count() {
        return None;
    }

    let packed = pixels
        .chunks(8)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .fold(0u8, |acc, (bit, &on)| if on { acc | (0x80 >> bit) } else { acc })
        })
        .collect();
    Some(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32) -> FrameHeader {
        FrameHeader::new(width, height).unwrap()
    }

    fn row(img: &GrayImage, y: u32) -> Vec<u8> {
        (0..img.width()).map(|x| img.get_pixel(x, y)[0]).collect()
    }

    #[test]
    fn test_unpack_8x2_example() {
        let img = unpack(&header(8, 2), &[0xF0, 0x0F]).unwrap();
        assert_eq!(img.dimensions(), (8, 2));
        assert_eq!(row(&img, 0), vec![255, 255, 255, 255, 0, 0, 0, 0]);
        assert_eq!(row(&img, 1), vec![0, 0, 0, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn test_unpack_msb_is_leftmost() {
        let img = unpack(&header(8, 1), &[0x80]).unwrap();
        assert_eq!(row(&img, 0), vec![255, 0, 0, 0, 0, 0, 0, 0]);

        let img = unpack(&header(8, 1), &[0x01]).unwrap();
        assert_eq!(row(&img, 0), vec![0, 0, 0, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_unpack_multi_byte_rows() {
        // 16x1: first byte all black, second byte all white
        let img = unpack(&header(16, 1), &[0x00, 0xFF]).unwrap();
        let pixels = row(&img, 0);
        assert!(pixels[..8].iter().all(|&p| p == BLACK));
        assert!(pixels[8..].iter().all(|&p| p == WHITE));
    }

    #[test]
    fn test_unpack_short_payload() {
        assert!(unpack(&header(16, 2), &[0xFF, 0xFF, 0xFF]).is_none());
    }

    #[test]
    fn test_unpack_ignores_trailing_bytes() {
        let img = unpack(&header(8, 1), &[0xAA, 0xFF, 0xFF]).unwrap();
        assert_eq!(row(&img, 0), vec![255, 0, 255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn test_every_pixel_follows_its_bit() {
        let h = header(24, 5);
        let payload: Vec<u8> = (0..h.payload_len() as u32)
            .map(|i| (i.wrapping_mul(37) ^ 0x5A) as u8)
            .collect();
        let img = unpack(&h, &payload).unwrap();

        assert_eq!(img.as_raw().len(), h.pixel_count());
        for y in 0..h.height {
            for bx in 0..h.bytes_per_row() as u32 {
                let byte = payload[(y * 3 + bx) as usize];
                for bit in 0..8 {
                    let expected = if (byte >> (7 - bit)) & 1 == 1 { WHITE } else { BLACK };
                    assert_eq!(img.get_pixel(bx * 8 + bit, y)[0], expected);
                }
            }
        }
    }

    #[test]
    fn test_pack_then_unpack_reproduces_pattern() {
        let h = header(16, 3);
        // Checkerboard with a diagonal stripe
        let pattern: Vec<bool> = (0..h.pixel_count())
            .map(|i| {
                let x = i % 16;
                let y = i / 16;
                (x + y) % 2 == 0 || x == y
            })
            .collect();

        let payload = pack(&h, &pattern).unwrap();
        assert_eq!(payload.len(), h.payload_len());

        let img = unpack(&h, &payload).unwrap();
        let decoded: Vec<bool> = img.as_raw().iter().map(|&p| p == WHITE).collect();
        assert_eq!(decoded, pattern);
    }

    #[test]
    fn test_pack_known_bytes() {
        let h = header(8, 2);
        let pattern = [
            true, true, true, true, false, false, false, false, //
            false, false, false, false, true, true, true, true,
        ];
        assert_eq!(pack(&h, &pattern), Some(vec![0xF0, 0x0F]));
    }

    #[test]
    fn test_pack_rejects_wrong_length() {
        let h = header(8, 2);
        assert!(pack(&h, &[true; 8]).is_none());
        assert!(pack(&h, &[false; 17]).is_none());
    }
}
