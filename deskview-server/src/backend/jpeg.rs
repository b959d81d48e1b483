//! JPEG frame encoder.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder as Codec;
use image::{ImageBuffer, RgbImage};

use deskview_core::{DeskviewError, ImageEncoder, PixelFormat, RawFrame, Result};

/// Encodes raw frames as baseline JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Bytes> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DeskviewError::Encode("empty frame".into()));
        }
        if !frame.is_consistent() {
            return Err(DeskviewError::Encode(format!(
                "{} bytes do not cover {}x{} at stride {}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.stride
            )));
        }

        let img: RgbImage = ImageBuffer::from_raw(frame.width, frame.height, to_rgb(frame))
            .ok_or_else(|| DeskviewError::Encode("invalid image dimensions".into()))?;

        let mut buf = Cursor::new(Vec::with_capacity(frame.byte_len() / 8));
        let encoder = Codec::new_with_quality(&mut buf, quality.clamp(1, 100));
        img.write_with_encoder(encoder)
            .map_err(|e| DeskviewError::Encode(e.to_string()))?;
        Ok(Bytes::from(buf.into_inner()))
    }
}

/// Pack a frame into tightly laid out RGB, dropping padding and alpha.
fn to_rgb(frame: &RawFrame) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for y in 0..frame.height {
        let row = frame.row(y);
        match frame.format {
            PixelFormat::Bgra8 => {
                for px in row.chunks_exact(4) {
                    rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            PixelFormat::Rgba8 => {
                for px in row.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::Rgb8 => rgb.extend_from_slice(row),
        }
    }
    rgb
}
