use std::sync::Arc;

use crate::foundation::error::{BoothError, BoothResult};

pub use kurbo::{Point, Rect};

/// Raw RGBA8 still frame as grabbed from a camera stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba8: Vec<u8>,
}

impl Frame {
    /// Create a frame, validating that the buffer matches `width*height*4`.
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> BoothResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BoothError::validation("frame size overflow"))?;
        if width == 0 || height == 0 {
            return Err(BoothError::validation("frame width/height must be > 0"));
        }
        if rgba8.len() != expected {
            return Err(BoothError::validation(
                "frame buffer must be width*height*4 bytes",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Return a horizontally mirrored copy (mirror-like live view semantics).
    pub fn mirrored(&self) -> Self {
        let mut out = vec![0u8; self.rgba8.len()];
        let row = (self.width as usize) * 4;
        for y in 0..self.height as usize {
            let src_row = &self.rgba8[y * row..(y + 1) * row];
            let dst_row = &mut out[y * row..(y + 1) * row];
            for x in 0..self.width as usize {
                let s = x * 4;
                let d = row - (x + 1) * 4;
                dst_row[d..d + 4].copy_from_slice(&src_row[s..s + 4]);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            rgba8: out,
        }
    }

    pub(crate) fn into_rgba_image(self) -> image::RgbaImage {
        // Invariant from `new`: buffer length always matches the dimensions.
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8)
            .unwrap_or_else(|| image::RgbaImage::new(1, 1))
    }
}

/// Opaque encoded still image exchanged between session and compositor.
///
/// Treated as an immutable value once created; clones share the byte buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Arc<Vec<u8>>,
}

impl ImagePayload {
    /// Wrap already-encoded image bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    /// Losslessly encode a raw frame as PNG.
    pub fn encode_png(frame: Frame) -> BoothResult<Self> {
        let img = frame.into_rgba_image();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut buf),
                image::ImageFormat::Png,
            )
            .map_err(|e| BoothError::compose(format!("encode captured frame: {e}")))?;
        Ok(Self::from_bytes(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode to straight-alpha RGBA8 pixels.
    pub fn decode(&self) -> BoothResult<image::RgbaImage> {
        let dyn_img = image::load_from_memory(&self.bytes)
            .map_err(|e| BoothError::compose(format!("decode image payload: {e}")))?;
        Ok(dyn_img.to_rgba8())
    }

    /// Width/height without decoding the full pixel data.
    pub fn dimensions(&self) -> BoothResult<(u32, u32)> {
        image::ImageReader::new(std::io::Cursor::new(self.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| BoothError::compose(format!("probe image payload: {e}")))?
            .into_dimensions()
            .map_err(|e| BoothError::compose(format!("probe image payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(Frame::new(2, 2, vec![0u8; 15]).is_err());
        assert!(Frame::new(0, 2, vec![]).is_err());
        assert!(Frame::new(2, 2, vec![0u8; 16]).is_ok());
    }

    #[test]
    fn mirror_reverses_rows() {
        // 2x1: red then blue.
        let frame = Frame::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let m = frame.mirrored();
        assert_eq!(m.rgba8, vec![0, 0, 255, 255, 255, 0, 0, 255]);
        // Mirroring twice is the identity.
        assert_eq!(m.mirrored(), frame);
    }

    #[test]
    fn png_roundtrip_preserves_dimensions() {
        let frame = Frame::new(3, 2, vec![7u8; 24]).unwrap();
        let payload = ImagePayload::encode_png(frame).unwrap();
        assert_eq!(payload.dimensions().unwrap(), (3, 2));
        let decoded = payload.decode().unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [7, 7, 7, 7]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let payload = ImagePayload::from_bytes(vec![1, 2, 3, 4]);
        assert!(payload.decode().is_err());
    }
}
