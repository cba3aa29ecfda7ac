//! Data Provider boundary
//!
//! The renderer never owns item data. It asks a host-supplied provider for
//! the live item count and for decoded pixels, on decode worker threads.

use std::fmt;

use image::{RgbaImage, imageops};

use crate::error::ArtworkError;

/// Opaque identifier the host uses to correlate a picked index back to its
/// own domain data. The renderer never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability interface over the externally owned dataset.
///
/// `load_artwork` runs on a decode worker and may block on I/O. It must not
/// assume a GPU context. Indices passed in are always within
/// `0..item_count()` as observed just before the call, but the dataset may
/// shrink concurrently.
pub trait DataProvider: Send + Sync + 'static {
    /// Total addressable indices. May change between calls.
    fn item_count(&self) -> usize;

    /// Decode artwork for `index`, ideally no larger than `max_dimension` on
    /// its longest edge. Larger buffers are downsampled by the renderer.
    fn load_artwork(
        &self,
        index: usize,
        max_dimension: u32,
    ) -> Result<PixelBuffer, ArtworkError>;

    /// Host identifier for `index`, if any.
    fn item_id(&self, index: usize) -> Option<ItemId>;
}

/// Tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A single-colour buffer, used for the placeholder tile.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self::new(width, height, pixels)
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Check that the buffer is non-empty and sized `width * height * 4`.
    pub fn validate(&self) -> Result<(), ArtworkError> {
        if self.width == 0 || self.height == 0 {
            return Err(ArtworkError::InvalidBuffer(format!(
                "empty dimensions {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(ArtworkError::InvalidBuffer(format!(
                "{}x{} needs {} bytes, got {}",
                self.width,
                self.height,
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Produce the private upload copy: validated and bounded so the longest
    /// edge does not exceed `max_dimension`. Aspect ratio is preserved.
    pub fn into_upload(
        self,
        max_dimension: u32,
    ) -> Result<PixelBuffer, ArtworkError> {
        self.validate()?;
        let max_dimension = max_dimension.max(1);
        let longest = self.width.max(self.height);
        if longest <= max_dimension {
            return Ok(self);
        }

        let scale = max_dimension as f32 / longest as f32;
        let width = ((self.width as f32 * scale).round() as u32).max(1);
        let height = ((self.height as f32 * scale).round() as u32).max(1);

        let image = RgbaImage::from_raw(self.width, self.height, self.pixels)
            .ok_or_else(|| {
                ArtworkError::InvalidBuffer(
                    "buffer does not match dimensions".to_string(),
                )
            })?;
        let resized = imageops::resize(
            &image,
            width,
            height,
            imageops::FilterType::Triangle,
        );
        Ok(PixelBuffer::new(width, height, resized.into_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_buffer_has_expected_size() {
        let buffer = PixelBuffer::solid(3, 2, [1, 2, 3, 4]);
        assert_eq!(buffer.byte_len(), 24);
        assert_eq!(&buffer.pixels[20..24], &[1, 2, 3, 4]);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn mismatched_length_is_rejected() {
        let buffer = PixelBuffer::new(4, 4, vec![0; 10]);
        assert!(matches!(
            buffer.validate(),
            Err(ArtworkError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn oversized_buffer_is_downsampled_preserving_aspect() {
        let buffer = PixelBuffer::solid(800, 400, [200, 10, 10, 255]);
        let upload = buffer.into_upload(200).unwrap();
        assert_eq!((upload.width, upload.height), (200, 100));
        assert_eq!(upload.byte_len(), 200 * 100 * 4);
    }

    #[test]
    fn small_buffer_passes_through_untouched() {
        let buffer = PixelBuffer::solid(64, 64, [9, 9, 9, 255]);
        let upload = buffer.clone().into_upload(512).unwrap();
        assert_eq!(upload, buffer);
    }
}
