//! Row alignment for texture uploads.
//!
//! `write_texture` requires `bytes_per_row` to be a multiple of
//! `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`; decoded tiles are tightly packed.

use std::borrow::Cow;

/// Row stride in bytes for `width` RGBA8 pixels, rounded up to `align`.
pub fn padded_stride(width: u32, align: u32) -> u32 {
    let row = width * 4;
    if row == 0 || align == 0 {
        return row;
    }
    row.div_ceil(align) * align
}

/// Re-lay tightly packed RGBA8 rows at `padded_stride(width, align)`.
///
/// Borrows the input when no padding is needed. Returns the data and the
/// stride actually used.
pub fn pad_rgba_rows(
    pixels: &[u8],
    width: u32,
    height: u32,
    align: u32,
) -> (Cow<'_, [u8]>, u32) {
    let row = width as usize * 4;
    let stride = padded_stride(width, align);
    if row == stride as usize || height == 0 {
        return (Cow::Borrowed(pixels), stride);
    }

    let mut padded = vec![0u8; stride as usize * height as usize];
    for (src, dst) in pixels
        .chunks_exact(row)
        .zip(padded.chunks_exact_mut(stride as usize))
    {
        dst[..row].copy_from_slice(src);
    }
    (Cow::Owned(padded), stride)
}
