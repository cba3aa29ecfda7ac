//! Backend-neutral description of one frame.

use glam::Mat4;

/// Which of a tile's two quads a draw is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadKind {
    Main,
    /// Mirrored copy below the tile; per-pixel alpha fades toward its
    /// bottom edge and is scaled by `strength`.
    Reflection { strength: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct QuadDraw<'a, T> {
    pub index: usize,
    pub texture: &'a T,
    /// Whether `texture` is the shared placeholder.
    pub placeholder: bool,
    pub mvp: Mat4,
    pub alpha: f32,
    pub kind: QuadKind,
}

/// Draws in submission order (back to front), plus the clear colour.
#[derive(Debug, Clone)]
pub struct FramePlan<'a, T> {
    pub clear_color: [f32; 4],
    pub draws: Vec<QuadDraw<'a, T>>,
}

impl<T> FramePlan<'_, T> {
    /// A frame that only clears.
    pub fn empty(clear_color: [f32; 4]) -> Self {
        Self {
            clear_color,
            draws: Vec::new(),
        }
    }
}
