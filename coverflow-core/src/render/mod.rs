//! Frame construction and the GPU boundary.

pub mod frame;
pub mod gpu;
pub mod pipeline;
pub mod row_padding;
pub mod transform;
#[cfg(feature = "wgpu")]
pub mod wgpu_backend;

pub use frame::{FramePlan, QuadDraw, QuadKind};
pub use gpu::{GpuBackend, GpuResourceOwner, TextureLookup};
pub use pipeline::{CarouselRenderer, RendererStats};
#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuBackend, WgpuTexture};
