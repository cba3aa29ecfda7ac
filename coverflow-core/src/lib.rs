//! Coverflow core
//!
//! A virtualized 3D cover-flow carousel renderer. The dataset lives behind
//! a [`DataProvider`]; the renderer decodes artwork on a small worker pool,
//! keeps GPU textures resident only around the viewport, and draws a band
//! of perspective tiles with optional mirrored reflections.
//!
//! Threads
//! - The render thread owns a [`CarouselRenderer`] and is the only place
//!   GPU resources are created or destroyed.
//! - Decode workers talk to the provider and hand pixel buffers back
//!   through a command queue.
//! - Any thread may drive input, settings, and picking through a
//!   [`CarouselHandle`]; events arrive on the receiver returned by
//!   [`CarouselRenderer::new`].

pub mod cache;
pub mod decode;
pub mod error;
pub mod handle;
pub mod motion;
pub mod notifier;
pub mod picking;
pub mod provider;
pub mod render;
/// Test doubles, exposed so hosts can exercise their integration too
pub mod testing;

pub use coverflow_config as config;
pub use error::{ArtworkError, GpuError, RendererError};
pub use handle::CarouselHandle;
pub use motion::{ScrollState, SnapEvent};
pub use notifier::{CarouselEvent, EventReceiver};
pub use picking::{PickBuffer, PickRecord};
pub use provider::{DataProvider, ItemId, PixelBuffer};
pub use render::{
    CarouselRenderer, FramePlan, GpuBackend, GpuResourceOwner, QuadKind,
    RendererStats,
};
