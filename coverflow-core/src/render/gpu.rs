//! GPU ownership rule
//!
//! Every texture handle lives inside a [`GpuResourceOwner`], which is
//! `!Send`: it is created on the render thread and can never leave it.
//! Decode workers only ever see pixel buffers.

use std::marker::PhantomData;

use crate::cache::TextureCache;
use crate::error::GpuError;
use crate::provider::PixelBuffer;
use crate::render::frame::FramePlan;

/// Neutral gray shown for tiles without a resident texture.
pub const PLACEHOLDER_RGBA: [u8; 4] = [96, 96, 96, 255];

/// Thread-affine drawing backend.
pub trait GpuBackend {
    type Texture;
    /// What a frame is drawn into (a texture view, a surface frame, ...).
    type Target: ?Sized;

    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
    ) -> Result<Self::Texture, GpuError>;

    fn destroy_texture(&mut self, texture: Self::Texture);

    fn resize(&mut self, width: u32, height: u32);

    fn render(
        &mut self,
        target: &Self::Target,
        frame: &FramePlan<'_, Self::Texture>,
    ) -> Result<(), GpuError>;
}

/// Owner of the backend, the texture cache, and the placeholder.
pub struct GpuResourceOwner<B: GpuBackend> {
    backend: B,
    textures: TextureCache<B::Texture>,
    placeholder: Option<B::Texture>,
    released: bool,
    _render_thread: PhantomData<*const ()>,
}

impl<B: GpuBackend> std::fmt::Debug for GpuResourceOwner<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuResourceOwner")
            .field("generation", &self.textures.generation())
            .field("resident", &self.textures.len())
            .field("released", &self.released)
            .finish()
    }
}

impl<B: GpuBackend> GpuResourceOwner<B> {
    pub fn new(mut backend: B) -> Result<Self, GpuError> {
        let placeholder = create_placeholder(&mut backend)?;
        Ok(Self {
            backend,
            textures: TextureCache::new(),
            placeholder: Some(placeholder),
            released: false,
            _render_thread: PhantomData,
        })
    }

    pub fn generation(&self) -> u64 {
        self.textures.generation()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn textures(&self) -> &TextureCache<B::Texture> {
        &self.textures
    }

    pub fn is_resident(&self, index: usize) -> bool {
        self.textures.contains(index)
    }

    pub fn resident_count(&self) -> usize {
        self.textures.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn lookup(&self) -> TextureLookup<'_, B::Texture> {
        TextureLookup {
            textures: &self.textures,
            placeholder: self.placeholder.as_ref(),
        }
    }

    /// Borrow the backend mutably alongside a read-only texture lookup, so
    /// a frame plan can reference textures while it is rendered.
    pub fn split(&mut self) -> (&mut B, TextureLookup<'_, B::Texture>) {
        let lookup = TextureLookup {
            textures: &self.textures,
            placeholder: self.placeholder.as_ref(),
        };
        (&mut self.backend, lookup)
    }

    /// Create a texture for `index` and make it resident.
    pub fn upload(
        &mut self,
        index: usize,
        pixels: &PixelBuffer,
    ) -> Result<(), GpuError> {
        let texture = self.backend.create_texture(pixels)?;
        if let Some(replaced) = self.textures.insert(index, texture) {
            self.backend.destroy_texture(replaced);
        }
        Ok(())
    }

    /// Destroy every texture farther than `distance` from `center`.
    pub fn evict_outside(&mut self, center: f32, distance: f32) -> usize {
        let evicted = self.textures.evict_outside(center, distance);
        self.destroy_all(evicted)
    }

    pub fn evict_out_of_range(&mut self, item_count: usize) -> usize {
        let evicted = self.textures.evict_out_of_range(item_count);
        self.destroy_all(evicted)
    }

    /// Adopt a recreated context. Old handles are forgotten, not
    /// destroyed, since they died with the previous context. Returns the
    /// new generation.
    pub fn reset_context(&mut self, backend: B) -> Result<u64, GpuError> {
        let generation = self.textures.invalidate();
        self.placeholder = None;
        self.backend = backend;
        self.placeholder = Some(create_placeholder(&mut self.backend)?);
        Ok(generation)
    }

    /// Destroy every texture, including the placeholder.
    pub fn release_all(&mut self) {
        let textures = self.textures.drain();
        let count = self.destroy_all(textures);
        if let Some(placeholder) = self.placeholder.take() {
            self.backend.destroy_texture(placeholder);
        }
        self.released = true;
        log::debug!("Released {count} carousel textures");
    }

    pub fn render(
        &mut self,
        target: &B::Target,
        frame: &FramePlan<'_, B::Texture>,
    ) -> Result<(), GpuError> {
        self.backend.render(target, frame)
    }

    fn destroy_all(&mut self, textures: Vec<B::Texture>) -> usize {
        let count = textures.len();
        for texture in textures {
            self.backend.destroy_texture(texture);
        }
        count
    }
}

/// Read-only view resolving indices to resident or placeholder textures.
#[derive(Debug)]
pub struct TextureLookup<'a, T> {
    textures: &'a TextureCache<T>,
    placeholder: Option<&'a T>,
}

impl<T> Clone for TextureLookup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TextureLookup<'_, T> {}

impl<'a, T> TextureLookup<'a, T> {
    /// The texture to draw for `index` and whether it is the placeholder.
    pub fn resolve(&self, index: usize) -> Option<(&'a T, bool)> {
        match self.textures.get(index) {
            Some(texture) => Some((texture, false)),
            None => self.placeholder.map(|placeholder| (placeholder, true)),
        }
    }
}

fn create_placeholder<B: GpuBackend>(
    backend: &mut B,
) -> Result<B::Texture, GpuError> {
    backend.create_texture(&PixelBuffer::solid(2, 2, PLACEHOLDER_RGBA))
}
