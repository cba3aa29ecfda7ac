//! Test doubles for hosts and integration tests
//!
//! [`StubProvider`] is an in-memory dataset with controllable failures and
//! an optional gate that holds decodes until released. [`RecordingBackend`]
//! is a CPU-only [`GpuBackend`] that tracks texture lifetimes and keeps
//! the last frame's draw list.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{ArtworkError, GpuError};
use crate::provider::{DataProvider, ItemId, PixelBuffer};
use crate::render::frame::{FramePlan, QuadKind};
use crate::render::gpu::GpuBackend;

/// Blocks decodes until opened.
#[derive(Debug, Default)]
struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.changed.wait(&mut open);
        }
    }

    fn set(&self, value: bool) {
        *self.open.lock() = value;
        self.changed.notify_all();
    }
}

/// In-memory [`DataProvider`] producing solid-colour tiles.
#[derive(Debug)]
pub struct StubProvider {
    count: AtomicUsize,
    tile_size: (u32, u32),
    failing: Mutex<HashSet<usize>>,
    panicking: Mutex<HashSet<usize>>,
    load_calls: Mutex<Vec<usize>>,
    id_calls: Mutex<Vec<usize>>,
    gate: Option<Gate>,
}

impl StubProvider {
    pub fn new(count: usize) -> Self {
        Self {
            count: AtomicUsize::new(count),
            tile_size: (8, 8),
            failing: Mutex::new(HashSet::new()),
            panicking: Mutex::new(HashSet::new()),
            load_calls: Mutex::new(Vec::new()),
            id_calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Decodes block until [`open_gate`](Self::open_gate) is called.
    pub fn gated(count: usize) -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::new(count)
        }
    }

    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = (width, height);
        self
    }

    pub fn set_item_count(&self, count: usize) {
        self.count.store(count, Ordering::SeqCst);
    }

    pub fn fail_index(&self, index: usize) {
        self.failing.lock().insert(index);
    }

    pub fn heal_index(&self, index: usize) {
        self.failing.lock().remove(&index);
    }

    pub fn panic_on_index(&self, index: usize) {
        self.panicking.lock().insert(index);
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.set(true);
        }
    }

    pub fn close_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.set(false);
        }
    }

    /// Indices passed to `load_artwork`, in call order.
    pub fn load_calls(&self) -> Vec<usize> {
        self.load_calls.lock().clone()
    }

    pub fn id_calls(&self) -> Vec<usize> {
        self.id_calls.lock().clone()
    }

    /// Poll until `load_artwork` has been entered `count` times.
    pub fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        poll_until(timeout, || self.load_calls.lock().len() >= count)
    }
}

impl DataProvider for StubProvider {
    fn item_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn load_artwork(
        &self,
        index: usize,
        _max_dimension: u32,
    ) -> Result<PixelBuffer, ArtworkError> {
        self.load_calls.lock().push(index);
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if self.panicking.lock().contains(&index) {
            panic!("stub provider asked to panic for {index}");
        }
        if self.failing.lock().contains(&index) {
            return Err(ArtworkError::Decode(format!("stub failure {index}")));
        }
        let shade = (index % 256) as u8;
        let (width, height) = self.tile_size;
        Ok(PixelBuffer::solid(width, height, [shade, shade, shade, 255]))
    }

    fn item_id(&self, index: usize) -> Option<ItemId> {
        self.id_calls.lock().push(index);
        Some(ItemId(format!("item-{index}")))
    }
}

/// Opaque handle issued by [`RecordingBackend`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RecordedTexture {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

/// One draw from the last rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub index: usize,
    pub texture_id: u64,
    pub placeholder: bool,
    pub reflection: bool,
    pub alpha: f32,
}

#[derive(Debug, Default)]
struct RecordingState {
    next_id: u64,
    live: HashSet<u64>,
    created: usize,
    destroyed: usize,
    frames: usize,
    last_frame: Vec<RecordedDraw>,
    last_clear: Option<[f32; 4]>,
    viewport: Option<(u32, u32)>,
    fail_creates: bool,
}

/// CPU [`GpuBackend`]. Clones share state, so a test can keep one clone
/// for inspection while the renderer owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn created(&self) -> usize {
        self.state.lock().created
    }

    pub fn destroyed(&self) -> usize {
        self.state.lock().destroyed
    }

    pub fn frames(&self) -> usize {
        self.state.lock().frames
    }

    pub fn last_frame(&self) -> Vec<RecordedDraw> {
        self.state.lock().last_frame.clone()
    }

    pub fn last_clear(&self) -> Option<[f32; 4]> {
        self.state.lock().last_clear
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.state.lock().viewport
    }

    /// Main-quad indices of the last frame, in draw order.
    pub fn last_drawn_indices(&self) -> Vec<usize> {
        self.state
            .lock()
            .last_frame
            .iter()
            .filter(|draw| !draw.reflection)
            .map(|draw| draw.index)
            .collect()
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.state.lock().fail_creates = fail;
    }
}

impl GpuBackend for RecordingBackend {
    type Texture = RecordedTexture;
    type Target = ();

    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
    ) -> Result<RecordedTexture, GpuError> {
        pixels
            .validate()
            .map_err(|err| GpuError::Texture(err.to_string()))?;
        let mut state = self.state.lock();
        if state.fail_creates {
            return Err(GpuError::Texture("creation disabled".to_string()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);
        state.created += 1;
        Ok(RecordedTexture {
            id,
            width: pixels.width,
            height: pixels.height,
        })
    }

    fn destroy_texture(&mut self, texture: RecordedTexture) {
        let mut state = self.state.lock();
        if state.live.remove(&texture.id) {
            state.destroyed += 1;
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.state.lock().viewport = Some((width, height));
    }

    fn render(
        &mut self,
        _target: &(),
        frame: &FramePlan<'_, RecordedTexture>,
    ) -> Result<(), GpuError> {
        let draws = frame
            .draws
            .iter()
            .map(|draw| RecordedDraw {
                index: draw.index,
                texture_id: draw.texture.id,
                placeholder: draw.placeholder,
                reflection: matches!(draw.kind, QuadKind::Reflection { .. }),
                alpha: draw.alpha,
            })
            .collect();
        let mut state = self.state.lock();
        state.frames += 1;
        state.last_frame = draws;
        state.last_clear = Some(frame.clear_color);
        Ok(())
    }
}

/// Poll `done` every few milliseconds until it holds or `timeout` passes.
pub fn poll_until<F>(timeout: Duration, mut done: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if done() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}
