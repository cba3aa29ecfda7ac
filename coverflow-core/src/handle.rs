//! Cross-thread control surface
//!
//! Input, settings, and picking calls may come from any thread. They
//! mutate shared state under short locks and mark the renderer dirty; the
//! render thread picks the changes up on its next frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use coverflow_config::{CarouselSettings, Orientation, VerticalDragSettings};
use parking_lot::{Mutex, RwLock};

use crate::decode::{DecodeScheduler, UploadCommand, UploadSender};
use crate::motion::ScrollState;
use crate::picking::PickBuffer;
use crate::provider::{DataProvider, ItemId};

/// State shared between the handle and the render thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) scroll: Mutex<ScrollState>,
    pub(crate) settings: RwLock<CarouselSettings>,
    pub(crate) picks: PickBuffer,
    pub(crate) scheduler: Arc<DecodeScheduler>,
    pub(crate) uploads: UploadSender,
    /// Settings or position changed outside a frame.
    pub(crate) dirty: AtomicBool,
    pub(crate) released: AtomicBool,
}

impl Shared {
    pub(crate) fn new(
        settings: CarouselSettings,
        scheduler: Arc<DecodeScheduler>,
        uploads: UploadSender,
    ) -> Self {
        Self {
            scroll: Mutex::new(ScrollState::new(
                settings.physics,
                settings.vertical_drag,
            )),
            settings: RwLock::new(settings),
            picks: PickBuffer::new(),
            scheduler,
            uploads,
            dirty: AtomicBool::new(true),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn DataProvider> {
        self.scheduler.provider()
    }

    pub(crate) fn item_count(&self) -> usize {
        self.provider().item_count()
    }

    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Cloneable handle for driving the carousel from input or UI threads.
#[derive(Debug, Clone)]
pub struct CarouselHandle {
    shared: Arc<Shared>,
}

impl CarouselHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    fn with_scroll<F>(&self, apply: F)
    where
        F: FnOnce(&mut ScrollState, usize),
    {
        if self.shared.is_released() {
            return;
        }
        let item_count = self.shared.item_count();
        apply(&mut self.shared.scroll.lock(), item_count);
        self.shared.mark_dirty();
    }

    pub fn scroll_by(&self, delta: f32) {
        self.with_scroll(|scroll, count| scroll.scroll_by(delta, count));
    }

    pub fn snap_to_nearest(&self) {
        self.with_scroll(|scroll, count| scroll.snap_to_nearest(count));
    }

    pub fn set_scroll_offset(&self, offset: f32, smooth: bool) {
        self.with_scroll(|scroll, count| {
            scroll.set_scroll_offset(offset, smooth, count)
        });
    }

    pub fn end_scroll(&self) {
        self.with_scroll(|scroll, _| scroll.end_scroll());
    }

    /// Release of a drag with the pointer's velocity in items/s.
    ///
    /// Overscrolled releases bounce back; slow releases snap; anything
    /// faster flings.
    pub fn release_with_velocity(&self, velocity: f32) {
        let min_velocity =
            self.shared.settings.read().physics.fling_min_velocity;
        self.with_scroll(|scroll, count| {
            if scroll.overscroll() != 0.0 {
                scroll.end_scroll();
            } else if velocity.abs() < min_velocity {
                scroll.snap_to_nearest(count);
            } else {
                scroll.fling(velocity, count);
            }
        });
    }

    pub fn fling(&self, velocity: f32) {
        self.with_scroll(|scroll, count| scroll.fling(velocity, count));
    }

    pub fn step_by(&self, steps: i64) {
        self.with_scroll(|scroll, count| scroll.step_by(steps, count));
    }

    pub fn set_drag_vertical(&self, normalized: f32) {
        self.with_scroll(|scroll, _| scroll.set_drag_vertical(normalized));
    }

    pub fn end_vertical_drag(&self) {
        self.with_scroll(|scroll, _| scroll.end_vertical_drag());
    }

    pub fn trigger_click_scale(&self) {
        self.with_scroll(|scroll, _| scroll.trigger_click_scale());
    }

    pub fn scroll_offset(&self) -> f32 {
        self.shared.scroll.lock().scroll_offset()
    }

    pub fn overscroll(&self) -> f32 {
        self.shared.scroll.lock().overscroll()
    }

    pub fn centered_index(&self) -> Option<usize> {
        let item_count = self.shared.item_count();
        self.shared.scroll.lock().centered_index(item_count)
    }

    pub fn item_count(&self) -> usize {
        self.shared.item_count()
    }

    pub fn pick_index_at_screen_x(&self, x: f32) -> Option<usize> {
        let item_count = self.shared.item_count();
        self.shared.picks.pick_index_at_screen_x(x, item_count)
    }

    pub fn pick_index_at_screen_y(&self, y: f32) -> Option<usize> {
        let item_count = self.shared.item_count();
        self.shared.picks.pick_index_at_screen_y(y, item_count)
    }

    /// Host identifier for `index`; out-of-range indices never reach the
    /// provider.
    pub fn item_id_at(&self, index: usize) -> Option<ItemId> {
        let provider = self.shared.provider();
        if index >= provider.item_count() {
            return None;
        }
        provider.item_id(index)
    }

    pub fn settings(&self) -> CarouselSettings {
        *self.shared.settings.read()
    }

    /// Edit settings in place; the result is normalized before use.
    pub fn update_settings<F>(&self, edit: F)
    where
        F: FnOnce(&mut CarouselSettings),
    {
        let updated = {
            let mut settings = self.shared.settings.write();
            edit(&mut settings);
            *settings = settings.normalized();
            *settings
        };
        {
            let mut scroll = self.shared.scroll.lock();
            scroll.set_physics(updated.physics);
            scroll.set_drag_bounds(updated.vertical_drag);
        }
        self.shared
            .scheduler
            .set_max_dimension(updated.decode.max_dimension);
        self.shared.mark_dirty();
    }

    pub fn set_visible_radius(&self, radius: usize) {
        self.update_settings(|s| s.radii.set_visible(radius));
    }

    pub fn set_prefetch_radius(&self, radius: usize) {
        self.update_settings(|s| s.radii.set_prefetch(radius));
    }

    pub fn set_keep_radius(&self, radius: usize) {
        self.update_settings(|s| s.radii.set_keep(radius));
    }

    pub fn set_fade_alpha(&self, alpha: f32) {
        self.update_settings(|s| s.appearance.fade_alpha = alpha);
    }

    pub fn set_depth_parallax(&self, enabled: bool) {
        self.update_settings(|s| s.appearance.depth_parallax = enabled);
    }

    pub fn set_reflection(&self, gap: f32, strength: f32) {
        self.update_settings(|s| {
            s.appearance.reflection_gap = gap;
            s.appearance.reflection_strength = strength;
        });
    }

    pub fn set_side_scale(&self, side_scale: f32) {
        self.update_settings(|s| s.appearance.side_scale = side_scale);
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        self.update_settings(|s| s.orientation = orientation);
    }

    pub fn set_vertical_drag_bounds(&self, bounds: VerticalDragSettings) {
        self.update_settings(|s| s.vertical_drag = bounds);
    }

    /// Tear down: decode workers stop immediately and the render thread
    /// destroys every GPU resource on its next frame.
    pub fn release(&self) {
        if self.shared.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.scheduler.shutdown();
        if self.shared.uploads.send(UploadCommand::ReleaseGpu).is_err() {
            log::debug!("Render thread already gone at release");
        }
        self.shared.picks.clear();
    }

    pub fn is_released(&self) -> bool {
        self.shared.is_released()
    }
}
