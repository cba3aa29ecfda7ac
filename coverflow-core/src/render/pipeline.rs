//! Per-frame orchestration on the render thread
//!
//! Order within a frame: apply queued uploads, integrate physics, resolve
//! the visual center, request decodes for the window, build the draw list
//! back to front, publish pick records, evict, then notify.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use coverflow_config::CarouselSettings;

use crate::cache::InFlightSet;
use crate::decode::upload::Applied;
use crate::decode::{DecodeScheduler, UploadCommand, UploadQueue};
use crate::error::{self, GpuError};
use crate::handle::{CarouselHandle, Shared};
use crate::notifier::{EventReceiver, FrameObservation, ListenerNotifier};
use crate::picking::PickRecord;
use crate::provider::DataProvider;
use crate::render::frame::{FramePlan, QuadDraw, QuadKind};
use crate::render::gpu::{GpuBackend, GpuResourceOwner};
use crate::render::transform::{self, BandMotion};

/// Counters describing the most recent frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub generation: u64,
    pub resident_textures: usize,
    pub in_flight: usize,
    pub pending_uploads: usize,
    pub uploads_last_frame: usize,
    pub evicted_last_frame: usize,
    pub visible_range: Option<RangeInclusive<usize>>,
    pub frame_count: u64,
}

/// Render-thread half of the carousel. Not `Send` once a GPU context has
/// been attached.
pub struct CarouselRenderer<B: GpuBackend> {
    shared: Arc<Shared>,
    gpu: Option<GpuResourceOwner<B>>,
    uploads: UploadQueue,
    notifier: ListenerNotifier,
    viewport: Option<(u32, u32)>,
    /// Center index of the last window-level prefetch.
    prefetch_anchor: Option<usize>,
    stats: RendererStats,
}

impl<B: GpuBackend> std::fmt::Debug for CarouselRenderer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselRenderer")
            .field("gpu", &self.gpu)
            .field("viewport", &self.viewport)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<B: GpuBackend> CarouselRenderer<B> {
    /// Start the decode pool. GPU work waits for
    /// [`on_context_created`](Self::on_context_created).
    pub fn new(
        provider: Arc<dyn DataProvider>,
        settings: CarouselSettings,
    ) -> error::Result<(Self, EventReceiver)> {
        let settings = settings.normalized();
        let (sender, uploads) = UploadQueue::channel();
        let scheduler = DecodeScheduler::new(
            provider,
            Arc::new(InFlightSet::new()),
            sender.clone(),
            settings.decode.workers,
            settings.decode.max_dimension,
        )?;
        let shared =
            Arc::new(Shared::new(settings, Arc::new(scheduler), sender));
        let (notifier, events) =
            ListenerNotifier::new(settings.physics.notify_epsilon);

        let renderer = Self {
            shared,
            gpu: None,
            uploads,
            notifier,
            viewport: None,
            prefetch_anchor: None,
            stats: RendererStats::default(),
        };
        Ok((renderer, events))
    }

    pub fn handle(&self) -> CarouselHandle {
        CarouselHandle::new(Arc::clone(&self.shared))
    }

    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    pub fn generation(&self) -> Option<u64> {
        self.gpu.as_ref().map(GpuResourceOwner::generation)
    }

    pub fn gpu(&self) -> Option<&GpuResourceOwner<B>> {
        self.gpu.as_ref()
    }

    pub fn in_flight(&self) -> &InFlightSet {
        self.shared.scheduler.in_flight()
    }

    /// A GPU context was created or recreated.
    ///
    /// Every resident texture, in-flight claim, and recorded failure is
    /// forgotten and the current window is prefetched again under the new
    /// generation.
    pub fn on_context_created(&mut self, backend: B) -> Result<(), GpuError> {
        if self.shared.released.load(Ordering::Acquire) {
            log::debug!("Ignoring context creation after release");
            return Ok(());
        }

        let mut backend = backend;
        if let Some((width, height)) = self.viewport {
            backend.resize(width, height);
        }
        let generation = match self.gpu.as_mut() {
            Some(gpu) => gpu.reset_context(backend)?,
            None => {
                let gpu = GpuResourceOwner::new(backend)?;
                let generation = gpu.generation();
                self.gpu = Some(gpu);
                generation
            }
        };
        self.shared.scheduler.in_flight().clear();
        self.shared.scheduler.failed().clear();
        log::info!("Carousel GPU context ready (generation {generation})");

        self.prefetch_anchor = None;
        self.prefetch_window();
        Ok(())
    }

    pub fn on_viewport_resized(&mut self, width: u32, height: u32) {
        self.viewport = (width > 0 && height > 0).then_some((width, height));
        self.shared.picks.set_viewport(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.backend_mut().resize(width, height);
        }
    }

    /// Draw one frame `dt` seconds after the previous one.
    pub fn draw_frame(
        &mut self,
        target: &B::Target,
        dt: f32,
    ) -> Result<(), GpuError> {
        let settings = *self.shared.settings.read();
        self.notifier.set_epsilon(settings.physics.notify_epsilon);
        let item_count = self.shared.item_count();

        self.apply_uploads(&settings, item_count);
        if self.gpu.as_ref().is_some_and(GpuResourceOwner::is_released) {
            self.gpu = None;
            self.shared.picks.clear();
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        self.stats.frame_count += 1;

        if item_count == 0 {
            self.shared.picks.clear();
            self.shared.scheduler.failed().clear();
            self.stats.evicted_last_frame = gpu.evict_out_of_range(0);
            self.stats.visible_range = None;
            self.refresh_stats();
            let frame = FramePlan::empty(settings.appearance.clear_color);
            return self.render(target, &frame);
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, settings.physics.max_frame_dt())
        } else {
            0.0
        };
        let (motion, observation) = {
            let mut scroll = self.shared.scroll.lock();
            scroll.integrate(dt, item_count);
            let centered_index = scroll.centered_index(item_count);
            let motion = BandMotion {
                center: scroll.visual_center(),
                drag_y_offset: scroll.drag_y_offset(),
                drag_pitch_degrees: scroll.drag_pitch_degrees(),
                centered_index: centered_index.unwrap_or(0),
                click_scale: scroll.click_scale_factor(),
            };
            let observation = FrameObservation {
                snap_events: scroll.take_snap_events(),
                offset: scroll.scroll_offset(),
                centered_index,
                force: scroll.take_force_notify(),
            };
            (motion, observation)
        };

        let visible = visible_window(
            motion.center,
            settings.radii.visible,
            item_count,
        );

        // Failures outside the prefetch window get a fresh attempt on
        // re-entry.
        self.shared.scheduler.failed().retain_window(
            motion.centered_index,
            settings.radii.prefetch,
            gpu.generation(),
        );

        let dirty = self.shared.take_dirty();
        if dirty || self.prefetch_anchor != Some(motion.centered_index) {
            self.prefetch_window();
        }
        if let Some(range) = visible.clone() {
            self.request_visible(range, motion.center, &settings);
        }

        let view_proj = transform::view_projection(&settings, self.viewport);
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        let mut order: Vec<usize> =
            visible.clone().into_iter().flatten().collect();
        order.sort_by(|a, b| {
            let da = (*a as f32 - motion.center).abs();
            let db = (*b as f32 - motion.center).abs();
            db.total_cmp(&da).then(a.cmp(b))
        });

        let alpha = settings.appearance.fade_alpha;
        let strength = settings.appearance.reflection_strength;
        let (backend, lookup) = gpu.split();
        let mut draws = Vec::with_capacity(order.len() * 2);
        let mut picks = Vec::with_capacity(order.len());
        for index in order {
            let Some((texture, placeholder)) = lookup.resolve(index) else {
                continue;
            };
            let pose = transform::tile_pose(index, &settings, &motion);
            if let Some(reflection) = pose.reflection {
                draws.push(QuadDraw {
                    index,
                    texture,
                    placeholder,
                    mvp: view_proj * reflection,
                    alpha,
                    kind: QuadKind::Reflection { strength },
                });
            }
            let mvp = view_proj * pose.model;
            draws.push(QuadDraw {
                index,
                texture,
                placeholder,
                mvp,
                alpha,
                kind: QuadKind::Main,
            });
            if let Some(bounds) = transform::project_bounds(&mvp) {
                picks.push(PickRecord { index, bounds });
            }
        }
        self.shared.picks.publish(picks);

        let frame = FramePlan {
            clear_color: settings.appearance.clear_color,
            draws,
        };
        let rendered = backend.render(target, &frame);
        drop(frame);

        let keep = settings.radii.eviction_distance();
        let mut evicted = gpu.evict_out_of_range(item_count);
        evicted += gpu.evict_outside(motion.center, keep);
        if evicted > 0 {
            log::trace!(
                "Evicted {evicted} textures around center {:.2}",
                motion.center
            );
        }
        self.stats.evicted_last_frame = evicted;
        self.stats.visible_range = visible;
        self.refresh_stats();

        self.notifier.dispatch(observation);
        rendered
    }

    /// Drain the command queue within the frame's upload budget.
    fn apply_uploads(
        &mut self,
        settings: &CarouselSettings,
        item_count: usize,
    ) {
        let in_flight = Arc::clone(self.shared.scheduler.in_flight());
        let failed = Arc::clone(self.shared.scheduler.failed());
        let center = self.shared.scroll.lock().visual_center();
        let keep = settings.radii.eviction_distance();
        let gpu = &mut self.gpu;

        let stats = self.uploads.drain(
            settings.decode.max_uploads_per_frame,
            |command| match command {
                UploadCommand::ReleaseGpu => {
                    if let Some(gpu) = gpu.as_mut() {
                        gpu.release_all();
                    }
                    Applied::Control
                }
                UploadCommand::Upload {
                    generation,
                    index,
                    pixels,
                } => {
                    let applied = match gpu.as_mut() {
                        Some(gpu)
                            if !gpu.is_released()
                                && gpu.generation() == generation
                                && index < item_count
                                && (index as f32 - center).abs() <= keep =>
                        {
                            match gpu.upload(index, &pixels) {
                                Ok(()) => Applied::Uploaded,
                                Err(err) => {
                                    log::warn!(
                                        "Texture upload failed for index \
                                         {index}: {err}"
                                    );
                                    failed.record(index, generation);
                                    Applied::Dropped
                                }
                            }
                        }
                        _ => {
                            log::debug!(
                                "Dropping upload for index {index} \
                                 (generation {generation})"
                            );
                            Applied::Dropped
                        }
                    };
                    in_flight.release(index, generation);
                    applied
                }
            },
        );
        self.stats.uploads_last_frame = stats.uploaded;
    }

    /// Window-level prefetch around the centered index.
    fn prefetch_window(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let settings = *self.shared.settings.read();
        let item_count = self.shared.item_count();
        let Some(center) =
            self.shared.scroll.lock().centered_index(item_count)
        else {
            return;
        };
        let submitted = self.shared.scheduler.request_prefetch(
            center,
            settings.radii.prefetch,
            gpu.generation(),
            |index| gpu.is_resident(index),
        );
        if !submitted.is_empty() {
            log::trace!(
                "Prefetch around {center} submitted {} decodes",
                submitted.len()
            );
        }
        self.prefetch_anchor = Some(center);
    }

    /// Tight per-frame check: every visible index within the prefetch
    /// radius that is not resident, not in flight, and has not failed in
    /// the current window gets requested.
    fn request_visible(
        &self,
        range: RangeInclusive<usize>,
        center: f32,
        settings: &CarouselSettings,
    ) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let generation = gpu.generation();
        let scheduler = &self.shared.scheduler;
        let radius = settings.radii.prefetch as f32;
        for index in range {
            if (index as f32 - center).abs() > radius
                || gpu.is_resident(index)
                || scheduler.in_flight().contains(index, generation)
                || scheduler.failed().contains(index, generation)
            {
                continue;
            }
            scheduler.enqueue_load(index, generation);
        }
    }

    fn refresh_stats(&mut self) {
        if let Some(gpu) = self.gpu.as_ref() {
            self.stats.generation = gpu.generation();
            self.stats.resident_textures = gpu.resident_count();
        }
        self.stats.in_flight = self.shared.scheduler.in_flight().len();
        self.stats.pending_uploads = self.uploads.pending();
    }

    fn render(
        &mut self,
        target: &B::Target,
        frame: &FramePlan<'_, B::Texture>,
    ) -> Result<(), GpuError> {
        match self.gpu.as_mut() {
            Some(gpu) => gpu.render(target, frame),
            None => Ok(()),
        }
    }
}

/// Indices within `radius` of a fractional `center`, clipped to range.
pub fn visible_window(
    center: f32,
    radius: usize,
    item_count: usize,
) -> Option<RangeInclusive<usize>> {
    if item_count == 0 || !center.is_finite() {
        return None;
    }
    let max_index = (item_count - 1) as f32;
    let first = (center - radius as f32).floor().clamp(0.0, max_index);
    let last = (center + radius as f32).ceil().clamp(0.0, max_index);
    Some(first as usize..=last as usize)
}
