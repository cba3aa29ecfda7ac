//! Decode worker pool
//!
//! A dedicated tokio runtime whose blocking pool is capped at the
//! configured worker count. Each claimed index becomes one
//! `spawn_blocking` job that calls the [`DataProvider`], bounds the
//! result, and sends it to the render thread. The claim is released on
//! every failure path here; a successful upload releases it on the render
//! thread once the texture exists. Failed attempts are recorded so window
//! requests skip them until the index leaves the window.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};

use crate::cache::{FailedSet, InFlightSet};
use crate::decode::upload::{UploadCommand, UploadSender};
use crate::error::{ArtworkError, RendererError};
use crate::provider::DataProvider;

pub struct DecodeScheduler {
    provider: Arc<dyn DataProvider>,
    in_flight: Arc<InFlightSet>,
    failed: Arc<FailedSet>,
    uploads: UploadSender,
    runtime: Mutex<Option<Runtime>>,
    shut_down: Arc<AtomicBool>,
    max_dimension: AtomicU32,
}

impl std::fmt::Debug for DecodeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeScheduler")
            .field("in_flight", &self.in_flight.len())
            .field("failed", &self.failed.len())
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .field("max_dimension", &self.max_dimension())
            .finish()
    }
}

impl DecodeScheduler {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        in_flight: Arc<InFlightSet>,
        uploads: UploadSender,
        workers: usize,
        max_dimension: u32,
    ) -> Result<Self, RendererError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers.max(1))
            .thread_name("coverflow-decode")
            .build()
            .map_err(RendererError::Scheduler)?;

        log::debug!(
            "Decode scheduler started with {} workers, max dimension {}",
            workers.max(1),
            max_dimension
        );

        Ok(Self {
            provider,
            in_flight,
            failed: Arc::new(FailedSet::new()),
            uploads,
            runtime: Mutex::new(Some(runtime)),
            shut_down: Arc::new(AtomicBool::new(false)),
            max_dimension: AtomicU32::new(max_dimension.max(1)),
        })
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider> {
        &self.provider
    }

    pub fn in_flight(&self) -> &Arc<InFlightSet> {
        &self.in_flight
    }

    /// Indices whose last attempt failed.
    pub fn failed(&self) -> &Arc<FailedSet> {
        &self.failed
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension.load(Ordering::Relaxed)
    }

    /// Applies to decodes submitted after the call.
    pub fn set_max_dimension(&self, max_dimension: u32) {
        self.max_dimension
            .store(max_dimension.max(1), Ordering::Relaxed);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Submit every index within `radius` of `center` that is not resident,
    /// not in flight, and has not failed under `generation`. Nearest first,
    /// ties to the lower index. Returns the indices actually submitted, in
    /// order.
    pub fn request_prefetch<F>(
        &self,
        center: usize,
        radius: usize,
        generation: u64,
        is_resident: F,
    ) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        let item_count = self.provider.item_count();
        if item_count == 0 || self.is_shut_down() {
            return Vec::new();
        }
        let center = center.min(item_count - 1);
        let first = center.saturating_sub(radius);
        let last = center.saturating_add(radius).min(item_count - 1);

        let mut candidates: Vec<usize> = (first..=last)
            .filter(|&index| {
                !is_resident(index)
                    && !self.in_flight.contains(index, generation)
                    && !self.failed.contains(index, generation)
            })
            .collect();
        candidates.sort_by_key(|&index| (index.abs_diff(center), index));

        candidates
            .into_iter()
            .filter(|&index| self.enqueue_load(index, generation))
            .collect()
    }

    /// Claim `index` and submit one decode attempt for it. A recorded
    /// failure does not block an explicit request.
    ///
    /// Returns `false` when the index is out of range, already claimed, or
    /// the pool has been shut down.
    pub fn enqueue_load(&self, index: usize, generation: u64) -> bool {
        if self.is_shut_down() || index >= self.provider.item_count() {
            return false;
        }
        if !self.in_flight.claim(index, generation) {
            return false;
        }

        let job = DecodeJob {
            provider: Arc::clone(&self.provider),
            in_flight: Arc::clone(&self.in_flight),
            failed: Arc::clone(&self.failed),
            uploads: self.uploads.clone(),
            shut_down: Arc::clone(&self.shut_down),
            index,
            generation,
            max_dimension: self.max_dimension(),
        };

        let runtime = self.runtime.lock();
        match runtime.as_ref() {
            Some(runtime) => {
                runtime.spawn_blocking(move || job.run());
                true
            }
            None => {
                self.in_flight.release(index, generation);
                false
            }
        }
    }

    /// Stop the pool immediately. Running decodes are abandoned, not
    /// awaited; their results are discarded.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
        }
        log::info!("Decode scheduler shut down");
    }
}

impl Drop for DecodeScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One decode attempt, moved onto a blocking worker.
struct DecodeJob {
    provider: Arc<dyn DataProvider>,
    in_flight: Arc<InFlightSet>,
    failed: Arc<FailedSet>,
    uploads: UploadSender,
    shut_down: Arc<AtomicBool>,
    index: usize,
    generation: u64,
    max_dimension: u32,
}

impl DecodeJob {
    fn run(self) {
        let index = self.index;
        if self.shut_down.load(Ordering::Acquire)
            || index >= self.provider.item_count()
        {
            self.release();
            return;
        }

        let provider = &self.provider;
        let max_dimension = self.max_dimension;
        let loaded = panic::catch_unwind(AssertUnwindSafe(|| {
            provider.load_artwork(index, max_dimension)
        }));

        let buffer = match loaded {
            Ok(Ok(buffer)) => buffer,
            Ok(Err(ArtworkError::Missing)) => {
                log::debug!("No artwork for index {index}");
                self.fail();
                return;
            }
            Ok(Err(err)) => {
                log::warn!("Artwork decode failed for index {index}: {err}");
                self.fail();
                return;
            }
            Err(_) => {
                log::error!("Data provider panicked decoding index {index}");
                self.fail();
                return;
            }
        };

        let pixels = match buffer.into_upload(max_dimension) {
            Ok(pixels) => pixels,
            Err(err) => {
                log::warn!("Rejected artwork for index {index}: {err}");
                self.fail();
                return;
            }
        };

        if self.shut_down.load(Ordering::Acquire) {
            self.release();
            return;
        }

        let command = UploadCommand::Upload {
            generation: self.generation,
            index,
            pixels,
        };
        if self.uploads.send(command).is_err() {
            log::debug!("Render thread gone; dropping upload for {index}");
            self.release();
        }
    }

    fn release(&self) {
        self.in_flight.release(self.index, self.generation);
    }

    // Recorded before the claim goes so a window request never sees the
    // index as neither claimed nor failed.
    fn fail(&self) {
        self.failed.record(self.index, self.generation);
        self.release();
    }
}
