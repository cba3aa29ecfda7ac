#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use coverflow_core::config::CarouselSettings;
use coverflow_core::testing::{RecordingBackend, StubProvider};
use coverflow_core::{CarouselEvent, CarouselRenderer, EventReceiver};

pub const FRAME_DT: f32 = 1.0 / 60.0;
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Radii 5/7/8, two decode workers, no upload budget.
pub fn settings() -> CarouselSettings {
    let mut settings = CarouselSettings::default();
    settings.radii.visible = 5;
    settings.radii.prefetch = 7;
    settings.radii.keep = 8;
    settings.decode.workers = 2;
    settings.decode.max_uploads_per_frame = 0;
    settings
}

pub struct Harness {
    pub renderer: CarouselRenderer<RecordingBackend>,
    pub events: EventReceiver,
    pub provider: Arc<StubProvider>,
    pub backend: RecordingBackend,
}

impl Harness {
    pub fn new(provider: StubProvider, settings: CarouselSettings) -> Self {
        init_logging();
        let provider = Arc::new(provider);
        let (renderer, events) =
            CarouselRenderer::new(provider.clone(), settings)
                .expect("renderer");
        Self {
            renderer,
            events,
            provider,
            backend: RecordingBackend::new(),
        }
    }

    /// Attach the recording backend and size the viewport.
    pub fn attach(&mut self) {
        self.renderer.on_viewport_resized(800, 600);
        self.renderer
            .on_context_created(self.backend.clone())
            .expect("context");
    }

    pub fn frame(&mut self) {
        self.renderer.draw_frame(&(), FRAME_DT).expect("frame");
    }

    /// Draw frames until `done` holds or the timeout passes.
    pub fn pump_until<F>(&mut self, mut done: F) -> bool
    where
        F: FnMut(&CarouselRenderer<RecordingBackend>) -> bool,
    {
        let deadline = std::time::Instant::now() + TIMEOUT;
        loop {
            self.frame();
            if done(&self.renderer) {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    pub fn resident(&self) -> usize {
        self.renderer
            .gpu()
            .map(|gpu| gpu.resident_count())
            .unwrap_or(0)
    }

    pub fn drain_events(&mut self) -> Vec<CarouselEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok()).collect()
    }
}
