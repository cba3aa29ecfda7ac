//! Screen-space hit testing
//!
//! The render thread replaces the pick records once per frame; any thread
//! may query them. Both sides hold the lock only long enough to swap or
//! scan a short vector.

use parking_lot::Mutex;

use crate::render::transform::NdcBounds;

/// Screen-space footprint of one drawn tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRecord {
    pub index: usize,
    pub bounds: NdcBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Default)]
struct PickFrame {
    records: Vec<PickRecord>,
    viewport: Option<(u32, u32)>,
}

#[derive(Debug, Default)]
pub struct PickBuffer {
    frame: Mutex<PickFrame>,
}

impl PickBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        let viewport = (width > 0 && height > 0).then_some((width, height));
        self.frame.lock().viewport = viewport;
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.frame.lock().viewport
    }

    /// Replace the records with this frame's, in draw order.
    pub fn publish(&self, records: Vec<PickRecord>) {
        self.frame.lock().records = records;
    }

    pub fn clear(&self) {
        self.frame.lock().records.clear();
    }

    /// Tile under screen column `x` (pixels from the left edge).
    pub fn pick_index_at_screen_x(
        &self,
        x: f32,
        item_count: usize,
    ) -> Option<usize> {
        self.pick(Axis::X, x, item_count)
    }

    /// Tile under screen row `y` (pixels from the top edge).
    pub fn pick_index_at_screen_y(
        &self,
        y: f32,
        item_count: usize,
    ) -> Option<usize> {
        self.pick(Axis::Y, y, item_count)
    }

    /// Narrowest box along the queried axis wins; on an exact tie the
    /// later-drawn (nearer) record wins.
    fn pick(&self, axis: Axis, pixel: f32, item_count: usize) -> Option<usize> {
        if !pixel.is_finite() {
            return None;
        }
        let frame = self.frame.lock();
        let (width, height) = frame.viewport?;
        let (slot, ndc) = match axis {
            Axis::X => (0, pixel / width as f32 * 2.0 - 1.0),
            Axis::Y => (1, 1.0 - pixel / height as f32 * 2.0),
        };

        let mut best: Option<(usize, f32)> = None;
        for record in &frame.records {
            if record.index >= item_count {
                continue;
            }
            let (min, max) = (record.bounds.min[slot], record.bounds.max[slot]);
            if ndc < min || ndc > max {
                continue;
            }
            let extent = max - min;
            if best.is_none_or(|(_, narrowest)| extent <= narrowest) {
                best = Some((record.index, extent));
            }
        }
        best.map(|(index, _)| index)
    }
}
