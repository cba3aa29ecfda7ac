//! Default tunables for the cover-flow carousel
//!
//! Shared constants for windowing radii, scroll physics, appearance, and
//! decode scheduling. Tuning should happen here so every carousel built
//! from `CarouselSettings::default()` updates consistently.

/// Windowing radii, in item units around the (fractional) center.
pub mod radii {
    /// Tiles drawn on each side of the center.
    pub const VISIBLE: usize = 5;
    /// Tiles proactively decoded on each side of the center.
    pub const PREFETCH: usize = 7;
    /// Resident textures farther than this (plus the buffer) are evicted.
    pub const KEEP: usize = 8;
    /// Hysteresis added to `KEEP` so tiles at the edge do not thrash.
    pub const EVICTION_BUFFER: f32 = 0.5;
}

/// Scroll, snap, bounce, and pulse physics.
pub mod physics {
    /// Multiplier applied to raw drag deltas (item units per input unit).
    pub const SCROLL_SENSITIVITY: f32 = 1.0;
    /// Largest overscroll magnitude, in items.
    pub const MAX_OVERSCROLL: f32 = 1.5;
    /// Resistance growth per item of existing overscroll.
    pub const OVERSCROLL_RESISTANCE: f32 = 3.0;
    /// Exponential approach rate (1/s) for snapping.
    pub const SNAP_LAMBDA: f32 = 12.0;
    /// Exponential approach rate (1/s) for vertical drag easing.
    pub const DRAG_EASE_LAMBDA: f32 = 10.0;
    /// Exponential decay rate (1/s) for overscroll bounce-back.
    pub const BOUNCE_LAMBDA: f32 = 14.0;
    /// Distance below which a snap lands exactly on its target.
    pub const SNAP_EPSILON: f32 = 1e-3;
    /// Overscroll magnitude below which bounce-back lands on zero.
    pub const BOUNCE_EPSILON: f32 = 1e-3;
    /// Frame delta clamp (ms) so a stall does not teleport the carousel.
    pub const MAX_FRAME_DT_MS: f32 = 50.0;
    /// Total duration of the click-scale pulse (ms).
    pub const CLICK_PULSE_MS: f32 = 240.0;
    /// Scale reached at the midpoint of the click pulse.
    pub const CLICK_SCALE_TARGET: f32 = 0.92;
    /// Fling velocity decay time constant (ms).
    pub const FLING_DECAY_TAU_MS: f32 = 325.0;
    /// Fling velocity (items/s) below which inertial motion stops.
    pub const FLING_MIN_VELOCITY: f32 = 0.35;
    /// Minimum offset change reported as an offset-changed event.
    pub const NOTIFY_EPSILON: f32 = 1e-4;
}

/// Visual layout of the band.
pub mod appearance {
    /// Global alpha applied to every tile.
    pub const FADE_ALPHA: f32 = 1.0;
    /// Push side tiles away from the camera.
    pub const DEPTH_PARALLAX: bool = true;
    /// Gap between a tile and its reflection (world units).
    pub const REFLECTION_GAP: f32 = 0.04;
    /// Overall reflection opacity.
    pub const REFLECTION_STRENGTH: f32 = 0.35;
    /// Draw mirrored reflections (horizontal orientation only).
    pub const REFLECTIONS: bool = true;
    /// Floor for side-tile scale.
    pub const SIDE_SCALE: f32 = 0.7;
    /// Per-item linear shrink applied before the floor.
    pub const SIDE_SHRINK_PER_ITEM: f32 = 0.15;
    /// Distance between neighbouring tile centers (horizontal band).
    pub const SPACING_HORIZONTAL: f32 = 0.55;
    /// Distance between neighbouring tile centers (vertical band).
    pub const SPACING_VERTICAL: f32 = 0.65;
    /// Depth push per item of distance from center.
    pub const Z_SPREAD: f32 = 0.6;
    /// Rotation applied to fully eased side tiles (degrees).
    pub const ROTATION_DEGREES: f32 = 55.0;
    /// Hard cap on tile rotation (degrees).
    pub const MAX_ROTATION_DEGREES: f32 = 70.0;
    /// Distance from center at which rotation/parallax easing saturates.
    pub const EASING_THRESHOLD: f32 = 0.6;
    /// Vertical field of view (degrees).
    pub const FOV_Y_DEGREES: f32 = 45.0;
    /// Camera distance for the horizontal band.
    pub const CAMERA_DISTANCE_HORIZONTAL: f32 = 3.0;
    /// Camera distance for the vertical band.
    pub const CAMERA_DISTANCE_VERTICAL: f32 = 3.6;
    /// Near clip plane.
    pub const NEAR: f32 = 0.1;
    /// Far clip plane.
    pub const FAR: f32 = 100.0;
    /// Clear color (linear RGBA).
    pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
}

/// Secondary vertical-drag axis bounds.
pub mod vertical_drag {
    /// Largest vertical offset (world units) at a fully deflected drag.
    pub const MAX_OFFSET: f32 = 0.35;
    /// Largest world pitch (degrees) at a fully deflected drag.
    pub const MAX_PITCH_DEGREES: f32 = 12.0;
}

/// Decode worker pool and upload hand-off.
pub mod decode {
    /// Fixed number of decode workers.
    pub const WORKERS: usize = 3;
    /// Longest edge of a decoded tile, bounding memory per texture.
    pub const MAX_DIMENSION: u32 = 512;
    /// Uploads applied per frame (0 = unlimited).
    pub const MAX_UPLOADS_PER_FRAME: usize = 4;
}
