//! Settings model for the carousel renderer
//!
//! Every section is `#[serde(default)]`, so a settings file only needs to
//! name the values it changes. Values coming from files, environment, or
//! runtime setters are passed through [`CarouselSettings::normalized`]
//! before the renderer consumes them.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Scroll axis of the band.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Tiles laid out left to right, rotating about the Y axis.
    #[default]
    Horizontal,
    /// Tiles laid out top to bottom, rotating about the X axis.
    /// Reflections are never drawn in this orientation.
    Vertical,
}

impl Orientation {
    pub fn from_str_lossy(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Some(Self::Horizontal),
            "vertical" | "v" => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }
}

/// Windowing radii around the viewport center, in item units.
///
/// Ordering `visible <= prefetch <= keep` always holds after any setter
/// or after [`RadiusSettings::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusSettings {
    pub visible: usize,
    pub prefetch: usize,
    pub keep: usize,
    /// Added to `keep` when deciding eviction.
    pub eviction_buffer: f32,
}

impl Default for RadiusSettings {
    fn default() -> Self {
        Self {
            visible: defaults::radii::VISIBLE,
            prefetch: defaults::radii::PREFETCH,
            keep: defaults::radii::KEEP,
            eviction_buffer: defaults::radii::EVICTION_BUFFER,
        }
    }
}

impl RadiusSettings {
    /// Set the visible radius, growing prefetch/keep if needed.
    pub fn set_visible(&mut self, visible: usize) {
        self.visible = visible;
        self.prefetch = self.prefetch.max(visible);
        self.keep = self.keep.max(self.prefetch);
    }

    /// Set the prefetch radius, shrinking visible or growing keep if needed.
    pub fn set_prefetch(&mut self, prefetch: usize) {
        self.prefetch = prefetch;
        self.visible = self.visible.min(prefetch);
        self.keep = self.keep.max(prefetch);
    }

    /// Set the keep radius, shrinking prefetch/visible if needed.
    pub fn set_keep(&mut self, keep: usize) {
        self.keep = keep;
        self.prefetch = self.prefetch.min(keep);
        self.visible = self.visible.min(self.prefetch);
    }

    /// Distance beyond which a resident texture is evicted.
    pub fn eviction_distance(&self) -> f32 {
        self.keep as f32 + self.eviction_buffer
    }

    pub fn normalized(mut self) -> Self {
        self.prefetch = self.prefetch.max(self.visible);
        self.keep = self.keep.max(self.prefetch);
        self.eviction_buffer = finite_or(self.eviction_buffer, 0.0).max(0.0);
        self
    }
}

/// Scroll/physics tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub scroll_sensitivity: f32,
    pub max_overscroll: f32,
    pub overscroll_resistance: f32,
    pub snap_lambda: f32,
    pub drag_ease_lambda: f32,
    pub bounce_lambda: f32,
    pub snap_epsilon: f32,
    pub bounce_epsilon: f32,
    pub max_frame_dt_ms: f32,
    pub click_pulse_ms: f32,
    pub click_scale_target: f32,
    pub fling_decay_tau_ms: f32,
    pub fling_min_velocity: f32,
    pub notify_epsilon: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        use defaults::physics as p;
        Self {
            scroll_sensitivity: p::SCROLL_SENSITIVITY,
            max_overscroll: p::MAX_OVERSCROLL,
            overscroll_resistance: p::OVERSCROLL_RESISTANCE,
            snap_lambda: p::SNAP_LAMBDA,
            drag_ease_lambda: p::DRAG_EASE_LAMBDA,
            bounce_lambda: p::BOUNCE_LAMBDA,
            snap_epsilon: p::SNAP_EPSILON,
            bounce_epsilon: p::BOUNCE_EPSILON,
            max_frame_dt_ms: p::MAX_FRAME_DT_MS,
            click_pulse_ms: p::CLICK_PULSE_MS,
            click_scale_target: p::CLICK_SCALE_TARGET,
            fling_decay_tau_ms: p::FLING_DECAY_TAU_MS,
            fling_min_velocity: p::FLING_MIN_VELOCITY,
            notify_epsilon: p::NOTIFY_EPSILON,
        }
    }
}

impl PhysicsSettings {
    pub fn normalized(self) -> Self {
        use defaults::physics as p;
        Self {
            scroll_sensitivity: finite_or(
                self.scroll_sensitivity,
                p::SCROLL_SENSITIVITY,
            ),
            max_overscroll: finite_or(self.max_overscroll, p::MAX_OVERSCROLL)
                .max(0.0),
            overscroll_resistance: finite_or(
                self.overscroll_resistance,
                p::OVERSCROLL_RESISTANCE,
            )
            .max(0.0),
            snap_lambda: positive_or(self.snap_lambda, p::SNAP_LAMBDA),
            drag_ease_lambda: positive_or(
                self.drag_ease_lambda,
                p::DRAG_EASE_LAMBDA,
            ),
            bounce_lambda: positive_or(self.bounce_lambda, p::BOUNCE_LAMBDA),
            snap_epsilon: positive_or(self.snap_epsilon, p::SNAP_EPSILON),
            bounce_epsilon: positive_or(self.bounce_epsilon, p::BOUNCE_EPSILON),
            max_frame_dt_ms: positive_or(
                self.max_frame_dt_ms,
                p::MAX_FRAME_DT_MS,
            ),
            click_pulse_ms: positive_or(self.click_pulse_ms, p::CLICK_PULSE_MS),
            click_scale_target: finite_or(
                self.click_scale_target,
                p::CLICK_SCALE_TARGET,
            )
            .clamp(0.1, 1.0),
            fling_decay_tau_ms: positive_or(
                self.fling_decay_tau_ms,
                p::FLING_DECAY_TAU_MS,
            ),
            fling_min_velocity: positive_or(
                self.fling_min_velocity,
                p::FLING_MIN_VELOCITY,
            ),
            notify_epsilon: finite_or(self.notify_epsilon, p::NOTIFY_EPSILON)
                .max(0.0),
        }
    }

    /// Frame delta clamp in seconds.
    pub fn max_frame_dt(&self) -> f32 {
        self.max_frame_dt_ms / 1000.0
    }
}

/// Visual layout and camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub fade_alpha: f32,
    pub depth_parallax: bool,
    pub reflections: bool,
    pub reflection_gap: f32,
    pub reflection_strength: f32,
    pub side_scale: f32,
    pub side_shrink_per_item: f32,
    pub spacing_horizontal: f32,
    pub spacing_vertical: f32,
    pub z_spread: f32,
    pub rotation_degrees: f32,
    pub max_rotation_degrees: f32,
    pub easing_threshold: f32,
    pub fov_y_degrees: f32,
    pub camera_distance_horizontal: f32,
    pub camera_distance_vertical: f32,
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        use defaults::appearance as a;
        Self {
            fade_alpha: a::FADE_ALPHA,
            depth_parallax: a::DEPTH_PARALLAX,
            reflections: a::REFLECTIONS,
            reflection_gap: a::REFLECTION_GAP,
            reflection_strength: a::REFLECTION_STRENGTH,
            side_scale: a::SIDE_SCALE,
            side_shrink_per_item: a::SIDE_SHRINK_PER_ITEM,
            spacing_horizontal: a::SPACING_HORIZONTAL,
            spacing_vertical: a::SPACING_VERTICAL,
            z_spread: a::Z_SPREAD,
            rotation_degrees: a::ROTATION_DEGREES,
            max_rotation_degrees: a::MAX_ROTATION_DEGREES,
            easing_threshold: a::EASING_THRESHOLD,
            fov_y_degrees: a::FOV_Y_DEGREES,
            camera_distance_horizontal: a::CAMERA_DISTANCE_HORIZONTAL,
            camera_distance_vertical: a::CAMERA_DISTANCE_VERTICAL,
            near: a::NEAR,
            far: a::FAR,
            clear_color: a::CLEAR_COLOR,
        }
    }
}

impl AppearanceSettings {
    pub fn normalized(self) -> Self {
        use defaults::appearance as a;
        let near = positive_or(self.near, a::NEAR);
        let far = positive_or(self.far, a::FAR).max(near * 2.0);
        let max_rotation =
            finite_or(self.max_rotation_degrees, a::MAX_ROTATION_DEGREES)
                .clamp(0.0, 89.0);
        Self {
            fade_alpha: finite_or(self.fade_alpha, a::FADE_ALPHA)
                .clamp(0.0, 1.0),
            depth_parallax: self.depth_parallax,
            reflections: self.reflections,
            reflection_gap: finite_or(self.reflection_gap, a::REFLECTION_GAP)
                .max(0.0),
            reflection_strength: finite_or(
                self.reflection_strength,
                a::REFLECTION_STRENGTH,
            )
            .clamp(0.0, 1.0),
            side_scale: finite_or(self.side_scale, a::SIDE_SCALE)
                .clamp(0.1, 1.0),
            side_shrink_per_item: finite_or(
                self.side_shrink_per_item,
                a::SIDE_SHRINK_PER_ITEM,
            )
            .max(0.0),
            spacing_horizontal: positive_or(
                self.spacing_horizontal,
                a::SPACING_HORIZONTAL,
            ),
            spacing_vertical: positive_or(
                self.spacing_vertical,
                a::SPACING_VERTICAL,
            ),
            z_spread: finite_or(self.z_spread, a::Z_SPREAD).max(0.0),
            rotation_degrees: finite_or(
                self.rotation_degrees,
                a::ROTATION_DEGREES,
            )
            .clamp(0.0, max_rotation),
            max_rotation_degrees: max_rotation,
            easing_threshold: positive_or(
                self.easing_threshold,
                a::EASING_THRESHOLD,
            ),
            fov_y_degrees: finite_or(self.fov_y_degrees, a::FOV_Y_DEGREES)
                .clamp(10.0, 120.0),
            camera_distance_horizontal: positive_or(
                self.camera_distance_horizontal,
                a::CAMERA_DISTANCE_HORIZONTAL,
            ),
            camera_distance_vertical: positive_or(
                self.camera_distance_vertical,
                a::CAMERA_DISTANCE_VERTICAL,
            ),
            near,
            far,
            clear_color: self
                .clear_color
                .map(|c| finite_or(c, 0.0).clamp(0.0, 1.0)),
        }
    }
}

/// Bounds of the secondary vertical-drag axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalDragSettings {
    pub max_offset: f32,
    pub max_pitch_degrees: f32,
}

impl Default for VerticalDragSettings {
    fn default() -> Self {
        Self {
            max_offset: defaults::vertical_drag::MAX_OFFSET,
            max_pitch_degrees: defaults::vertical_drag::MAX_PITCH_DEGREES,
        }
    }
}

impl VerticalDragSettings {
    pub fn normalized(self) -> Self {
        use defaults::vertical_drag as d;
        Self {
            max_offset: finite_or(self.max_offset, d::MAX_OFFSET).max(0.0),
            max_pitch_degrees: finite_or(
                self.max_pitch_degrees,
                d::MAX_PITCH_DEGREES,
            )
            .clamp(0.0, 89.0),
        }
    }
}

/// Decode worker pool and upload hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeSettings {
    pub workers: usize,
    pub max_dimension: u32,
    /// Uploads applied per frame; `0` means unlimited.
    pub max_uploads_per_frame: usize,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            workers: defaults::decode::WORKERS,
            max_dimension: defaults::decode::MAX_DIMENSION,
            max_uploads_per_frame: defaults::decode::MAX_UPLOADS_PER_FRAME,
        }
    }
}

impl DecodeSettings {
    pub fn normalized(self) -> Self {
        Self {
            workers: self.workers.max(1),
            max_dimension: self.max_dimension.max(1),
            max_uploads_per_frame: self.max_uploads_per_frame,
        }
    }
}

/// Complete renderer configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselSettings {
    pub orientation: Orientation,
    pub radii: RadiusSettings,
    pub physics: PhysicsSettings,
    pub appearance: AppearanceSettings,
    pub vertical_drag: VerticalDragSettings,
    pub decode: DecodeSettings,
}

impl CarouselSettings {
    /// Apply every clamping rule so the renderer can trust the values.
    pub fn normalized(self) -> Self {
        Self {
            orientation: self.orientation,
            radii: self.radii.normalized(),
            physics: self.physics.normalized(),
            appearance: self.appearance.normalized(),
            vertical_drag: self.vertical_drag.normalized(),
            decode: self.decode.normalized(),
        }
    }

    /// Distance between neighbouring tile centers for the current axis.
    pub fn spacing(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.appearance.spacing_horizontal,
            Orientation::Vertical => self.appearance.spacing_vertical,
        }
    }

    /// Camera distance for the current axis.
    pub fn camera_distance(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => {
                self.appearance.camera_distance_horizontal
            }
            Orientation::Vertical => self.appearance.camera_distance_vertical,
        }
    }

    /// Reflections are drawn only for the horizontal band.
    pub fn reflections_enabled(&self) -> bool {
        self.appearance.reflections && !self.orientation.is_vertical()
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
