//! Per-tile transform math
//!
//! Tiles are unit quads centered on the origin in model space. The camera
//! looks down -Z at the band from `camera_distance`; depth is wgpu's
//! `[0, 1]` range.

use coverflow_config::{CarouselSettings, Orientation};
use glam::{Mat4, Vec3, Vec4};

use crate::motion::easing::smoothstep;

/// Model-space corners of the unit quad, in triangle-strip order.
pub const QUAD_CORNERS: [[f32; 2]; 4] =
    [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]];

/// Clip-space `w` at or below this is treated as behind the camera.
const MIN_CLIP_W: f32 = 1e-4;

/// Motion state shared by every tile in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMotion {
    /// Visual center, overscroll included.
    pub center: f32,
    pub drag_y_offset: f32,
    pub drag_pitch_degrees: f32,
    /// Index receiving the click pulse.
    pub centered_index: usize,
    /// Click pulse multiplier, 1.0 when idle.
    pub click_scale: f32,
}

/// Resolved placement of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePose {
    pub index: usize,
    pub offset: f32,
    pub scale: f32,
    pub model: Mat4,
    /// Present when reflections are enabled for the orientation.
    pub reflection: Option<Mat4>,
}

/// Axis-aligned box in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdcBounds {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

/// Combined view-projection for the current orientation and viewport.
///
/// An unsized viewport falls back to a square aspect.
pub fn view_projection(
    settings: &CarouselSettings,
    viewport: Option<(u32, u32)>,
) -> Mat4 {
    let appearance = &settings.appearance;
    let aspect = match viewport {
        Some((width, height)) if width > 0 && height > 0 => {
            width as f32 / height as f32
        }
        _ => 1.0,
    };
    let projection = Mat4::perspective_rh(
        appearance.fov_y_degrees.to_radians(),
        aspect,
        appearance.near,
        appearance.far,
    );
    let eye = Vec3::new(0.0, 0.0, settings.camera_distance());
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    projection * view
}

/// Place tile `index` relative to the band's current motion.
pub fn tile_pose(
    index: usize,
    settings: &CarouselSettings,
    motion: &BandMotion,
) -> TilePose {
    let appearance = &settings.appearance;
    let offset = index as f32 - motion.center;
    let abs_off = offset.abs();
    let ease = smoothstep(0.0, appearance.easing_threshold, abs_off);

    let depth = if appearance.depth_parallax {
        abs_off * appearance.z_spread * ease
    } else {
        0.0
    };

    let mut scale = (1.0 - appearance.side_shrink_per_item * abs_off)
        .max(appearance.side_scale);
    if index == motion.centered_index {
        scale *= motion.click_scale;
    }

    let max_rotation = appearance.max_rotation_degrees;
    let rotation = (-offset.signum() * appearance.rotation_degrees * ease)
        .clamp(-max_rotation, max_rotation)
        .to_radians();

    let along = offset * settings.spacing();
    let (translation, axis_rotation) = match settings.orientation {
        Orientation::Horizontal => (
            Vec3::new(along, motion.drag_y_offset, 0.0),
            Mat4::from_rotation_y(rotation),
        ),
        Orientation::Vertical => (
            Vec3::new(0.0, -along + motion.drag_y_offset, 0.0),
            Mat4::from_rotation_x(rotation),
        ),
    };

    let placed = Mat4::from_rotation_x(motion.drag_pitch_degrees.to_radians())
        * Mat4::from_translation(translation)
        * Mat4::from_translation(Vec3::new(0.0, 0.0, -depth))
        * axis_rotation;

    let model = placed * Mat4::from_scale(Vec3::splat(scale));

    let reflection = settings.reflections_enabled().then(|| {
        let gap = appearance.reflection_gap;
        placed
            * Mat4::from_translation(Vec3::new(0.0, -(scale + gap), 0.0))
            * Mat4::from_scale(Vec3::new(scale, -scale, scale))
    });

    TilePose {
        index,
        offset,
        scale,
        model,
        reflection,
    }
}

/// Project the quad's corners through `mvp` and bound them in NDC.
///
/// Returns `None` when any corner lands behind the camera.
pub fn project_bounds(mvp: &Mat4) -> Option<NdcBounds> {
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for [x, y] in QUAD_CORNERS {
        let clip = *mvp * Vec4::new(x, y, 0.0, 1.0);
        if clip.w <= MIN_CLIP_W {
            return None;
        }
        let ndc = [clip.x / clip.w, clip.y / clip.w];
        for axis in 0..2 {
            min[axis] = min[axis].min(ndc[axis]);
            max[axis] = max[axis].max(ndc[axis]);
        }
    }
    Some(NdcBounds { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(center: f32) -> BandMotion {
        BandMotion {
            center,
            drag_y_offset: 0.0,
            drag_pitch_degrees: 0.0,
            centered_index: center.round() as usize,
            click_scale: 1.0,
        }
    }

    fn bounds(settings: &CarouselSettings, pose: &TilePose) -> NdcBounds {
        let mvp = view_projection(settings, Some((800, 600))) * pose.model;
        project_bounds(&mvp).unwrap()
    }

    #[test]
    fn centered_tile_faces_camera_at_full_scale() {
        let settings = CarouselSettings::default();
        let pose = tile_pose(4, &settings, &motion(4.0));
        assert_eq!(pose.offset, 0.0);
        assert_eq!(pose.scale, 1.0);
        assert_eq!(pose.model, Mat4::IDENTITY);

        let b = bounds(&settings, &pose);
        assert!((b.min[0] + b.max[0]).abs() < 1e-5);
        assert!((b.min[1] + b.max[1]).abs() < 1e-5);
    }

    #[test]
    fn side_tiles_shrink_to_floor_and_move_outward() {
        let settings = CarouselSettings::default();
        let far = tile_pose(10, &settings, &motion(4.0));
        assert_eq!(far.scale, settings.appearance.side_scale);

        let left = bounds(&settings, &tile_pose(3, &settings, &motion(4.0)));
        let right = bounds(&settings, &tile_pose(5, &settings, &motion(4.0)));
        assert!(right.min[0] > 0.0);
        assert!(left.max[0] < 0.0);
    }

    #[test]
    fn rotation_respects_configured_maximum() {
        let mut settings = CarouselSettings::default();
        settings.appearance.rotation_degrees = 80.0;
        settings.appearance.max_rotation_degrees = 30.0;
        let pose = tile_pose(6, &settings, &motion(4.0));
        // A unit +X vector keeps cos(angle) of its length along X.
        let x_axis = pose.model.transform_vector3(Vec3::X) / pose.scale;
        let angle = x_axis.z.atan2(x_axis.x).abs().to_degrees();
        assert!((angle - 30.0).abs() < 0.1, "angle {angle}");
    }

    #[test]
    fn reflection_sits_below_its_tile() {
        let settings = CarouselSettings::default();
        let pose = tile_pose(2, &settings, &motion(2.0));
        let view_proj = view_projection(&settings, Some((800, 600)));
        let main = project_bounds(&(view_proj * pose.model)).unwrap();
        let mirrored =
            project_bounds(&(view_proj * pose.reflection.unwrap())).unwrap();
        assert!(mirrored.max[1] < main.min[1]);
    }

    #[test]
    fn vertical_band_runs_downward_without_reflections() {
        let settings = CarouselSettings {
            orientation: Orientation::Vertical,
            ..Default::default()
        };
        let pose = tile_pose(5, &settings, &motion(4.0));
        assert!(pose.reflection.is_none());
        assert!(bounds(&settings, &pose).max[1] < 0.0);
    }

    #[test]
    fn click_pulse_only_scales_centered_tile() {
        let settings = CarouselSettings::default();
        let mut m = motion(3.0);
        m.click_scale = 0.9;
        assert!((tile_pose(3, &settings, &m).scale - 0.9).abs() < 1e-6);
        let neighbour = tile_pose(4, &settings, &m);
        assert_eq!(
            neighbour.scale,
            1.0 - settings.appearance.side_shrink_per_item
        );
    }

    #[test]
    fn geometry_behind_camera_is_not_projected() {
        let settings = CarouselSettings::default();
        let behind = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        let mvp = view_projection(&settings, Some((800, 600))) * behind;
        assert!(project_bounds(&mvp).is_none());
    }
}
