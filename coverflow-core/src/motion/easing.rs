//! Easing curves shared by the physics integrator and tile transforms.

/// Fraction of the remaining distance covered in `dt` seconds by a
/// critically damped exponential approach with rate `lambda` (1/s).
///
/// Always in `[0, 1)`, so an approach driven by it never overshoots.
#[inline]
pub fn exp_approach_factor(lambda: f32, dt: f32) -> f32 {
    if dt <= 0.0 || lambda <= 0.0 {
        return 0.0;
    }
    1.0 - (-lambda * dt).exp()
}

/// Multiplicative decay over `dt` seconds for rate `lambda` (1/s).
#[inline]
pub fn exp_decay(lambda: f32, dt: f32) -> f32 {
    if dt <= 0.0 || lambda <= 0.0 {
        return 1.0;
    }
    (-lambda * dt).exp()
}

/// Cubic Hermite smoothstep of `x` between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Scale multiplier of the click pulse at `progress` in `[0, 1]`.
///
/// Linear shrink to `target` over the first half, linear return to 1.0
/// over the second half.
#[inline]
pub fn click_pulse_scale(progress: f32, target: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < 0.5 {
        1.0 - (1.0 - target) * (p / 0.5)
    } else {
        target + (1.0 - target) * ((p - 0.5) / 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_factor_is_bounded() {
        for dt in [0.0, 0.001, 0.016, 0.05, 1.0, 10.0] {
            let f = exp_approach_factor(12.0, dt);
            assert!((0.0..1.0).contains(&f), "dt={dt} gave {f}");
        }
    }

    #[test]
    fn smoothstep_saturates() {
        assert_eq!(smoothstep(0.0, 0.6, 0.0), 0.0);
        assert_eq!(smoothstep(0.0, 0.6, 0.6), 1.0);
        assert_eq!(smoothstep(0.0, 0.6, 4.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn click_pulse_is_symmetric() {
        assert_eq!(click_pulse_scale(0.0, 0.9), 1.0);
        assert!((click_pulse_scale(0.5, 0.9) - 0.9).abs() < 1e-6);
        assert!((click_pulse_scale(1.0, 0.9) - 1.0).abs() < 1e-6);
        let a = click_pulse_scale(0.25, 0.9);
        let b = click_pulse_scale(0.75, 0.9);
        assert!((a - b).abs() < 1e-6);
    }
}
