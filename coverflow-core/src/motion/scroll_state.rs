//! Scroll/physics state machine for the carousel
//!
//! Positions are in item space: `scroll_offset == 3.0` centers item 3.
//! Overscroll is tracked separately and never folded into the offset, so
//! `scroll_offset` stays within `[0, item_count - 1]` at all times while the
//! visual center (`offset + overscroll`) may leave it temporarily.
//!
//! Input operations only set targets and flags; the per-frame
//! [`ScrollState::integrate`] advances every degree of freedom (fling,
//! snap, vertical drag easing, bounce, click pulse) independently.

use coverflow_config::{PhysicsSettings, VerticalDragSettings};

use super::easing::{click_pulse_scale, exp_approach_factor, exp_decay};

/// Drag easing lands exactly on its target below this distance.
const DRAG_SETTLE_EPSILON: f32 = 1e-5;

/// Snap lifecycle notifications produced by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEvent {
    Started(usize),
    Finished(usize),
}

#[derive(Debug, Clone)]
pub struct ScrollState {
    physics: PhysicsSettings,
    drag_bounds: VerticalDragSettings,
    /// Logical position, always within the valid index range
    scroll_offset: f32,
    /// Signed excursion past the nearest bound
    overscroll: f32,
    /// Resting position being approached, if any
    snap_target: Option<f32>,
    /// Whether `Started` was already emitted for the current snap
    snap_started: bool,
    /// Overscroll relaxing toward zero
    bouncing: bool,
    /// Inertial velocity in items/s (0 when not flinging)
    fling_velocity: f32,
    drag_y_offset: f32,
    drag_y_target: f32,
    drag_pitch_degrees: f32,
    drag_pitch_target: f32,
    /// Vertical axis follows the finger directly while set
    vertical_drag_active: bool,
    click_scale_progress: f32,
    click_scale_active: bool,
    force_notify: bool,
    pending_events: Vec<SnapEvent>,
}

impl ScrollState {
    pub fn new(
        physics: PhysicsSettings,
        drag_bounds: VerticalDragSettings,
    ) -> Self {
        Self {
            physics,
            drag_bounds,
            scroll_offset: 0.0,
            overscroll: 0.0,
            snap_target: None,
            snap_started: false,
            bouncing: false,
            fling_velocity: 0.0,
            drag_y_offset: 0.0,
            drag_y_target: 0.0,
            drag_pitch_degrees: 0.0,
            drag_pitch_target: 0.0,
            vertical_drag_active: false,
            click_scale_progress: 0.0,
            click_scale_active: false,
            force_notify: false,
            pending_events: Vec::new(),
        }
    }

    /// Replace tuning at runtime (takes effect on the next operation).
    pub fn set_physics(&mut self, physics: PhysicsSettings) {
        self.physics = physics;
        let max = physics.max_overscroll;
        self.overscroll = self.overscroll.clamp(-max, max);
    }

    pub fn set_drag_bounds(&mut self, bounds: VerticalDragSettings) {
        self.drag_bounds = bounds;
    }

    /// Apply a drag delta. Cancels any snap, fling, or bounce.
    pub fn scroll_by(&mut self, delta: f32, item_count: usize) {
        if item_count == 0 || !delta.is_finite() {
            return;
        }
        self.cancel_snap();
        self.bouncing = false;
        self.fling_velocity = 0.0;
        self.apply_delta(delta * self.physics.scroll_sensitivity, item_count);
    }

    /// Start inertial scrolling at `velocity` items/s (before sensitivity).
    pub fn fling(&mut self, velocity: f32, item_count: usize) {
        if item_count == 0 || !velocity.is_finite() {
            return;
        }
        self.cancel_snap();
        self.bouncing = false;
        self.fling_velocity = velocity * self.physics.scroll_sensitivity;
    }

    /// Target the nearest integer index. Resolved by the integrator.
    pub fn snap_to_nearest(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        let target = self.clamp_offset(self.scroll_offset.round(), item_count);
        self.set_snap_target(target);
    }

    /// Move to `offset` (clamped), either animated or immediately.
    ///
    /// An immediate move also clears overscroll and requests a forced
    /// offset notification.
    pub fn set_scroll_offset(
        &mut self,
        offset: f32,
        smooth: bool,
        item_count: usize,
    ) {
        if item_count == 0 || !offset.is_finite() {
            return;
        }
        self.fling_velocity = 0.0;
        let clamped = self.clamp_offset(offset, item_count);
        if smooth {
            self.set_snap_target(clamped);
        } else {
            self.cancel_snap();
            self.scroll_offset = clamped;
            self.overscroll = 0.0;
            self.bouncing = false;
            self.force_notify = true;
        }
    }

    /// Snap `steps` items away from the nearest resting index.
    pub fn step_by(&mut self, steps: i64, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.fling_velocity = 0.0;
        let base = match self.snap_target {
            Some(target) => target,
            None => self.scroll_offset.round(),
        };
        let target = self.clamp_offset(base + steps as f32, item_count);
        self.set_snap_target(target);
    }

    /// Release of a drag. Starts bounce-back when overscrolled.
    pub fn end_scroll(&mut self) {
        if self.overscroll != 0.0 {
            self.bouncing = true;
        }
    }

    /// Drive the vertical axis directly from a normalized deflection.
    pub fn set_drag_vertical(&mut self, normalized: f32) {
        if !normalized.is_finite() {
            return;
        }
        let n = normalized.clamp(-1.0, 1.0);
        self.vertical_drag_active = true;
        self.drag_y_offset = n * self.drag_bounds.max_offset;
        self.drag_pitch_degrees = n * self.drag_bounds.max_pitch_degrees;
        self.drag_y_target = self.drag_y_offset;
        self.drag_pitch_target = self.drag_pitch_degrees;
    }

    /// Release the vertical axis; it eases back to rest.
    pub fn end_vertical_drag(&mut self) {
        self.vertical_drag_active = false;
        self.drag_y_target = 0.0;
        self.drag_pitch_target = 0.0;
    }

    /// Start (or restart) the shrink-and-return pulse on the centered tile.
    pub fn trigger_click_scale(&mut self) {
        self.click_scale_progress = 0.0;
        self.click_scale_active = true;
    }

    /// Advance every degree of freedom by `dt` seconds.
    ///
    /// Callers clamp `dt` beforehand so a stall cannot cause a jump.
    pub fn integrate(&mut self, dt: f32, item_count: usize) {
        if item_count == 0 {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.scroll_offset = self.clamp_offset(self.scroll_offset, item_count);
        if let Some(target) = self.snap_target {
            self.snap_target = Some(self.clamp_offset(target, item_count));
        }

        self.integrate_fling(dt, item_count);
        self.integrate_snap(dt);
        self.integrate_vertical_drag(dt);
        self.integrate_bounce(dt);
        self.integrate_click_scale(dt);
    }

    fn integrate_fling(&mut self, dt: f32, item_count: usize) {
        if self.fling_velocity == 0.0 {
            return;
        }
        let tau = self.physics.fling_decay_tau_ms / 1000.0;
        self.fling_velocity *= exp_decay(1.0 / tau, dt);
        self.apply_delta(self.fling_velocity * dt, item_count);

        if self.overscroll != 0.0 {
            // Ran into a bound: the rest of the motion becomes a bounce.
            self.fling_velocity = 0.0;
            self.bouncing = true;
        } else if self.fling_velocity.abs() < self.physics.fling_min_velocity {
            self.fling_velocity = 0.0;
            self.snap_to_nearest(item_count);
        }
    }

    fn integrate_snap(&mut self, dt: f32) {
        let Some(target) = self.snap_target else {
            return;
        };
        let index = target.round().max(0.0) as usize;
        if !self.snap_started {
            self.snap_started = true;
            self.pending_events.push(SnapEvent::Started(index));
        }
        let delta = target - self.scroll_offset;
        if delta.abs() < self.physics.snap_epsilon {
            self.scroll_offset = target;
            self.snap_target = None;
            self.snap_started = false;
            self.pending_events.push(SnapEvent::Finished(index));
        } else {
            self.scroll_offset +=
                delta * exp_approach_factor(self.physics.snap_lambda, dt);
        }
    }

    fn integrate_vertical_drag(&mut self, dt: f32) {
        if self.vertical_drag_active {
            return;
        }
        let alpha = exp_approach_factor(self.physics.drag_ease_lambda, dt);
        self.drag_y_offset = ease_toward(
            self.drag_y_offset,
            self.drag_y_target,
            alpha,
        );
        self.drag_pitch_degrees = ease_toward(
            self.drag_pitch_degrees,
            self.drag_pitch_target,
            alpha,
        );
    }

    fn integrate_bounce(&mut self, dt: f32) {
        if !self.bouncing {
            return;
        }
        if self.overscroll == 0.0 {
            self.bouncing = false;
            return;
        }
        self.overscroll *= exp_decay(self.physics.bounce_lambda, dt);
        if self.overscroll.abs() < self.physics.bounce_epsilon {
            self.overscroll = 0.0;
            self.bouncing = false;
        }
    }

    fn integrate_click_scale(&mut self, dt: f32) {
        if !self.click_scale_active {
            return;
        }
        self.click_scale_progress +=
            (dt * 1000.0) / self.physics.click_pulse_ms;
        if self.click_scale_progress >= 1.0 {
            self.click_scale_progress = 1.0;
            self.click_scale_active = false;
        }
    }

    /// Overscroll-aware position update shared by drags and flings.
    fn apply_delta(&mut self, delta: f32, item_count: usize) {
        if delta == 0.0 || item_count == 0 {
            return;
        }
        let max_over = self.physics.max_overscroll;
        let max_index = (item_count - 1) as f32;
        let mut remaining = delta;

        if self.overscroll != 0.0 {
            let pulling_back = remaining.signum() != self.overscroll.signum();
            if pulling_back {
                let next = self.overscroll + remaining;
                if next != 0.0 && next.signum() == self.overscroll.signum() {
                    self.overscroll = next;
                    return;
                }
                // Overscroll fully resolved; the rest moves the offset.
                self.overscroll = 0.0;
                remaining = next;
            } else {
                let stiffness = self.physics.overscroll_resistance;
                let resistance = 1.0 + self.overscroll.abs() * stiffness;
                self.overscroll = (self.overscroll + remaining / resistance)
                    .clamp(-max_over, max_over);
                return;
            }
        }

        if remaining == 0.0 {
            return;
        }
        let next = self.scroll_offset + remaining;
        if next < 0.0 {
            self.scroll_offset = 0.0;
            self.overscroll = next.max(-max_over);
        } else if next > max_index {
            self.scroll_offset = max_index;
            self.overscroll = (next - max_index).min(max_over);
        } else {
            self.scroll_offset = next;
        }
    }

    fn set_snap_target(&mut self, target: f32) {
        self.snap_target = Some(target);
    }

    /// Drop any pending snap. A snap abandoned mid-flight emits no
    /// `Finished` event.
    fn cancel_snap(&mut self) {
        self.snap_target = None;
        self.snap_started = false;
    }

    fn clamp_offset(&self, offset: f32, item_count: usize) -> f32 {
        let max_index = item_count.saturating_sub(1) as f32;
        offset.clamp(0.0, max_index)
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn overscroll(&self) -> f32 {
        self.overscroll
    }

    /// Center used for drawing: overscroll is applied visually.
    pub fn visual_center(&self) -> f32 {
        self.scroll_offset + self.overscroll
    }

    pub fn snap_target(&self) -> Option<f32> {
        self.snap_target
    }

    pub fn is_bouncing(&self) -> bool {
        self.bouncing
    }

    pub fn is_flinging(&self) -> bool {
        self.fling_velocity != 0.0
    }

    pub fn fling_velocity(&self) -> f32 {
        self.fling_velocity
    }

    pub fn drag_y_offset(&self) -> f32 {
        self.drag_y_offset
    }

    pub fn drag_pitch_degrees(&self) -> f32 {
        self.drag_pitch_degrees
    }

    pub fn is_vertical_drag_active(&self) -> bool {
        self.vertical_drag_active
    }

    pub fn click_scale_progress(&self) -> f32 {
        self.click_scale_progress
    }

    pub fn click_scale_active(&self) -> bool {
        self.click_scale_active
    }

    /// Current click pulse multiplier (1.0 when no pulse is running).
    pub fn click_scale_factor(&self) -> f32 {
        if !self.click_scale_active {
            return 1.0;
        }
        click_pulse_scale(
            self.click_scale_progress,
            self.physics.click_scale_target,
        )
    }

    /// Rounded logical center, always a valid index for a non-empty set.
    pub fn centered_index(&self, item_count: usize) -> Option<usize> {
        if item_count == 0 {
            return None;
        }
        let index = self.scroll_offset.round().max(0.0) as usize;
        Some(index.min(item_count - 1))
    }

    /// Nothing left to animate.
    pub fn is_settled(&self) -> bool {
        self.snap_target.is_none()
            && !self.bouncing
            && self.fling_velocity == 0.0
            && !self.click_scale_active
            && self.overscroll == 0.0
            && (self.vertical_drag_active
                || (self.drag_y_offset == self.drag_y_target
                    && self.drag_pitch_degrees == self.drag_pitch_target))
    }

    /// Drain snap events generated since the last call, in order.
    pub fn take_snap_events(&mut self) -> Vec<SnapEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Consume the forced-notify request set by an immediate offset change.
    pub fn take_force_notify(&mut self) -> bool {
        std::mem::take(&mut self.force_notify)
    }
}

fn ease_toward(current: f32, target: f32, alpha: f32) -> f32 {
    let next = current + (target - current) * alpha;
    if (target - next).abs() < DRAG_SETTLE_EPSILON {
        target
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const DT: f32 = 1.0 / 60.0;

    fn state() -> ScrollState {
        ScrollState::new(
            PhysicsSettings::default(),
            VerticalDragSettings::default(),
        )
    }

    fn physics(max_overscroll: f32, resistance: f32) -> PhysicsSettings {
        PhysicsSettings {
            max_overscroll,
            overscroll_resistance: resistance,
            scroll_sensitivity: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn drag_moves_offset_within_bounds() {
        let mut s = state();
        s.scroll_by(2.5, 10);
        assert_eq!(s.scroll_offset(), 2.5);
        assert_eq!(s.overscroll(), 0.0);
        s.scroll_by(-1.0, 10);
        assert_eq!(s.scroll_offset(), 1.5);
    }

    #[test]
    fn overscroll_past_last_index_applies_resistance() {
        let mut s = ScrollState::new(physics(1.5, 3.0), Default::default());
        s.set_scroll_offset(99.0, false, 100);
        s.scroll_by(0.3, 100);
        assert!((s.overscroll() - 0.3).abs() < 1e-5);
        assert_eq!(s.scroll_offset(), 99.0);

        s.scroll_by(0.3, 100);
        let expected = 0.3 + 0.3 / (1.0 + 0.3 * 3.0);
        assert!((s.overscroll() - expected).abs() < 1e-4);
        assert!(s.overscroll() < 0.6);
    }

    #[test]
    fn pulling_back_resolves_overscroll_before_moving_offset() {
        let mut s = ScrollState::new(physics(1.5, 3.0), Default::default());
        s.scroll_by(-0.4, 10);
        assert!((s.overscroll() + 0.4).abs() < 1e-5);
        assert_eq!(s.scroll_offset(), 0.0);

        s.scroll_by(0.1, 10);
        assert!((s.overscroll() + 0.3).abs() < 1e-5);
        assert_eq!(s.scroll_offset(), 0.0);

        s.scroll_by(0.8, 10);
        assert_eq!(s.overscroll(), 0.0);
        assert!((s.scroll_offset() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn overscroll_growth_is_resisted_and_capped() {
        let mut s = ScrollState::new(physics(1.5, 3.0), Default::default());
        s.set_scroll_offset(9.0, false, 10);
        let mut previous = 0.0f32;
        let mut previous_step = f32::INFINITY;
        for _ in 0..200 {
            s.scroll_by(0.25, 10);
            let step = s.overscroll() - previous;
            assert!(step <= 0.25 + 1e-6);
            assert!(step <= previous_step + 1e-6);
            assert!(s.overscroll() <= 1.5);
            previous_step = step;
            previous = s.overscroll();
        }
        assert_eq!(s.overscroll(), 1.5);
    }

    #[test]
    fn bounce_settles_exactly_at_zero() {
        let mut s = state();
        s.scroll_by(-1.0, 10);
        assert!(s.overscroll() < 0.0);
        s.end_scroll();
        assert!(s.is_bouncing());

        let mut steps = 0;
        while s.overscroll() != 0.0 {
            s.integrate(DT, 10);
            steps += 1;
            assert!(steps < 200, "bounce did not settle");
        }
        assert_eq!(s.overscroll(), 0.0);
        assert!(!s.is_bouncing());
    }

    #[test]
    fn snap_converges_monotonically_with_one_event_pair() {
        let mut s = state();
        s.scroll_by(3.4, 10);
        s.snap_to_nearest(10);
        assert_eq!(s.snap_target(), Some(3.0));

        let mut events = Vec::new();
        let mut last_gap = (3.0 - s.scroll_offset()).abs();
        for _ in 0..200 {
            s.integrate(DT, 10);
            events.extend(s.take_snap_events());
            let gap = (3.0 - s.scroll_offset()).abs();
            assert!(gap <= last_gap);
            last_gap = gap;
            if s.snap_target().is_none() {
                break;
            }
        }
        assert_eq!(s.scroll_offset(), 3.0);
        assert_eq!(
            events,
            vec![SnapEvent::Started(3), SnapEvent::Finished(3)]
        );
    }

    #[test]
    fn drag_cancels_snap_without_finished_event() {
        let mut s = state();
        s.set_scroll_offset(5.0, true, 10);
        s.integrate(DT, 10);
        assert_eq!(s.take_snap_events(), vec![SnapEvent::Started(5)]);
        s.scroll_by(0.2, 10);
        assert!(s.snap_target().is_none());
        s.integrate(DT, 10);
        assert!(s.take_snap_events().is_empty());
    }

    #[test]
    fn immediate_offset_requests_forced_notify() {
        let mut s = state();
        s.set_scroll_offset(42.0, false, 10);
        assert_eq!(s.scroll_offset(), 9.0);
        assert!(s.take_force_notify());
        assert!(!s.take_force_notify());
    }

    #[test]
    fn empty_dataset_makes_operations_no_ops() {
        let mut s = state();
        s.scroll_by(3.0, 0);
        s.snap_to_nearest(0);
        s.set_scroll_offset(2.0, false, 0);
        s.fling(10.0, 0);
        s.step_by(1, 0);
        s.integrate(DT, 0);
        assert_eq!(s.scroll_offset(), 0.0);
        assert!(s.snap_target().is_none());
        assert_eq!(s.centered_index(0), None);
    }

    #[test]
    fn vertical_drag_is_direct_then_eases_home() {
        let mut s = state();
        let bounds = VerticalDragSettings::default();
        s.set_drag_vertical(2.0);
        assert_eq!(s.drag_y_offset(), bounds.max_offset);
        s.integrate(DT, 10);
        assert_eq!(s.drag_y_offset(), bounds.max_offset);

        s.end_vertical_drag();
        let mut last = s.drag_y_offset();
        for _ in 0..600 {
            s.integrate(DT, 10);
            assert!(s.drag_y_offset() <= last);
            last = s.drag_y_offset();
        }
        assert_eq!(s.drag_y_offset(), 0.0);
        assert_eq!(s.drag_pitch_degrees(), 0.0);
    }

    #[test]
    fn click_pulse_runs_for_its_duration() {
        let mut s = state();
        s.trigger_click_scale();
        assert!(s.click_scale_active());
        s.integrate(0.12, 10);
        assert!((s.click_scale_progress() - 0.5).abs() < 1e-4);
        assert!(s.click_scale_factor() < 1.0);
        s.integrate(0.2, 10);
        assert!(!s.click_scale_active());
        assert_eq!(s.click_scale_factor(), 1.0);
    }

    #[test]
    fn fling_decays_then_snaps_to_an_index() {
        let mut s = state();
        s.fling(6.0, 100);
        for _ in 0..600 {
            s.integrate(DT, 100);
            if s.is_settled() {
                break;
            }
        }
        assert!(s.is_settled());
        assert!(s.scroll_offset() > 1.0);
        assert_eq!(s.scroll_offset(), s.scroll_offset().round());
    }

    #[test]
    fn fling_into_bound_becomes_bounce() {
        let mut s = state();
        s.set_scroll_offset(8.0, false, 10);
        s.fling(40.0, 10);
        s.integrate(DT, 10);
        s.integrate(DT, 10);
        assert!(!s.is_flinging());
        assert!(s.is_bouncing());
        for _ in 0..300 {
            s.integrate(DT, 10);
        }
        assert_eq!(s.overscroll(), 0.0);
        assert_eq!(s.scroll_offset(), 9.0);
    }

    #[test]
    fn step_by_chains_from_pending_target() {
        let mut s = state();
        s.step_by(1, 10);
        s.step_by(1, 10);
        assert_eq!(s.snap_target(), Some(2.0));
        s.step_by(-5, 10);
        assert_eq!(s.snap_target(), Some(0.0));
    }

    #[test]
    fn random_input_keeps_invariants() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let count = rng.random_range(1..40usize);
            let mut s = state();
            for _ in 0..200 {
                match rng.random_range(0..6u8) {
                    0 => s.scroll_by(rng.random_range(-3.0..3.0), count),
                    1 => s.snap_to_nearest(count),
                    2 => s.end_scroll(),
                    3 => s.fling(rng.random_range(-20.0..20.0), count),
                    4 => s.step_by(rng.random_range(-3..=3), count),
                    _ => s.integrate(rng.random_range(0.0..0.05), count),
                }
                assert!(s.scroll_offset() >= 0.0);
                assert!(s.scroll_offset() <= (count - 1) as f32);
                assert!(
                    s.overscroll().abs()
                        <= PhysicsSettings::default().max_overscroll + 1e-5
                );
                let centered = s.centered_index(count).unwrap();
                assert!(centered < count);
            }
        }
    }
}
