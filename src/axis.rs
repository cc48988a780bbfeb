/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Per-axis movement tracking for panning and zooming. Everything here is
//! specific to one axis; the X axis knows nothing about the Y axis and
//! vice versa.

use util::round;

/// Helper for float precision correction.
const EPSILON: f32 = 0.0001;

/// Used to judge how much displacement should have happened every frame
/// based on the velocity calculated from touch events.
pub const MS_PER_FRAME: f32 = 1000.0 / 60.0;

/// Maximum acceleration that can happen between two frames. Velocity is
/// throttled if it's above this. This may happen if a time delta is very
/// low, or we get a touch point very far away from the previous position
/// for some reason.
const MAX_EVENT_ACCELERATION: f32 = 12.0;

/// Amount of friction applied during flings when going above
/// `VELOCITY_THRESHOLD`.
const FLING_FRICTION_FAST: f32 = 0.970;

/// Amount of friction applied during flings when going below
/// `VELOCITY_THRESHOLD`.
const FLING_FRICTION_SLOW: f32 = 0.850;

/// Maximum velocity before fling friction increases.
const VELOCITY_THRESHOLD: f32 = 10.0;

/// When flinging, if the velocity goes below this number, we just stop the
/// animation completely. This is to prevent asymptotically approaching 0
/// velocity and rerendering unnecessarily.
const FLING_STOPPED_THRESHOLD: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overscroll {
    None,
    /// The viewport would cross the page start.
    Minus,
    /// The viewport would cross the page end.
    Plus,
    /// The content is smaller than the viewport on this axis.
    Both,
}

/// A one-axis snapshot of the frame metrics. The axis math reads the
/// shared metrics through one of these instead of holding a reference to
/// the controller, so each call sees a consistent view and the types stay
/// acyclic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisFrame {
    /// Scroll offset component.
    pub origin: i32,
    pub viewport_length: i32,
    pub page_start: i32,
    pub page_length: i32,
    /// Page length in CSS pixels, zoom-invariant.
    pub css_page_length: f32,
    /// Current zoom.
    pub resolution: f32,
}

impl AxisFrame {
    fn viewport_end(&self) -> i32 {
        self.origin + self.viewport_length
    }

    fn page_end(&self) -> i32 {
        self.page_start + self.page_length
    }

    /// The overscroll state of the axis at its current position.
    pub fn overscroll(&self) -> Overscroll {
        let minus = self.origin < self.page_start;
        let plus = self.viewport_end() > self.page_end();
        match (minus, plus) {
            (true, true) => Overscroll::Both,
            (true, false) => Overscroll::Minus,
            (false, true) => Overscroll::Plus,
            (false, false) => Overscroll::None,
        }
    }

    /// The signed amount by which the axis is past the page bound. Positive
    /// excess overflows in the positive direction, negative excess in the
    /// negative direction.
    pub fn excess(&self) -> i32 {
        match self.overscroll() {
            Overscroll::Minus => self.origin - self.page_start,
            Overscroll::Plus => self.viewport_end() - self.page_end(),
            Overscroll::Both => {
                (self.viewport_end() - self.page_end()) + (self.page_start - self.origin)
            }
            Overscroll::None => 0,
        }
    }

    /// Whether applying `displacement` would overscroll, and in what
    /// direction.
    pub fn displacement_will_overscroll(&self, displacement: i32) -> Overscroll {
        let minus = self.origin + displacement < self.page_start;
        let plus = self.viewport_end() + displacement > self.page_end();
        match (minus, plus) {
            (true, true) => Overscroll::Both,
            (true, false) => Overscroll::Minus,
            (false, true) => Overscroll::Plus,
            (false, false) => Overscroll::None,
        }
    }

    /// How far past the page bound `displacement` would take the axis.
    pub fn displacement_will_overscroll_amount(&self, displacement: i32) -> i32 {
        match self.displacement_will_overscroll(displacement) {
            Overscroll::Minus => (self.origin + displacement) - self.page_start,
            Overscroll::Plus => (self.viewport_end() + displacement) - self.page_end(),
            // A displacement can't overscroll both ways; the axis must
            // already be zoomed out too far.
            _ => 0,
        }
    }

    /// Whether scaling the page by `scale` (relative to the current
    /// resolution) about `focus` would overscroll this axis.
    pub fn scale_will_overscroll(&self, scale: f32, focus: i32) -> Overscroll {
        let origin_after_scale = round((self.origin + focus) as f32 * scale - focus as f32);

        let both = self.scale_will_overscroll_both_ways(scale);
        let minus = origin_after_scale < round(self.page_start as f32 * scale);
        let plus =
            origin_after_scale + self.viewport_length > round(self.page_end() as f32 * scale);

        if (minus && plus) || both {
            Overscroll::Both
        } else if minus {
            Overscroll::Minus
        } else if plus {
            Overscroll::Plus
        } else {
            Overscroll::None
        }
    }

    /// How far past the page bound scaling by `scale` about `focus` would
    /// take the axis.
    pub fn scale_will_overscroll_amount(&self, scale: f32, focus: i32) -> i32 {
        let origin_after_scale = round((self.origin + focus) as f32 * scale - focus as f32);
        match self.scale_will_overscroll(scale, focus) {
            Overscroll::Minus => origin_after_scale - round(self.page_start as f32 * scale),
            Overscroll::Plus => {
                (origin_after_scale + self.viewport_length) - round(self.page_end() as f32 * scale)
            }
            // Overscrolled in both directions; client code is expected to
            // deal with it.
            _ => 0,
        }
    }

    /// True iff the scaled content would not extend past the viewport on
    /// this axis.
    pub fn scale_will_overscroll_both_ways(&self, scale: f32) -> bool {
        let scaled_page_length = (self.css_page_length.round() * scale * self.resolution).ceil();
        (scaled_page_length as i32) < self.viewport_length
    }

    /// The nearest origin that puts the viewport fully inside the page,
    /// preferring the page start when the content is smaller than the
    /// viewport.
    pub fn clamped_origin(&self) -> i32 {
        let max = self.page_end() - self.viewport_length;
        if max < self.page_start {
            self.page_start
        } else {
            self.origin.max(self.page_start).min(max)
        }
    }
}

/// Tracker for one axis of movement: touch positions, velocity and
/// fling friction.
#[derive(Clone, Debug)]
pub struct Axis {
    pos: i32,
    start_pos: i32,
    velocity: f32,
}

impl Axis {
    pub fn new() -> Axis {
        Axis {
            pos: 0,
            start_pos: 0,
            velocity: 0.0,
        }
    }

    /// A touch has begun: the user has put their finger on the screen but
    /// has not yet tried to pan.
    pub fn start_touch(&mut self, pos: i32) {
        self.start_pos = pos;
        self.pos = pos;
        self.velocity = 0.0;
    }

    /// A touch has ended. Also used to stop a fling when a finger comes
    /// down in the middle of one.
    pub fn stop_touch(&mut self) {
        self.velocity = 0.0;
    }

    /// A new touch sample arrived `time_delta` ms after the previous one;
    /// recalculate the velocity. A zero delta updates the position without
    /// touching the velocity.
    pub fn update_with_touch_at_device_point(&mut self, pos: i32, time_delta: u64) {
        if time_delta == 0 {
            self.pos = pos;
            return;
        }

        let new_velocity = MS_PER_FRAME * (self.pos - pos) as f32 / time_delta as f32;

        let current_velocity_is_low = self.velocity.abs() < 1.0;
        let direction_change = (self.velocity > 0.0) != (new_velocity > 0.0);

        // If a direction change has happened, or the velocity coming into
        // this sample is low, just apply the new velocity. If not, throttle
        // the change so one outlier sample can't fling the page.
        if current_velocity_is_low || (direction_change && new_velocity.abs() - EPSILON <= 0.0) {
            self.velocity = new_velocity;
        } else {
            let max_change = (self.velocity * time_delta as f32 * MAX_EVENT_ACCELERATION).abs();
            self.velocity =
                (self.velocity + max_change).min((self.velocity - max_change).max(new_velocity));
        }

        self.pos = pos;
    }

    /// The displacement that should have happened since the previous touch,
    /// clamped so that applying it cannot overscroll the page. Note that
    /// the result depends on the frame snapshot: apply a displacement that
    /// reaches the page boundary and the next call will return less.
    pub fn update_and_get_displacement(&self, frame: &AxisFrame, scale: f32) -> i32 {
        let mut displacement = round(self.velocity / scale);
        if frame.displacement_will_overscroll(displacement) != Overscroll::None {
            displacement -= frame.displacement_will_overscroll_amount(displacement);
        }
        displacement
    }

    /// Distance between the start of the touch and the last sampled
    /// position.
    pub fn pan_distance(&self) -> f32 {
        (self.pos - self.start_pos).abs() as f32
    }

    /// Applies friction during a fling, or cancels the fling if the
    /// velocity is too low. Returns whether the fling should continue for
    /// another frame.
    pub fn fling_apply_friction_or_cancel(&mut self) -> bool {
        if self.velocity.abs() <= FLING_STOPPED_THRESHOLD {
            // Very low velocity; stop the fling entirely rather than
            // asymptotically approaching zero.
            self.velocity = 0.0;
            false
        } else {
            if self.velocity.abs() >= VELOCITY_THRESHOLD {
                self.velocity *= FLING_FRICTION_FAST;
            } else {
                self.velocity *= FLING_FRICTION_SLOW;
            }
            true
        }
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    #[cfg(test)]
    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }
}

impl Default for Axis {
    fn default() -> Axis {
        Axis::new()
    }
}
