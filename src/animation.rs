/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Property animations sampled by the compositor: opacity and transform
//! values interpolated across keyframe segments at composite time.

use euclid::Matrix4D;
use util::MatrixHelpers;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationDirection {
    Normal,
    Reverse,
    Alternate,
    AlternateReverse,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimingFunction {
    Linear,
    /// Control points (x1, y1, x2, y2) of a unit cubic bezier.
    CubicBezier(f32, f32, f32, f32),
    /// Jump-at-end steps.
    Steps(u32),
}

impl TimingFunction {
    /// Map a linear progress value in [0, 1] through this function.
    pub fn evaluate(&self, t: f32) -> f32 {
        match *self {
            TimingFunction::Linear => t,
            TimingFunction::CubicBezier(x1, y1, x2, y2) => {
                bezier_y(solve_bezier_x(x1, x2, t), y1, y2)
            }
            TimingFunction::Steps(count) => {
                if count == 0 {
                    return t;
                }
                ((t * count as f32).floor() / count as f32).min(1.0)
            }
        }
    }
}

fn bezier_component(t: f32, p1: f32, p2: f32) -> f32 {
    // Unit bezier with endpoints pinned at 0 and 1.
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1 + 3.0 * one_minus_t * t * t * p2 + t * t * t
}

fn bezier_component_derivative(t: f32, p1: f32, p2: f32) -> f32 {
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * p1 + 6.0 * one_minus_t * t * (p2 - p1) +
    3.0 * t * t * (1.0 - p2)
}

fn bezier_y(t: f32, y1: f32, y2: f32) -> f32 {
    bezier_component(t, y1, y2)
}

/// Find the curve parameter whose x coordinate is `x`: a few Newton
/// iterations, falling back to bisection when the derivative collapses.
fn solve_bezier_x(x1: f32, x2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let mut t = x;
    for _ in 0..8 {
        let error = bezier_component(t, x1, x2) - x;
        if error.abs() < 1.0e-5 {
            return t;
        }
        let derivative = bezier_component_derivative(t, x1, x2);
        if derivative.abs() < 1.0e-6 {
            break;
        }
        t -= error / derivative;
    }

    let mut low = 0.0f32;
    let mut high = 1.0f32;
    t = x;
    for _ in 0..32 {
        let current = bezier_component(t, x1, x2);
        if (current - x).abs() < 1.0e-5 {
            break;
        }
        if current < x {
            low = t;
        } else {
            high = t;
        }
        t = (low + high) * 0.5;
    }
    t
}

/// A property value at a segment endpoint, and the result of sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimatedValue {
    Opacity(f32),
    Transform(Matrix4D<f32>),
}

/// One keyframe span of an animation, covering
/// [`start_portion`, `end_portion`] of an iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSegment {
    pub start_state: AnimatedValue,
    pub end_state: AnimatedValue,
    pub start_portion: f32,
    pub end_portion: f32,
    pub timing: TimingFunction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    /// Compositor-clock milliseconds.
    pub start_time: u64,
    /// Length of one iteration, in milliseconds.
    pub duration: u64,
    /// -1 means run until removed.
    pub num_iterations: i32,
    pub direction: AnimationDirection,
    pub segments: Vec<AnimationSegment>,
}

impl Animation {
    /// The fractional position within the current iteration, direction
    /// applied. `None` once the animation has expired.
    pub fn position_in_iteration(&self, now: u64) -> Option<f32> {
        if self.duration == 0 {
            return None;
        }
        if now < self.start_time {
            return Some(0.0);
        }

        let elapsed = (now - self.start_time) as f64 / self.duration as f64;
        if self.num_iterations != -1 && elapsed >= self.num_iterations as f64 {
            return None;
        }

        let iteration = elapsed.floor() as u64;
        let position = (elapsed - elapsed.floor()) as f32;
        let reversed = match self.direction {
            AnimationDirection::Normal => false,
            AnimationDirection::Reverse => true,
            AnimationDirection::Alternate => iteration % 2 == 1,
            AnimationDirection::AlternateReverse => iteration % 2 == 0,
        };
        Some(if reversed { 1.0 - position } else { position })
    }

    /// Sample the animated property at `now`. `None` once expired, which
    /// is the caller's cue to drop the animation this frame.
    pub fn sample(&self, now: u64) -> Option<AnimatedValue> {
        let position = match self.position_in_iteration(now) {
            Some(position) => position,
            None => return None,
        };
        debug_assert!(0.0 <= position && position <= 1.0);

        if self.segments.is_empty() {
            return None;
        }

        // Segment lists are small; a linear scan beats anything clever.
        let mut index = 0;
        while self.segments[index].end_portion < position && index + 1 < self.segments.len() {
            index += 1;
        }
        let segment = &self.segments[index];

        let span = segment.end_portion - segment.start_portion;
        let position_in_segment = if span <= 0.0 {
            0.0
        } else {
            ((position - segment.start_portion) / span).max(0.0).min(1.0)
        };
        let point = segment.timing.evaluate(position_in_segment);

        match (&segment.start_state, &segment.end_state) {
            (&AnimatedValue::Opacity(first), &AnimatedValue::Opacity(last)) => {
                Some(AnimatedValue::Opacity(first + (last - first) * point))
            }
            (&AnimatedValue::Transform(ref first), &AnimatedValue::Transform(ref last)) => {
                Some(AnimatedValue::Transform(first.lerp(last, point)))
            }
            _ => {
                debug_assert!(false, "animation segment endpoints disagree on property");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use euclid::Matrix4D;
    use super::*;

    fn opacity_animation(duration: u64, num_iterations: i32, direction: AnimationDirection)
                         -> Animation {
        Animation {
            start_time: 1000,
            duration: duration,
            num_iterations: num_iterations,
            direction: direction,
            segments: vec![AnimationSegment {
                               start_state: AnimatedValue::Opacity(0.0),
                               end_state: AnimatedValue::Opacity(1.0),
                               start_portion: 0.0,
                               end_portion: 1.0,
                               timing: TimingFunction::Linear,
                           }],
        }
    }

    #[test]
    fn position_stays_in_unit_interval() {
        let animation = opacity_animation(100, -1, AnimationDirection::Alternate);
        for now in (1000..3000).step_by(7) {
            let position = animation.position_in_iteration(now).unwrap();
            assert!(0.0 <= position && position <= 1.0);
        }
    }

    #[test]
    fn expires_after_last_iteration() {
        let animation = opacity_animation(100, 2, AnimationDirection::Normal);
        assert!(animation.position_in_iteration(1199).is_some());
        assert!(animation.position_in_iteration(1200).is_none());
        assert!(animation.sample(1200).is_none());
    }

    #[test]
    fn alternate_direction_reverses_odd_iterations() {
        let animation = opacity_animation(100, -1, AnimationDirection::Alternate);
        let forward = animation.position_in_iteration(1025).unwrap();
        let backward = animation.position_in_iteration(1125).unwrap();
        assert!((forward - 0.25).abs() < 1.0e-3);
        assert!((backward - 0.75).abs() < 1.0e-3);
    }

    #[test]
    fn opacity_interpolates_within_segment() {
        let animation = opacity_animation(100, 1, AnimationDirection::Normal);
        match animation.sample(1050) {
            Some(AnimatedValue::Opacity(value)) => assert!((value - 0.5).abs() < 1.0e-3),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn segment_scan_picks_the_covering_segment() {
        let mut animation = opacity_animation(100, 1, AnimationDirection::Normal);
        animation.segments = vec![AnimationSegment {
                                      start_state: AnimatedValue::Opacity(0.0),
                                      end_state: AnimatedValue::Opacity(0.5),
                                      start_portion: 0.0,
                                      end_portion: 0.5,
                                      timing: TimingFunction::Linear,
                                  },
                                  AnimationSegment {
                                      start_state: AnimatedValue::Opacity(0.5),
                                      end_state: AnimatedValue::Opacity(1.0),
                                      start_portion: 0.5,
                                      end_portion: 1.0,
                                      timing: TimingFunction::Linear,
                                  }];
        match animation.sample(1075) {
            Some(AnimatedValue::Opacity(value)) => assert!((value - 0.75).abs() < 1.0e-3),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn transform_samples_interpolate_matrices() {
        let mut animation = opacity_animation(100, 1, AnimationDirection::Normal);
        animation.segments = vec![AnimationSegment {
                                      start_state:
                                          AnimatedValue::Transform(Matrix4D::identity()),
                                      end_state: AnimatedValue::Transform(
                                          Matrix4D::create_translation(100.0, 0.0, 0.0)),
                                      start_portion: 0.0,
                                      end_portion: 1.0,
                                      timing: TimingFunction::Linear,
                                  }];
        match animation.sample(1050) {
            Some(AnimatedValue::Transform(m)) => assert!((m.m41 - 50.0).abs() < 1.0e-3),
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn bezier_endpoints_and_midpoint() {
        let ease = TimingFunction::CubicBezier(0.25, 0.1, 0.25, 1.0);
        assert_eq!(ease.evaluate(0.0), 0.0);
        assert_eq!(ease.evaluate(1.0), 1.0);
        // The CSS `ease` curve is past 0.8 by its halfway point.
        let mid = ease.evaluate(0.5);
        assert!(mid > 0.75 && mid < 0.9, "mid = {}", mid);
        // Linear control points reproduce the identity.
        let linearish = TimingFunction::CubicBezier(0.25, 0.25, 0.75, 0.75);
        assert!((linearish.evaluate(0.3) - 0.3).abs() < 1.0e-3);
    }

    #[test]
    fn steps_hold_until_the_boundary() {
        let steps = TimingFunction::Steps(4);
        assert_eq!(steps.evaluate(0.1), 0.0);
        assert_eq!(steps.evaluate(0.26), 0.25);
        assert_eq!(steps.evaluate(1.0), 1.0);
    }
}
