/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use euclid::Point2D;

pub const STIFFNESS: f32 = 0.2;
pub const DAMPING: f32 = 1.0;

/// Once both the displacement from the destination and the velocity drop
/// below this, the spring snaps to the destination and reports itself
/// settled.
const EPSILON: f32 = 0.1;

/// A damped 2-D spring, stepped once per composite frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    cur: Point2D<f32>,
    velocity: Point2D<f32>,
    dest: Point2D<f32>,
    stiffness: f32,
    damping: f32,
}

impl Spring {
    /// A spring at rest at `pos`.
    pub fn at(pos: Point2D<f32>, stiffness: f32, damping: f32) -> Spring {
        Spring {
            cur: pos,
            velocity: Point2D::new(0.0, 0.0),
            dest: pos,
            stiffness: stiffness,
            damping: damping,
        }
    }

    /// Reset the spring: place it at `cur` moving as if it had just come
    /// from `prev`, heading towards `dest`.
    pub fn coords(&mut self, cur: Point2D<f32>, prev: Point2D<f32>, dest: Point2D<f32>) {
        self.cur = cur;
        self.velocity = Point2D::new(cur.x - prev.x, cur.y - prev.y);
        self.dest = dest;
    }

    pub fn current(&self) -> Point2D<f32> {
        self.cur
    }

    /// Advance the spring one frame. Returns true once it has settled on
    /// the destination.
    pub fn animate(&mut self) -> bool {
        let force_x = (self.dest.x - self.cur.x) * self.stiffness - self.velocity.x * self.damping;
        let force_y = (self.dest.y - self.cur.y) * self.stiffness - self.velocity.y * self.damping;
        self.velocity.x += force_x;
        self.velocity.y += force_y;
        self.cur.x += self.velocity.x;
        self.cur.y += self.velocity.y;

        let displacement_x = self.dest.x - self.cur.x;
        let displacement_y = self.dest.y - self.cur.y;
        if displacement_x.abs() < EPSILON && displacement_y.abs() < EPSILON &&
           self.velocity.x.abs() < EPSILON && self.velocity.y.abs() < EPSILON {
            self.cur = self.dest;
            self.velocity = Point2D::new(0.0, 0.0);
            true
        } else {
            false
        }
    }
}
