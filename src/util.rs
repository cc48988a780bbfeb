/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use euclid::{Matrix4D, Point2D};

// TODO: Implement these in euclid!
pub trait MatrixHelpers {
    /// The x component of the 2-D scale this matrix applies.
    fn x_scale(&self) -> f32;
    /// The y component of the 2-D scale this matrix applies.
    fn y_scale(&self) -> f32;
    /// This matrix with an extra 2-D translation folded in after it.
    fn translated_2d(&self, offset: &Point2D<f32>) -> Matrix4D<f32>;
    /// The matrix applying `self` first, then `other` (row-vector order).
    fn then(&self, other: &Matrix4D<f32>) -> Matrix4D<f32>;
    /// Component-wise interpolation towards `other` at `t` in [0, 1].
    fn lerp(&self, other: &Matrix4D<f32>, t: f32) -> Matrix4D<f32>;
}

impl MatrixHelpers for Matrix4D<f32> {
    #[inline]
    fn x_scale(&self) -> f32 {
        self.m11
    }

    #[inline]
    fn y_scale(&self) -> f32 {
        self.m22
    }

    fn translated_2d(&self, offset: &Point2D<f32>) -> Matrix4D<f32> {
        let mut result = *self;
        result.m41 += offset.x;
        result.m42 += offset.y;
        result
    }

    fn then(&self, other: &Matrix4D<f32>) -> Matrix4D<f32> {
        let a = self;
        let b = other;
        let mut m = Matrix4D::identity();
        m.m11 = a.m11 * b.m11 + a.m12 * b.m21 + a.m13 * b.m31 + a.m14 * b.m41;
        m.m12 = a.m11 * b.m12 + a.m12 * b.m22 + a.m13 * b.m32 + a.m14 * b.m42;
        m.m13 = a.m11 * b.m13 + a.m12 * b.m23 + a.m13 * b.m33 + a.m14 * b.m43;
        m.m14 = a.m11 * b.m14 + a.m12 * b.m24 + a.m13 * b.m34 + a.m14 * b.m44;
        m.m21 = a.m21 * b.m11 + a.m22 * b.m21 + a.m23 * b.m31 + a.m24 * b.m41;
        m.m22 = a.m21 * b.m12 + a.m22 * b.m22 + a.m23 * b.m32 + a.m24 * b.m42;
        m.m23 = a.m21 * b.m13 + a.m22 * b.m23 + a.m23 * b.m33 + a.m24 * b.m43;
        m.m24 = a.m21 * b.m14 + a.m22 * b.m24 + a.m23 * b.m34 + a.m24 * b.m44;
        m.m31 = a.m31 * b.m11 + a.m32 * b.m21 + a.m33 * b.m31 + a.m34 * b.m41;
        m.m32 = a.m31 * b.m12 + a.m32 * b.m22 + a.m33 * b.m32 + a.m34 * b.m42;
        m.m33 = a.m31 * b.m13 + a.m32 * b.m23 + a.m33 * b.m33 + a.m34 * b.m43;
        m.m34 = a.m31 * b.m14 + a.m32 * b.m24 + a.m33 * b.m34 + a.m34 * b.m44;
        m.m41 = a.m41 * b.m11 + a.m42 * b.m21 + a.m43 * b.m31 + a.m44 * b.m41;
        m.m42 = a.m41 * b.m12 + a.m42 * b.m22 + a.m43 * b.m32 + a.m44 * b.m42;
        m.m43 = a.m41 * b.m13 + a.m42 * b.m23 + a.m43 * b.m33 + a.m44 * b.m43;
        m.m44 = a.m41 * b.m14 + a.m42 * b.m24 + a.m43 * b.m34 + a.m44 * b.m44;
        m
    }

    fn lerp(&self, other: &Matrix4D<f32>, t: f32) -> Matrix4D<f32> {
        let f = |a: f32, b: f32| a + (b - a) * t;
        let mut m = Matrix4D::identity();
        m.m11 = f(self.m11, other.m11);
        m.m12 = f(self.m12, other.m12);
        m.m13 = f(self.m13, other.m13);
        m.m14 = f(self.m14, other.m14);
        m.m21 = f(self.m21, other.m21);
        m.m22 = f(self.m22, other.m22);
        m.m23 = f(self.m23, other.m23);
        m.m24 = f(self.m24, other.m24);
        m.m31 = f(self.m31, other.m31);
        m.m32 = f(self.m32, other.m32);
        m.m33 = f(self.m33, other.m33);
        m.m34 = f(self.m34, other.m34);
        m.m41 = f(self.m41, other.m41);
        m.m42 = f(self.m42, other.m42);
        m.m43 = f(self.m43, other.m43);
        m.m44 = f(self.m44, other.m44);
        m
    }
}

#[inline]
pub fn round(value: f32) -> i32 {
    value.round() as i32
}
