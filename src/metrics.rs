/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use axis::AxisFrame;
use euclid::{Point2D, Rect, Size2D};
use util::round;

/// The authoritative scroll/zoom descriptor exchanged between the
/// controller and the document side.
///
/// All integer fields are device pixels; `css_content_rect` is CSS pixels
/// and therefore zoom-invariant. `content_rect` must always equal
/// `css_content_rect` scaled by `resolution` (rounded); every mutation of
/// the resolution goes through a path that recomputes it before the next
/// frame is committed.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameMetrics {
    /// The visible area. Origin is always (0, 0); the size comes from the
    /// window.
    pub viewport: Rect<i32>,
    /// Origin of the viewport within the page.
    pub viewport_scroll_offset: Point2D<i32>,
    /// The region the document side is asked to rasterize, relative to
    /// `viewport_scroll_offset`.
    pub display_port: Rect<i32>,
    /// The full page at the current zoom.
    pub content_rect: Rect<i32>,
    /// The full page in CSS pixels.
    pub css_content_rect: Rect<f32>,
    /// The current zoom. The x and y components are always equal.
    pub resolution: Size2D<f32>,
    /// False for leaf and fixed layers that cannot scroll.
    pub scrollable: bool,
}

impl FrameMetrics {
    pub fn new() -> FrameMetrics {
        FrameMetrics {
            viewport: Rect::zero(),
            viewport_scroll_offset: Point2D::zero(),
            display_port: Rect::zero(),
            content_rect: Rect::zero(),
            css_content_rect: Rect::zero(),
            resolution: Size2D::new(1.0, 1.0),
            scrollable: false,
        }
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// The page rect at `scale`, rounded to device pixels.
    pub fn content_rect_for_scale(css_content_rect: &Rect<f32>, scale: f32) -> Rect<i32> {
        Rect::new(Point2D::new(round(css_content_rect.origin.x * scale),
                               round(css_content_rect.origin.y * scale)),
                  Size2D::new(round(css_content_rect.size.width * scale),
                              round(css_content_rect.size.height * scale)))
    }

    /// Recompute `content_rect` from the CSS page rect and the current
    /// resolution.
    pub fn update_content_rect(&mut self) {
        self.content_rect =
            FrameMetrics::content_rect_for_scale(&self.css_content_rect, self.resolution.width);
    }

    /// The horizontal projection handed to the axis math.
    pub fn x_frame(&self) -> AxisFrame {
        AxisFrame {
            origin: self.viewport_scroll_offset.x,
            viewport_length: self.viewport.size.width,
            page_start: self.content_rect.origin.x,
            page_length: self.content_rect.size.width,
            css_page_length: self.css_content_rect.size.width,
            resolution: self.resolution.width,
        }
    }

    /// The vertical projection handed to the axis math.
    pub fn y_frame(&self) -> AxisFrame {
        AxisFrame {
            origin: self.viewport_scroll_offset.y,
            viewport_length: self.viewport.size.height,
            page_start: self.content_rect.origin.y,
            page_length: self.content_rect.size.height,
            css_page_length: self.css_content_rect.size.height,
            resolution: self.resolution.width,
        }
    }
}

impl Default for FrameMetrics {
    fn default() -> FrameMetrics {
        FrameMetrics::new()
    }
}
