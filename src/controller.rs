/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Controller for all panning and zooming logic. Any time a user input
//! must be processed to affect what the user sees, it goes through here:
//! touch, pinch and tap events mutate the viewport, and the compositor
//! queries the resulting async transform every frame.
//!
//! Input entry points run on the UI thread; the animation drivers run on
//! the compositor thread. Shared state sits behind one reader-writer
//! monitor. No operation on this type is reentrant: handlers never call
//! back into other handlers while holding the monitor, and debug builds
//! assert against it.

use axis::{Axis, Overscroll};
use bridge::{ContentController, GestureTopic};
use compositor::CompositorApi;
use error::ApzError;
use euclid::{Matrix4D, Point2D, Rect, Size2D};
use internal_types::{EventResult, InputEvent, MultiTouchEvent, PanZoomState, PinchEvent};
use internal_types::{PinchPhase, StateEvent, TapEvent, TapKind, ViewTransform, transition};
use metrics::FrameMetrics;
use spring::{DAMPING, STIFFNESS, Spring};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use util::{MatrixHelpers, round};

/// Helper for float precision correction.
const EPSILON: f32 = 0.0001;

/// Minimum interval between displayport publications while panning, in
/// milliseconds.
pub const REPAINT_INTERVAL_MS: u64 = 250;

const MIN_ZOOM: f32 = 0.125;
const MAX_ZOOM: f32 = 8.0;

/// The displayport covers this multiple of the viewport in each dimension,
/// centered on the scroll offset.
const DISPLAY_PORT_SIZE_MULTIPLIER: f32 = 2.0;

/// Eased steps for the animated zoom. This sequence looks smoother than
/// simply straight-line zooming.
static ZOOM_ANIMATION_FRAMES: [f32; 16] = [0.00000, 0.10211, 0.19864, 0.29043, 0.37816, 0.46155,
                                           0.54054, 0.61496, 0.68467, 0.74910, 0.80794, 0.86069,
                                           0.90651, 0.94471, 0.97401, 0.99309];

/// Completion sink for an animated zoom. Invoked exactly once, on the
/// observer thread: with `Ok` when the animation lands, or with
/// `Err(Cancelled)` when a newer request or a touch preempts it.
pub type ZoomCompletionSink = Box<FnOnce(Result<(), ApzError>) + Send>;

struct ZoomAnimation {
    frame: usize,
    from_resolution: f32,
    from_offset: Point2D<f32>,
    to_resolution: f32,
    to_offset: Point2D<i32>,
    sink: Option<ZoomCompletionSink>,
}

struct ControllerState {
    state: PanZoomState,
    x: Axis,
    y: Axis,
    metrics: FrameMetrics,
    last_event_time: u64,
    last_zoom_focus: Point2D<i32>,
    last_repaint: u64,
    layers_updated: bool,
    dpi: i32,
    pan_threshold: f32,
    bounce: Option<Spring>,
    zoom: Option<ZoomAnimation>,
}

pub struct PanZoomController {
    state: RwLock<ControllerState>,
    compositing: AtomicBool,
    entered: AtomicBool,
    content: Arc<ContentController>,
    compositor: Mutex<Option<CompositorApi>>,
}

/// Clears the re-entry flag when a write section ends.
struct WriteSection<'a> {
    guard: RwLockWriteGuard<'a, ControllerState>,
    entered: &'a AtomicBool,
}

impl<'a> Drop for WriteSection<'a> {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}

impl PanZoomController {
    pub fn new(content: Arc<ContentController>) -> PanZoomController {
        let dpi = 72;
        PanZoomController {
            state: RwLock::new(ControllerState {
                state: PanZoomState::Nothing,
                x: Axis::new(),
                y: Axis::new(),
                metrics: FrameMetrics::new(),
                last_event_time: 0,
                last_zoom_focus: Point2D::zero(),
                last_repaint: 0,
                layers_updated: false,
                dpi: dpi,
                pan_threshold: dpi as f32 / 16.0,
                bounce: None,
                zoom: None,
            }),
            compositing: AtomicBool::new(false),
            entered: AtomicBool::new(false),
            content: content,
            compositor: Mutex::new(None),
        }
    }

    /// Take the monitor in exclusive mode. Asserts against re-entry in
    /// debug builds; no operation on this type may call back into another.
    fn write_state(&self) -> WriteSection {
        let guard = self.state.write().unwrap();
        #[cfg(debug_assertions)]
        assert!(!self.entered.swap(true, Ordering::Acquire),
                "pan/zoom controller operations are not reentrant");
        WriteSection {
            guard: guard,
            entered: &self.entered,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<ControllerState> {
        self.state.read().unwrap()
    }

    /// The window implementation sets the compositor handle so repaints
    /// can be requested; everything flows through messages from there.
    pub fn set_compositor(&self, api: CompositorApi) {
        *self.compositor.lock().unwrap() = Some(api);
    }

    /// Input is ignored until compositing actually starts.
    pub fn set_compositing(&self, compositing: bool) {
        self.compositing.store(compositing, Ordering::SeqCst);
    }

    pub fn set_dpi(&self, dpi: i32) {
        let mut section = self.write_state();
        section.guard.dpi = dpi;
        section.guard.pan_threshold = dpi as f32 / 16.0;
    }

    pub fn dpi(&self) -> i32 {
        self.read_state().dpi
    }

    /// The window was resized. The scroll offset is deliberately left
    /// untouched.
    pub fn update_viewport_size(&self, width: i32, height: i32) -> Result<(), ApzError> {
        if width <= 0 || height <= 0 {
            return Err(ApzError::InvalidArgument("viewport dimensions must be positive"));
        }
        let mut section = self.write_state();
        section.guard.metrics.viewport = Rect::new(Point2D::zero(), Size2D::new(width, height));
        Ok(())
    }

    /// General handler for any input event; dispatches on the event type.
    pub fn handle_input(&self, event: &InputEvent) -> EventResult {
        if !self.compositing.load(Ordering::SeqCst) {
            return EventResult::Ignore;
        }

        let result = match *event {
            InputEvent::MultiTouch(ref event) => self.handle_touch_event(event),
            InputEvent::Pinch(ref event) => self.handle_pinch_event(event),
            InputEvent::Tap(ref event) => self.handle_tap_event(event),
        };

        self.write_state().guard.last_event_time = event.time();
        result
    }

    fn handle_touch_event(&self, event: &MultiTouchEvent) -> EventResult {
        use internal_types::MultiTouchAction::*;
        match event.action {
            Start | StartPointer => self.on_touch_start(event),
            Move => self.on_touch_move(event),
            End => self.on_touch_end(event),
            Cancel => EventResult::ConsumeNoDefault,
        }
    }

    fn handle_pinch_event(&self, event: &PinchEvent) -> EventResult {
        match event.phase {
            PinchPhase::Start => self.on_scale_begin(event),
            PinchPhase::Scale => self.on_scale(event),
            PinchPhase::End => self.on_scale_end(event),
        }
    }

    fn handle_tap_event(&self, event: &TapEvent) -> EventResult {
        match event.kind {
            TapKind::Long => self.on_gesture_tap(GestureTopic::LongPress, event),
            TapKind::Up => self.on_gesture_tap(GestureTopic::SingleTap, event),
            TapKind::Confirmed => self.on_gesture_tap(GestureTopic::SingleTap, event),
            TapKind::Double => self.on_gesture_tap(GestureTopic::DoubleTap, event),
            TapKind::Cancel => self.on_cancel_tap(),
        }
    }

    fn first_touch_point(event: &MultiTouchEvent) -> Option<Point2D<i32>> {
        match event.touches.first() {
            Some(touch) => Some(touch.screen_point),
            None => {
                warn!("multi-touch event with no touches");
                None
            }
        }
    }

    fn on_touch_start(&self, event: &MultiTouchEvent) -> EventResult {
        let point = match PanZoomController::first_touch_point(event) {
            Some(point) => point,
            None => return EventResult::Ignore,
        };

        let mut section = self.write_state();
        let state = &mut *section.guard;
        if state.state.is_animating() {
            self.cancel_animation(state);
        }
        match state.state {
            PanZoomState::Nothing | PanZoomState::WaitingListeners => {
                state.x.start_touch(point.x);
                state.y.start_touch(point.y);
                state.state = transition(state.state, StateEvent::TouchStart);
            }
            _ => {}
        }
        EventResult::ConsumeNoDefault
    }

    fn on_touch_move(&self, event: &MultiTouchEvent) -> EventResult {
        let point = match PanZoomController::first_touch_point(event) {
            Some(point) => point,
            None => return EventResult::Ignore,
        };

        let cancel_tap;
        {
            let mut section = self.write_state();
            let state = &mut *section.guard;
            match state.state {
                PanZoomState::Nothing |
                PanZoomState::WaitingListeners |
                PanZoomState::Touching |
                PanZoomState::Fling |
                PanZoomState::Bounce |
                PanZoomState::AnimatedZoom => {
                    if PanZoomController::pan_distance(state, point) < state.pan_threshold {
                        return EventResult::ConsumeNoDefault;
                    }
                    // Measure the pan from the threshold crossing, not from
                    // the original touch point.
                    state.last_repaint = event.time;
                    state.x.start_touch(point.x);
                    state.y.start_touch(point.y);
                    state.state = transition(state.state, StateEvent::PanThresholdExceeded);
                    cancel_tap = true;
                }
                PanZoomState::Panning => {
                    self.track_touch(state, point, event.time);
                    cancel_tap = false;
                }
                _ => cancel_tap = false,
            }
        }
        if cancel_tap {
            self.on_cancel_tap();
        }
        EventResult::ConsumeNoDefault
    }

    fn on_touch_end(&self, _event: &MultiTouchEvent) -> EventResult {
        self.on_cancel_tap();

        let mut section = self.write_state();
        let state = &mut *section.guard;
        if state.state.is_panning() {
            self.force_repaint(state);
            self.send_viewport_change(state);
        }
        state.state = transition(state.state, StateEvent::TouchEnd);
        EventResult::ConsumeNoDefault
    }

    fn on_scale_begin(&self, event: &PinchEvent) -> EventResult {
        self.on_cancel_tap();

        let mut section = self.write_state();
        let state = &mut *section.guard;
        if state.state.is_animating() {
            self.cancel_animation(state);
        }
        state.state = transition(state.state, StateEvent::PinchStart);
        state.last_zoom_focus = event.focus_point;
        EventResult::ConsumeNoDefault
    }

    fn on_scale(&self, event: &PinchEvent) -> EventResult {
        if event.previous_span.abs() <= EPSILON {
            // Still handling the pinch; this sample is just unusable.
            return EventResult::ConsumeNoDefault;
        }
        let mut span_ratio = event.current_span / event.previous_span;

        let mut section = self.write_state();
        let state = &mut *section.guard;

        let scale = state.metrics.resolution.width;
        let focus_point = event.focus_point;

        // Track the focus point so the page follows the moving fingers,
        // clamped so the translation cannot leave the page.
        let mut x_focus_change =
            ((state.last_zoom_focus.x - focus_point.x) as f32 / scale) as i32;
        let mut y_focus_change =
            ((state.last_zoom_focus.y - focus_point.y) as f32 / scale) as i32;
        {
            let x_frame = state.metrics.x_frame();
            let y_frame = state.metrics.y_frame();
            if x_frame.displacement_will_overscroll(x_focus_change) != Overscroll::None {
                x_focus_change -= x_frame.displacement_will_overscroll_amount(x_focus_change);
            }
            if y_frame.displacement_will_overscroll(y_focus_change) != Overscroll::None {
                y_focus_change -= y_frame.displacement_will_overscroll_amount(y_focus_change);
            }
        }
        PanZoomController::scroll_by(state, Point2D::new(x_focus_change, y_focus_change));

        // Only scale while inside the zoom limits, and normalize a step
        // that would cross them.
        let mut do_scale = (scale < MAX_ZOOM && span_ratio > 1.0) ||
                           (scale > MIN_ZOOM && span_ratio < 1.0);
        if scale * span_ratio > MAX_ZOOM {
            span_ratio = MAX_ZOOM / scale;
        } else if scale * span_ratio < MIN_ZOOM {
            span_ratio = MIN_ZOOM / scale;
        }

        // Zooming about an off-center focus can push a page edge into
        // view. Compute the counter-displacement that keeps the edge at
        // the boundary, or give up on the scale when the page no longer
        // covers the viewport in both directions.
        let mut needed_displacement_x = 0;
        let mut needed_displacement_y = 0;
        if do_scale {
            let x_frame = state.metrics.x_frame();
            match x_frame.scale_will_overscroll(span_ratio, focus_point.x) {
                Overscroll::None => {}
                Overscroll::Minus | Overscroll::Plus => {
                    needed_displacement_x =
                        -x_frame.scale_will_overscroll_amount(span_ratio, focus_point.x);
                }
                Overscroll::Both => do_scale = false,
            }
        }
        if do_scale {
            let y_frame = state.metrics.y_frame();
            match y_frame.scale_will_overscroll(span_ratio, focus_point.y) {
                Overscroll::None => {}
                Overscroll::Minus | Overscroll::Plus => {
                    needed_displacement_y =
                        -y_frame.scale_will_overscroll_amount(span_ratio, focus_point.y);
                }
                Overscroll::Both => do_scale = false,
            }
        }

        if do_scale {
            PanZoomController::scale_with_focus(state, scale * span_ratio, focus_point);
            if needed_displacement_x != 0 || needed_displacement_y != 0 {
                PanZoomController::scroll_by(state,
                                             Point2D::new(needed_displacement_x,
                                                          needed_displacement_y));
            }
            // Repaint, but don't publish a displayport on every sample.
            self.force_repaint(state);
        }

        state.last_zoom_focus = focus_point;
        EventResult::ConsumeNoDefault
    }

    fn on_scale_end(&self, event: &PinchEvent) -> EventResult {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.state = transition(state.state, StateEvent::PinchEnd);
        state.x.start_touch(event.focus_point.x);
        state.y.start_touch(event.focus_point.y);
        self.force_repaint(state);
        self.send_viewport_change(state);
        EventResult::ConsumeNoDefault
    }

    fn on_gesture_tap(&self, topic: GestureTopic, event: &TapEvent) -> EventResult {
        let point = {
            let state = self.read_state();
            PanZoomController::convert_view_point_to_layer_point(&state.metrics, event.point)
        };
        self.content.send_gesture_event(topic, point);
        EventResult::ConsumeNoDefault
    }

    fn on_cancel_tap(&self) -> EventResult {
        self.content.send_gesture_event(GestureTopic::Cancel, Point2D::zero());
        EventResult::ConsumeNoDefault
    }

    /// Distance travelled since the touch began, in screen pixels. Updates
    /// the axes' positions without disturbing their velocities.
    fn pan_distance(state: &mut ControllerState, point: Point2D<i32>) -> f32 {
        state.x.update_with_touch_at_device_point(point.x, 0);
        state.y.update_with_touch_at_device_point(point.y, 0);
        let x = state.x.pan_distance();
        let y = state.y.pan_distance();
        (x * x + y * y).sqrt() * state.metrics.resolution.width
    }

    fn track_touch(&self, state: &mut ControllerState, point: Point2D<i32>, time: u64) {
        let time_delta = time.saturating_sub(state.last_event_time);
        if time_delta == 0 {
            // Probably a duplicate event; throw it away.
            return;
        }

        state.x.update_with_touch_at_device_point(point.x, time_delta);
        state.y.update_with_touch_at_device_point(point.y, time_delta);

        let scale = state.metrics.resolution.width;
        let x_displacement = state.x.update_and_get_displacement(&state.metrics.x_frame(), scale);
        let y_displacement = state.y.update_and_get_displacement(&state.metrics.y_frame(), scale);
        if x_displacement == 0 && y_displacement == 0 {
            return;
        }

        PanZoomController::scroll_by(state, Point2D::new(x_displacement, y_displacement));
        self.force_repaint(state);

        if time.saturating_sub(state.last_repaint) >= REPAINT_INTERVAL_MS {
            self.send_viewport_change(state);
            state.last_repaint = time;
        }
    }

    fn scroll_by(state: &mut ControllerState, offset: Point2D<i32>) {
        state.metrics.viewport_scroll_offset =
            Point2D::new(state.metrics.viewport_scroll_offset.x + offset.x,
                         state.metrics.viewport_scroll_offset.y + offset.y);
    }

    /// Scale to `scale` (absolute, not a factor) keeping `focus`
    /// stationary on screen. Recomputes the page rect for the new
    /// resolution before anything else can observe the metrics.
    fn scale_with_focus(state: &mut ControllerState, scale: f32, focus: Point2D<i32>) {
        let metrics = &mut state.metrics;
        let scale_factor = scale / metrics.resolution.width;

        let offset = metrics.viewport_scroll_offset;
        metrics.viewport_scroll_offset =
            Point2D::new(round((offset.x + focus.x) as f32 * scale_factor - focus.x as f32),
                         round((offset.y + focus.y) as f32 * scale_factor - focus.y as f32));

        metrics.resolution = Size2D::new(scale, scale);
        metrics.update_content_rect();
    }

    /// The paint area requested from the document side: the viewport
    /// expanded by half its size on every edge, shifted and shrunk to stay
    /// inside the page. Relative to the scroll offset.
    pub fn calculate_display_port(metrics: &FrameMetrics) -> Rect<i32> {
        let scale = metrics.resolution.width;
        let scroll_offset = metrics.viewport_scroll_offset;
        let viewport = &metrics.viewport;
        let content = Rect::new(Point2D::new(metrics.css_content_rect.origin.x * scale,
                                             metrics.css_content_rect.origin.y * scale),
                                Size2D::new(metrics.css_content_rect.size.width * scale,
                                            metrics.css_content_rect.size.height * scale));

        let desired_width = viewport.size.width as f32 * DISPLAY_PORT_SIZE_MULTIPLIER;
        let desired_height = viewport.size.height as f32 * DISPLAY_PORT_SIZE_MULTIPLIER;

        // Centered on the scroll offset: a quarter of the expanded area
        // hangs off each edge of the viewport.
        let mut origin_x = -desired_width / 4.0;
        let mut origin_y = -desired_height / 4.0;
        let mut width = desired_width;
        let mut height = desired_height;

        // If the area crosses the page's top or left, shift it inward and
        // give back the part that would have been painted twice.
        let old_origin_x = origin_x;
        let old_origin_y = origin_y;
        if origin_x + (scroll_offset.x as f32) < content.origin.x {
            origin_x = content.origin.x - scroll_offset.x as f32;
        }
        if origin_y + (scroll_offset.y as f32) < content.origin.y {
            origin_y = content.origin.y - scroll_offset.y as f32;
        }
        width -= origin_x - old_origin_x;
        height -= origin_y - old_origin_y;

        // Align with the far edges of the page.
        if origin_x + width + (scroll_offset.x as f32) > content.max_x() {
            width = (content.max_x() - (origin_x + scroll_offset.x as f32)).max(0.0);
        }
        if origin_y + height + (scroll_offset.y as f32) > content.max_y() {
            height = (content.max_y() - (origin_y + scroll_offset.y as f32)).max(0.0);
        }

        Rect::new(Point2D::new(round(origin_x), round(origin_y)),
                  Size2D::new(round(width), round(height)))
    }

    fn send_viewport_change(&self, state: &mut ControllerState) {
        state.metrics.display_port = PanZoomController::calculate_display_port(&state.metrics);
        self.content.send_viewport_change(&state.metrics, &state.metrics.display_port);
    }

    fn force_repaint(&self, state: &mut ControllerState) {
        state.layers_updated = true;
        if let Some(ref api) = *self.compositor.lock().unwrap() {
            api.schedule_composite();
        }
    }

    /// Recalculate the displayport and publish the current metrics to the
    /// document side.
    pub fn publish_viewport(&self) {
        let mut section = self.write_state();
        self.send_viewport_change(&mut section.guard);
    }

    /// Advance whichever animation is running by one frame. Called once
    /// per composite; returns true while more frames are needed.
    pub fn advance_animations(&self) -> bool {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        match state.state {
            PanZoomState::Fling => self.do_fling(state),
            PanZoomState::Bounce => self.do_bounce(state),
            PanZoomState::AnimatedZoom => self.do_zoom_frame(state),
            _ => false,
        }
    }

    fn do_fling(&self, state: &mut ControllerState) -> bool {
        let continue_x = state.x.fling_apply_friction_or_cancel();
        let continue_y = state.y.fling_apply_friction_or_cancel();
        if !continue_x && !continue_y {
            if state.metrics.x_frame().excess() != 0 || state.metrics.y_frame().excess() != 0 {
                // Ended off the page; spring back inside it.
                self.start_bounce(state);
                return true;
            }
            self.force_repaint(state);
            self.send_viewport_change(state);
            state.state = transition(state.state, StateEvent::AnimationFinished);
            return false;
        }

        let scale = state.metrics.resolution.width;
        let x_displacement = state.x.update_and_get_displacement(&state.metrics.x_frame(), scale);
        let y_displacement = state.y.update_and_get_displacement(&state.metrics.y_frame(), scale);
        PanZoomController::scroll_by(state, Point2D::new(x_displacement, y_displacement));
        self.force_repaint(state);
        self.send_viewport_change(state);
        true
    }

    fn start_bounce(&self, state: &mut ControllerState) {
        let current = Point2D::new(state.metrics.viewport_scroll_offset.x as f32,
                                   state.metrics.viewport_scroll_offset.y as f32);
        let destination = Point2D::new(state.metrics.x_frame().clamped_origin() as f32,
                                       state.metrics.y_frame().clamped_origin() as f32);
        let mut spring = Spring::at(current, STIFFNESS, DAMPING);
        spring.coords(current, current, destination);
        state.bounce = Some(spring);
        state.state = transition(state.state, StateEvent::OverscrollAtRest);
    }

    fn do_bounce(&self, state: &mut ControllerState) -> bool {
        let (finished, current) = match state.bounce {
            Some(ref mut spring) => {
                let finished = spring.animate();
                (finished, spring.current())
            }
            None => (true, Point2D::new(0.0, 0.0)),
        };
        if state.bounce.is_some() {
            state.metrics.viewport_scroll_offset =
                Point2D::new(round(current.x), round(current.y));
            self.force_repaint(state);
        }
        if finished {
            state.bounce = None;
            self.send_viewport_change(state);
            state.state = transition(state.state, StateEvent::AnimationFinished);
            return false;
        }
        true
    }

    /// Animate the resolution and scroll offset to frame `css_rect`. A
    /// newer request cancels an in-flight one through its sink.
    pub fn zoom_to_rect(&self, css_rect: Rect<f32>, sink: Option<ZoomCompletionSink>) {
        let mut section = self.write_state();
        let state = &mut *section.guard;

        self.cancel_animation(state);

        let viewport = &state.metrics.viewport;
        let fit_x = viewport.size.width as f32 / css_rect.size.width.max(1.0);
        let fit_y = viewport.size.height as f32 / css_rect.size.height.max(1.0);
        let to_resolution = fit_x.min(fit_y).max(MIN_ZOOM).min(MAX_ZOOM);

        let page = FrameMetrics::content_rect_for_scale(&state.metrics.css_content_rect,
                                                        to_resolution);
        let max_x = (page.max_x() - viewport.size.width).max(page.origin.x);
        let max_y = (page.max_y() - viewport.size.height).max(page.origin.y);
        let to_offset = Point2D::new(round(css_rect.origin.x * to_resolution)
                                         .min(max_x)
                                         .max(page.origin.x),
                                     round(css_rect.origin.y * to_resolution)
                                         .min(max_y)
                                         .max(page.origin.y));

        state.zoom = Some(ZoomAnimation {
            frame: 0,
            from_resolution: state.metrics.resolution.width,
            from_offset: Point2D::new(state.metrics.viewport_scroll_offset.x as f32,
                                      state.metrics.viewport_scroll_offset.y as f32),
            to_resolution: to_resolution,
            to_offset: to_offset,
            sink: sink,
        });
        state.state = transition(state.state, StateEvent::ZoomRequested);
        self.force_repaint(state);
    }

    fn do_zoom_frame(&self, state: &mut ControllerState) -> bool {
        let done;
        {
            let zoom = match state.zoom {
                Some(ref mut zoom) => zoom,
                None => {
                    state.state = transition(state.state, StateEvent::AnimationFinished);
                    return false;
                }
            };

            if zoom.frame < ZOOM_ANIMATION_FRAMES.len() {
                let t = ZOOM_ANIMATION_FRAMES[zoom.frame];
                let resolution =
                    zoom.from_resolution + (zoom.to_resolution - zoom.from_resolution) * t;
                let x = zoom.from_offset.x + (zoom.to_offset.x as f32 - zoom.from_offset.x) * t;
                let y = zoom.from_offset.y + (zoom.to_offset.y as f32 - zoom.from_offset.y) * t;
                state.metrics.resolution = Size2D::new(resolution, resolution);
                state.metrics.viewport_scroll_offset = Point2D::new(round(x), round(y));
                state.metrics.update_content_rect();
                zoom.frame += 1;
                done = false;
            } else {
                state.metrics.resolution = Size2D::new(zoom.to_resolution, zoom.to_resolution);
                state.metrics.viewport_scroll_offset = zoom.to_offset;
                state.metrics.update_content_rect();
                done = true;
            }
        }

        self.force_repaint(state);
        if done {
            self.send_viewport_change(state);
            if let Some(sink) = state.zoom.take().and_then(|zoom| zoom.sink) {
                self.content.post(Box::new(move || sink(Ok(()))));
            }
            state.state = transition(state.state, StateEvent::AnimationFinished);
            return false;
        }
        true
    }

    /// Stop whatever animation is running. The state moves to rest, so the
    /// next composite tick becomes a no-op; an in-flight zoom resolves its
    /// sink with `Cancelled`.
    fn cancel_animation(&self, state: &mut ControllerState) {
        state.state = transition(state.state, StateEvent::AnimationCancelled);
        state.bounce = None;
        if let Some(sink) = state.zoom.take().and_then(|zoom| zoom.sink) {
            self.content.post(Box::new(move || sink(Err(ApzError::Cancelled))));
        }
    }

    /// A touch block is being consulted with content; hold off treating
    /// touches as pans until `touch_listeners_responded`.
    pub fn wait_for_touch_listeners(&self) {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.state = transition(state.state, StateEvent::ContentListenersPending);
    }

    pub fn touch_listeners_responded(&self) {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.state = transition(state.state, StateEvent::ContentListenersResponded);
    }

    /// The document side published authoritative metrics; adopt them.
    pub fn notify_layers_updated(&self, metrics: FrameMetrics) {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.metrics = metrics;
        state.metrics.update_content_rect();
        state.layers_updated = true;
    }

    /// Seed the metrics from the very first paint of a page.
    pub fn adopt_first_paint(&self,
                             offset: Point2D<i32>,
                             zoom: f32,
                             content_rect: Rect<i32>,
                             css_content_rect: Rect<f32>) {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.metrics.viewport_scroll_offset = offset;
        state.metrics.resolution = Size2D::new(zoom, zoom);
        state.metrics.content_rect = content_rect;
        state.metrics.css_content_rect = css_content_rect;
        state.metrics.scrollable = true;
    }

    /// The page changed size without a first paint; keep the zoom, adopt
    /// the new page rect.
    pub fn adopt_page_rect(&self, css_content_rect: Rect<f32>) {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        state.metrics.css_content_rect = css_content_rect;
        state.metrics.update_content_rect();
    }

    /// Whether a pan or zoom has changed the metrics since the last call.
    pub fn take_layers_updated(&self) -> bool {
        let mut section = self.write_state();
        let state = &mut *section.guard;
        let updated = state.layers_updated;
        state.layers_updated = false;
        updated
    }

    pub fn get_frame_metrics(&self) -> FrameMetrics {
        self.read_state().metrics.clone()
    }

    pub fn state(&self) -> PanZoomState {
        self.read_state().state
    }

    pub fn velocity_vector(&self) -> Point2D<f32> {
        let state = self.read_state();
        Point2D::new(state.x.velocity(), state.y.velocity())
    }

    pub fn report_error(&self, error: ApzError) {
        self.content.report_error(error);
    }

    /// From view coordinates (pixels from the window's top left) to layer
    /// coordinates (pixels from the page origin at the current zoom).
    pub fn convert_view_point_to_layer_point(metrics: &FrameMetrics, view_point: Point2D<i32>)
                                             -> Point2D<i32> {
        let scale = metrics.resolution.width;
        let offset = metrics.viewport_scroll_offset;
        Point2D::new(offset.x + (view_point.x as f32 / scale) as i32,
                     offset.y + (view_point.y as f32 / scale) as i32)
    }

    /// The compositor is about to draw pannable content: derive the tree
    /// transform for the primary scrollable layer and the counter
    /// translation for fixed-position layers, given the frame metrics the
    /// document side last painted with.
    pub fn get_content_transform_for_frame(&self,
                                           frame: &FrameMetrics,
                                           root_transform: &Matrix4D<f32>,
                                           widget_size: &Size2D<f32>)
                                           -> (Matrix4D<f32>, Point2D<f32>) {
        let state = self.read_state();

        // The zoom the document painted at comes from the root layer's
        // transform; what the user sees right now is our resolution. The
        // difference is what the shadow tree must make up each frame until
        // the repaint catches us.
        let root_scale_x = root_transform.x_scale();
        let root_scale_y = root_transform.y_scale();
        let local_scale_x = state.metrics.resolution.width;
        let local_scale_y = state.metrics.resolution.height;

        let metrics_scroll_offset = if frame.is_scrollable() {
            frame.viewport_scroll_offset
        } else {
            Point2D::zero()
        };

        let scroll_compensation = Point2D::new(state.metrics.viewport_scroll_offset.x as f32 /
                                               root_scale_x -
                                               metrics_scroll_offset.x as f32,
                                               state.metrics.viewport_scroll_offset.y as f32 /
                                               root_scale_y -
                                               metrics_scroll_offset.y as f32);
        let tree_transform = ViewTransform::new(Point2D::new(-scroll_compensation.x,
                                                             -scroll_compensation.y),
                                                local_scale_x,
                                                local_scale_y)
            .to_matrix();

        let scale_diff_x = root_scale_x * local_scale_x;
        let scale_diff_y = root_scale_y * local_scale_y;
        let content_rect = &state.metrics.content_rect;
        let offset_x = (state.metrics.viewport_scroll_offset.x as f32 / scale_diff_x)
            .min(content_rect.max_x() as f32 - widget_size.width)
            .max(content_rect.origin.x as f32);
        let offset_y = (state.metrics.viewport_scroll_offset.y as f32 / scale_diff_y)
            .min(content_rect.max_y() as f32 - widget_size.height)
            .max(content_rect.origin.y as f32);
        let reverse_view_translation =
            Point2D::new(offset_x - metrics_scroll_offset.x as f32,
                         offset_y - metrics_scroll_offset.y as f32);

        (tree_transform, reverse_view_translation)
    }
}

#[cfg(test)]
mod tests {
    use bridge::{ContentBridge, ObserverEvent};
    use euclid::{Point2D, Rect, Size2D};
    use internal_types::{InputEvent, MultiTouchAction, MultiTouchEvent, PanZoomState};
    use internal_types::{PinchEvent, PinchPhase, SingleTouch};
    use metrics::FrameMetrics;
    use std::sync::Arc;
    use std::sync::mpsc::Receiver;
    use super::PanZoomController;

    fn controller() -> (Arc<PanZoomController>, Receiver<ObserverEvent>) {
        let (bridge, receiver) = ContentBridge::new();
        let controller = Arc::new(PanZoomController::new(Arc::new(bridge)));
        controller.set_compositing(true);
        let mut metrics = FrameMetrics::new();
        metrics.viewport = Rect::new(Point2D::new(0, 0), Size2D::new(320, 480));
        metrics.css_content_rect = Rect::new(Point2D::new(0.0, 0.0), Size2D::new(1280.0, 1920.0));
        metrics.scrollable = true;
        controller.notify_layers_updated(metrics);
        (controller, receiver)
    }

    fn touch_event(action: MultiTouchAction, x: i32, y: i32, time: u64) -> InputEvent {
        InputEvent::MultiTouch(MultiTouchEvent {
            action: action,
            touches: vec![SingleTouch::new(0, Point2D::new(x, y))],
            time: time,
        })
    }

    fn pinch_event(phase: PinchPhase, focus: Point2D<i32>, current: f32, previous: f32, time: u64)
                   -> InputEvent {
        InputEvent::Pinch(PinchEvent {
            phase: phase,
            focus_point: focus,
            current_span: current,
            previous_span: previous,
            time: time,
        })
    }

    fn pan_to_fling(controller: &PanZoomController) {
        controller.handle_input(&touch_event(MultiTouchAction::Start, 160, 400, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 388, 16));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 387, 32));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 340, 48));
        controller.handle_input(&touch_event(MultiTouchAction::End, 160, 340, 64));
    }

    #[test]
    fn tap_sequence_is_touching_then_nothing() {
        let (controller, _receiver) = controller();
        controller.handle_input(&touch_event(MultiTouchAction::Start, 100, 200, 0));
        assert_eq!(controller.state(), PanZoomState::Touching);
        controller.handle_input(&touch_event(MultiTouchAction::End, 100, 200, 100));
        assert_eq!(controller.state(), PanZoomState::Nothing);
        assert_eq!(controller.get_frame_metrics().viewport_scroll_offset, Point2D::zero());
    }

    #[test]
    fn pan_threshold_reanchors_the_axes() {
        let (controller, _receiver) = controller();
        // DPI 160 makes the threshold 10 device pixels.
        controller.set_dpi(160);
        controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 0, 12, 16));
        assert_eq!(controller.state(), PanZoomState::Panning);
        // The pan is measured from the threshold crossing, so no scroll
        // has happened yet.
        assert_eq!(controller.get_frame_metrics().viewport_scroll_offset, Point2D::zero());
    }

    #[test]
    fn sub_threshold_moves_stay_touching() {
        let (controller, _receiver) = controller();
        controller.set_dpi(160);
        controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 0, 9, 16));
        assert_eq!(controller.state(), PanZoomState::Touching);
    }

    #[test]
    fn panning_scrolls_and_clamps_to_the_page() {
        let (controller, _receiver) = controller();
        controller.handle_input(&touch_event(MultiTouchAction::Start, 160, 400, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 380, 16));
        assert_eq!(controller.state(), PanZoomState::Panning);
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 300, 32));
        let offset = controller.get_frame_metrics().viewport_scroll_offset;
        assert!(offset.y > 0, "offset = {:?}", offset);
        assert!(offset.y <= 1920 - 480);
        assert_eq!(offset.x, 0);
    }

    #[test]
    fn touch_end_after_pan_enters_fling_and_decays_to_nothing() {
        let (controller, _receiver) = controller();
        pan_to_fling(&controller);
        assert_eq!(controller.state(), PanZoomState::Fling);

        let mut frames = 0;
        let mut previous = controller.velocity_vector().y.abs();
        while controller.state() == PanZoomState::Fling {
            controller.advance_animations();
            let velocity = controller.velocity_vector().y.abs();
            assert!(velocity <= previous + 0.001, "velocity rose: {} -> {}", previous, velocity);
            previous = velocity;
            frames += 1;
            assert!(frames < 1000, "fling failed to terminate");
        }
        assert_eq!(controller.state(), PanZoomState::Nothing);
    }

    #[test]
    fn scroll_round_trip_restores_offset() {
        let (controller, _receiver) = controller();
        let mut metrics = controller.get_frame_metrics();
        metrics.viewport_scroll_offset = Point2D::new(300, 500);
        controller.notify_layers_updated(metrics);

        // Equal and opposite pans with no overscroll in either direction.
        // The first move only crosses the threshold; the second one
        // scrolls.
        controller.handle_input(&touch_event(MultiTouchAction::Start, 160, 400, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 380, 16));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 340, 32));
        let after_pan = controller.get_frame_metrics().viewport_scroll_offset;
        assert!(after_pan.y > 500, "pan did not scroll: {:?}", after_pan);
        controller.handle_input(&touch_event(MultiTouchAction::End, 160, 340, 48));

        controller.handle_input(&touch_event(MultiTouchAction::Start, 160, 340, 100));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 360, 116));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 400, 132));
        let after_back = controller.get_frame_metrics().viewport_scroll_offset;
        assert_eq!(after_back, Point2D::new(300, 500));
    }

    #[test]
    fn pinch_updates_resolution_and_content_rect() {
        let (controller, _receiver) = controller();
        controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        controller.handle_input(&pinch_event(PinchPhase::Start, Point2D::new(50, 0), 100.0,
                                             100.0, 10));
        assert_eq!(controller.state(), PanZoomState::Pinching);
        controller.handle_input(&pinch_event(PinchPhase::Scale, Point2D::new(100, 0), 200.0,
                                             100.0, 26));

        let metrics = controller.get_frame_metrics();
        assert!((metrics.resolution.width - 2.0).abs() < 1.0e-4);
        assert_eq!(metrics.content_rect.size, Size2D::new(2560, 3840));

        controller.handle_input(&pinch_event(PinchPhase::End, Point2D::new(100, 0), 200.0,
                                             200.0, 40));
        assert_eq!(controller.state(), PanZoomState::Panning);
    }

    #[test]
    fn pinch_cannot_exceed_zoom_limits() {
        let (controller, _receiver) = controller();
        controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        controller.handle_input(&pinch_event(PinchPhase::Start, Point2D::new(160, 240), 100.0,
                                             100.0, 10));
        // A single huge spread caps at the zoom ceiling.
        controller.handle_input(&pinch_event(PinchPhase::Scale, Point2D::new(160, 240), 2000.0,
                                             100.0, 26));
        assert!(controller.get_frame_metrics().resolution.width <= 8.0 + 1.0e-4);
    }

    #[test]
    fn scale_focus_round_trip_restores_offset() {
        let (controller, _receiver) = controller();
        let mut metrics = controller.get_frame_metrics();
        metrics.viewport_scroll_offset = Point2D::new(200, 300);
        controller.notify_layers_updated(metrics);

        let focus = Point2D::new(120, 200);
        {
            let mut section = controller.write_state();
            let state = &mut *section.guard;
            PanZoomController::scale_with_focus(state, 2.0, focus);
        }
        {
            let mut section = controller.write_state();
            let state = &mut *section.guard;
            PanZoomController::scale_with_focus(state, 1.0, focus);
        }
        let offset = controller.get_frame_metrics().viewport_scroll_offset;
        assert!((offset.x - 200).abs() <= 1, "offset = {:?}", offset);
        assert!((offset.y - 300).abs() <= 1, "offset = {:?}", offset);
    }

    #[test]
    fn content_rect_tracks_resolution_after_operations() {
        let (controller, _receiver) = controller();
        controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        controller.handle_input(&pinch_event(PinchPhase::Start, Point2D::new(160, 240), 100.0,
                                             100.0, 10));
        controller.handle_input(&pinch_event(PinchPhase::Scale, Point2D::new(160, 240), 130.0,
                                             100.0, 26));
        let metrics = controller.get_frame_metrics();
        let expected = super::FrameMetrics::content_rect_for_scale(&metrics.css_content_rect,
                                                                   metrics.resolution.width);
        assert_eq!(metrics.content_rect, expected);
    }

    #[test]
    fn display_port_centered_inside_the_page() {
        let mut metrics = FrameMetrics::new();
        metrics.viewport = Rect::new(Point2D::new(0, 0), Size2D::new(320, 480));
        metrics.css_content_rect = Rect::new(Point2D::new(0.0, 0.0), Size2D::new(1280.0, 1920.0));
        metrics.resolution = Size2D::new(1.0, 1.0);
        metrics.update_content_rect();
        metrics.viewport_scroll_offset = Point2D::new(480, 720);

        let display_port = PanZoomController::calculate_display_port(&metrics);
        assert_eq!(display_port,
                   Rect::new(Point2D::new(-160, -240), Size2D::new(640, 960)));
    }

    #[test]
    fn display_port_clamped_at_top_left() {
        let mut metrics = FrameMetrics::new();
        metrics.viewport = Rect::new(Point2D::new(0, 0), Size2D::new(320, 480));
        metrics.css_content_rect = Rect::new(Point2D::new(0.0, 0.0), Size2D::new(1280.0, 1920.0));
        metrics.resolution = Size2D::new(1.0, 1.0);
        metrics.update_content_rect();
        metrics.viewport_scroll_offset = Point2D::zero();

        let display_port = PanZoomController::calculate_display_port(&metrics);
        assert_eq!(display_port, Rect::new(Point2D::new(0, 0), Size2D::new(480, 720)));
    }

    #[test]
    fn display_port_clamped_at_bottom_right() {
        let mut metrics = FrameMetrics::new();
        metrics.viewport = Rect::new(Point2D::new(0, 0), Size2D::new(320, 480));
        metrics.css_content_rect = Rect::new(Point2D::new(0.0, 0.0), Size2D::new(1280.0, 1920.0));
        metrics.resolution = Size2D::new(1.0, 1.0);
        metrics.update_content_rect();
        metrics.viewport_scroll_offset = Point2D::new(960, 1440);

        let display_port = PanZoomController::calculate_display_port(&metrics);
        assert_eq!(display_port.origin, Point2D::new(-160, -240));
        assert_eq!(display_port.max_x(), 320);
        assert_eq!(display_port.max_y(), 480);
    }

    #[test]
    fn update_viewport_size_preserves_offset() {
        let (controller, _receiver) = controller();
        let mut metrics = controller.get_frame_metrics();
        metrics.viewport_scroll_offset = Point2D::new(5, 7);
        controller.notify_layers_updated(metrics);

        controller.update_viewport_size(640, 960).unwrap();
        let metrics = controller.get_frame_metrics();
        assert_eq!(metrics.viewport.size, Size2D::new(640, 960));
        assert_eq!(metrics.viewport_scroll_offset, Point2D::new(5, 7));
    }

    #[test]
    fn update_viewport_size_rejects_bad_dimensions() {
        let (controller, _receiver) = controller();
        assert!(controller.update_viewport_size(0, 480).is_err());
        assert!(controller.update_viewport_size(320, -1).is_err());
    }

    #[test]
    fn input_ignored_until_compositing() {
        let (bridge, _receiver) = ContentBridge::new();
        let controller = PanZoomController::new(Arc::new(bridge));
        let result = controller.handle_input(&touch_event(MultiTouchAction::Start, 0, 0, 0));
        assert_eq!(result, ::internal_types::EventResult::Ignore);
    }

    #[test]
    fn zoom_to_rect_lands_exactly_and_resolves_sink() {
        let (controller, receiver) = controller();
        controller.zoom_to_rect(Rect::new(Point2D::new(100.0, 150.0), Size2D::new(160.0, 240.0)),
                                Some(Box::new(|result| result.unwrap())));
        assert_eq!(controller.state(), PanZoomState::AnimatedZoom);

        let mut frames = 0;
        while controller.state() == PanZoomState::AnimatedZoom {
            controller.advance_animations();
            frames += 1;
            assert!(frames < 64, "zoom failed to land");
        }

        let metrics = controller.get_frame_metrics();
        assert!((metrics.resolution.width - 2.0).abs() < 1.0e-4);
        assert_eq!(metrics.viewport_scroll_offset, Point2D::new(200, 300));

        // The completion sink hopped to the observer queue exactly once.
        let mut callbacks = 0;
        while let Ok(event) = receiver.try_recv() {
            if let ObserverEvent::Callback(callback) = event {
                callback();
                callbacks += 1;
            }
        }
        assert_eq!(callbacks, 1);
    }

    #[test]
    fn newer_zoom_cancels_the_older_request() {
        use error::ApzError;
        use std::sync::atomic::{AtomicBool, Ordering};

        let (controller, receiver) = controller();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        controller.zoom_to_rect(Rect::new(Point2D::new(0.0, 0.0), Size2D::new(160.0, 240.0)),
                                Some(Box::new(move |result| {
                                    assert_eq!(result, Err(ApzError::Cancelled));
                                    flag.store(true, Ordering::SeqCst);
                                })));
        controller.zoom_to_rect(Rect::new(Point2D::new(50.0, 50.0), Size2D::new(160.0, 240.0)),
                                None);

        while let Ok(event) = receiver.try_recv() {
            if let ObserverEvent::Callback(callback) = event {
                callback();
            }
        }
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn touch_start_cancels_running_fling() {
        let (controller, _receiver) = controller();
        pan_to_fling(&controller);
        assert_eq!(controller.state(), PanZoomState::Fling);

        controller.handle_input(&touch_event(MultiTouchAction::Start, 10, 10, 200));
        assert_eq!(controller.state(), PanZoomState::Touching);
        // The next animation tick is a no-op.
        assert!(!controller.advance_animations());
    }

    #[test]
    fn bounce_springs_back_after_overscrolled_rest() {
        let (controller, _receiver) = controller();
        // Push the offset off the page, as an authoritative update is
        // allowed to do.
        let mut metrics = controller.get_frame_metrics();
        metrics.viewport_scroll_offset = Point2D::new(-40, 0);
        controller.notify_layers_updated(metrics);

        // A pan that only crosses the threshold leaves the offset alone
        // and ends as a zero-velocity fling, which comes to rest still
        // overscrolled.
        controller.handle_input(&touch_event(MultiTouchAction::Start, 160, 400, 0));
        controller.handle_input(&touch_event(MultiTouchAction::Move, 160, 412, 16));
        controller.handle_input(&touch_event(MultiTouchAction::End, 160, 412, 32));
        assert_eq!(controller.state(), PanZoomState::Fling);

        let mut saw_bounce = false;
        let mut frames = 0;
        while controller.state() != PanZoomState::Nothing {
            controller.advance_animations();
            saw_bounce |= controller.state() == PanZoomState::Bounce;
            frames += 1;
            assert!(frames < 2000, "bounce failed to settle");
        }
        assert!(saw_bounce);
        let offset = controller.get_frame_metrics().viewport_scroll_offset;
        assert_eq!(offset.x, 0);
    }

    #[test]
    fn touch_listener_gate_round_trips() {
        let (controller, _receiver) = controller();
        controller.wait_for_touch_listeners();
        assert_eq!(controller.state(), PanZoomState::WaitingListeners);
        // A touch arriving while content deliberates still starts a
        // gesture.
        controller.handle_input(&touch_event(MultiTouchAction::Start, 10, 10, 0));
        assert_eq!(controller.state(), PanZoomState::Touching);
        controller.handle_input(&touch_event(MultiTouchAction::End, 10, 10, 20));

        controller.wait_for_touch_listeners();
        controller.touch_listeners_responded();
        assert_eq!(controller.state(), PanZoomState::Nothing);
    }

    #[test]
    fn transform_identity_when_nothing_moved() {
        let (controller, _receiver) = controller();
        let frame = controller.get_frame_metrics();
        let (transform, fixed) =
            controller.get_content_transform_for_frame(&frame,
                                                       &::euclid::Matrix4D::identity(),
                                                       &Size2D::new(320.0, 480.0));
        assert_eq!(transform.m11, 1.0);
        assert_eq!(transform.m41, 0.0);
        assert_eq!(transform.m42, 0.0);
        assert_eq!(fixed, Point2D::new(0.0, 0.0));
    }

    #[test]
    fn transform_compensates_unpainted_scroll() {
        let (controller, _receiver) = controller();
        // The document painted at offset (0, 0); the user has scrolled to
        // (0, 100) since.
        let painted = controller.get_frame_metrics();
        let mut metrics = painted.clone();
        metrics.viewport_scroll_offset = Point2D::new(0, 100);
        controller.notify_layers_updated(metrics);

        let (transform, fixed) =
            controller.get_content_transform_for_frame(&painted,
                                                       &::euclid::Matrix4D::identity(),
                                                       &Size2D::new(320.0, 480.0));
        // Content slides up while fixed layers are pushed back down.
        assert_eq!(transform.m42, -100.0);
        assert_eq!(fixed, Point2D::new(0.0, 100.0));
    }
}
