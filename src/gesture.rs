/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Platform-inspecific gesture interpretation. This sits between the host
//! and the pan/zoom controller: it watches the raw multi-touch stream,
//! decides whether the touches form a pinch or a tap, and synthesizes the
//! corresponding events. Touch events that are not part of a gesture pass
//! straight through to the controller, which needs to see touches ending
//! either way.

use controller::PanZoomController;
use euclid::Point2D;
use internal_types::{EventResult, InputEvent, MultiTouchAction, MultiTouchEvent};
use internal_types::{PinchEvent, PinchPhase, SingleTouch, TapEvent, TapKind};
use std::sync::Arc;

/// Maximum time for a touch on the screen and corresponding lift of the
/// finger to be considered a tap, in milliseconds.
const MAX_TAP_TIME: u64 = 500;

#[derive(Clone, Copy, Debug, Default)]
pub struct GestureConfig {
    /// When set, a tap's confirmation is withheld this many milliseconds
    /// so a second tap inside the window can become a double tap. The
    /// pending confirmation is flushed by the next event past the deadline
    /// or by `flush_pending_tap`. When unset, tap-up and tap-confirmed are
    /// emitted back to back.
    pub tap_confirm_delay_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GestureState {
    NoGesture,
    InPinchGesture,
}

struct PendingTap {
    point: Point2D<i32>,
    deadline: u64,
    /// A second touch sequence began inside the window.
    double_candidate: bool,
}

pub struct GestureRecognizer {
    controller: Arc<PanZoomController>,
    config: GestureConfig,
    state: GestureState,
    /// Currently pressed touches, in arrival order, keyed by the host's
    /// stable identifier.
    touches: Vec<SingleTouch>,
    previous_span: f32,
    /// Time of the most recent touch-start; zeroed once the sequence can
    /// no longer be a tap.
    touch_start_time: u64,
    pending_tap: Option<PendingTap>,
}

impl GestureRecognizer {
    pub fn new(controller: Arc<PanZoomController>, config: GestureConfig) -> GestureRecognizer {
        GestureRecognizer {
            controller: controller,
            config: config,
            state: GestureState::NoGesture,
            touches: Vec::new(),
            previous_span: 0.0,
            touch_start_time: 0,
            pending_tap: None,
        }
    }

    /// General input handler for a touch event. If the touches form a
    /// gesture the synthesized event is consumed here; otherwise the raw
    /// event is passed along to the controller.
    pub fn handle_touch_event(&mut self, event: &MultiTouchEvent) -> EventResult {
        self.flush_tap_past_deadline(event.time);

        match event.action {
            MultiTouchAction::Start => {
                self.touches.clear();
                if self.state == GestureState::InPinchGesture {
                    self.emit_pinch_end(event);
                }
                self.add_touches(event);
                self.touch_start_time = event.time;
                if let Some(ref mut pending) = self.pending_tap {
                    if event.time <= pending.deadline {
                        pending.double_candidate = true;
                    }
                }
            }
            MultiTouchAction::StartPointer => {
                self.add_touches(event);
            }
            MultiTouchAction::Move => {
                self.touch_start_time = 0;
                // The second gesture turned into motion; it can no longer
                // complete a double tap.
                if self.pending_tap.as_ref().map_or(false, |pending| pending.double_candidate) {
                    self.flush_pending_tap(event.time);
                }
                self.update_touches(event);
            }
            MultiTouchAction::End => {
                self.remove_touches(event);
            }
            MultiTouchAction::Cancel => {
                self.touches.clear();
                if self.state == GestureState::InPinchGesture {
                    self.emit_pinch_end(event);
                }
            }
        }

        if self.touches.len() > 1 {
            // More than one finger down is never a tap.
            self.touch_start_time = 0;
            return self.handle_pinch(event.time);
        } else if self.state == GestureState::InPinchGesture {
            self.emit_pinch_end(event);
            return EventResult::ConsumeNoDefault;
        }

        if event.action == MultiTouchAction::End && self.touch_start_time != 0 &&
           event.time.saturating_sub(self.touch_start_time) <= MAX_TAP_TIME {
            self.handle_tap_completion(event);
        }

        self.controller.handle_input(&InputEvent::MultiTouch(event.clone()))
    }

    /// Emit the withheld tap confirmation. Hosts running the double-tap
    /// timer call this when it fires; deadlines are otherwise checked
    /// against the timestamps of later events.
    pub fn flush_pending_tap(&mut self, now: u64) {
        if let Some(pending) = self.pending_tap.take() {
            self.emit(InputEvent::Tap(TapEvent {
                kind: TapKind::Confirmed,
                point: pending.point,
                time: now,
            }));
        }
    }

    fn flush_tap_past_deadline(&mut self, now: u64) {
        let expired = self.pending_tap.as_ref().map_or(false, |pending| now > pending.deadline);
        if expired {
            self.flush_pending_tap(now);
        }
    }

    fn handle_pinch(&mut self, time: u64) -> EventResult {
        let first = self.touches[0];
        let last = self.touches[self.touches.len() - 1];
        let focus_point = Point2D::new((first.screen_point.x + last.screen_point.x) / 2,
                                       (first.screen_point.y + last.screen_point.y) / 2);
        let dx = (first.screen_point.x - last.screen_point.x) as f32;
        let dy = (first.screen_point.y - last.screen_point.y) as f32;
        let current_span = (dx * dx + dy * dy).sqrt();

        if self.state == GestureState::NoGesture {
            self.emit(InputEvent::Pinch(PinchEvent {
                phase: PinchPhase::Start,
                focus_point: focus_point,
                current_span: current_span,
                previous_span: current_span,
                time: time,
            }));
            self.state = GestureState::InPinchGesture;
        } else {
            self.emit(InputEvent::Pinch(PinchEvent {
                phase: PinchPhase::Scale,
                focus_point: focus_point,
                current_span: current_span,
                previous_span: self.previous_span,
                time: time,
            }));
        }
        self.previous_span = current_span;
        EventResult::ConsumeNoDefault
    }

    fn emit_pinch_end(&mut self, event: &MultiTouchEvent) {
        let focus_point = event.touches
            .first()
            .or(self.touches.first())
            .map(|touch| touch.screen_point)
            .unwrap_or(Point2D::zero());
        self.emit(InputEvent::Pinch(PinchEvent {
            phase: PinchPhase::End,
            focus_point: focus_point,
            current_span: self.previous_span,
            previous_span: self.previous_span,
            time: event.time,
        }));
        self.state = GestureState::NoGesture;
    }

    fn handle_tap_completion(&mut self, event: &MultiTouchEvent) {
        let point = event.touches
            .first()
            .map(|touch| touch.screen_point)
            .unwrap_or(Point2D::zero());

        let completes_double = self.pending_tap
            .as_ref()
            .map_or(false, |pending| pending.double_candidate && event.time <= pending.deadline);
        if completes_double {
            self.pending_tap = None;
            self.emit(InputEvent::Tap(TapEvent {
                kind: TapKind::Double,
                point: point,
                time: event.time,
            }));
            return;
        }

        self.emit(InputEvent::Tap(TapEvent {
            kind: TapKind::Up,
            point: point,
            time: event.time,
        }));
        match self.config.tap_confirm_delay_ms {
            None => {
                self.emit(InputEvent::Tap(TapEvent {
                    kind: TapKind::Confirmed,
                    point: point,
                    time: event.time,
                }));
            }
            Some(delay) => {
                self.pending_tap = Some(PendingTap {
                    point: point,
                    deadline: event.time + delay,
                    double_candidate: false,
                });
            }
        }
    }

    fn add_touches(&mut self, event: &MultiTouchEvent) {
        for touch in &event.touches {
            if self.touches.iter().any(|tracked| tracked.identifier == touch.identifier) {
                warn!("touch {} is already tracked, ignoring", touch.identifier);
            } else {
                self.touches.push(*touch);
            }
        }
    }

    fn update_touches(&mut self, event: &MultiTouchEvent) {
        for tracked in &mut self.touches {
            for touch in &event.touches {
                if tracked.identifier == touch.identifier {
                    *tracked = *touch;
                    break;
                }
            }
        }
    }

    fn remove_touches(&mut self, event: &MultiTouchEvent) {
        for touch in &event.touches {
            match self.touches.iter().position(|tracked| tracked.identifier == touch.identifier) {
                Some(index) => {
                    self.touches.remove(index);
                }
                None => warn!("removing untracked touch {}, ignoring", touch.identifier),
            }
        }
    }

    fn emit(&self, event: InputEvent) {
        let _ = self.controller.handle_input(&event);
    }
}

#[cfg(test)]
mod tests {
    use bridge::{ContentBridge, GestureTopic, ObserverEvent};
    use controller::PanZoomController;
    use euclid::{Point2D, Rect, Size2D};
    use internal_types::{MultiTouchAction, MultiTouchEvent, PanZoomState, SingleTouch};
    use std::sync::Arc;
    use std::sync::mpsc::Receiver;
    use super::{GestureConfig, GestureRecognizer};

    fn recognizer(config: GestureConfig)
                  -> (GestureRecognizer, Arc<PanZoomController>, Receiver<ObserverEvent>) {
        let (bridge, receiver) = ContentBridge::new();
        let controller = Arc::new(PanZoomController::new(Arc::new(bridge)));
        controller.set_compositing(true);
        {
            let mut metrics = controller.get_frame_metrics();
            metrics.viewport = Rect::new(Point2D::new(0, 0), Size2D::new(320, 480));
            metrics.css_content_rect =
                Rect::new(Point2D::new(0.0, 0.0), Size2D::new(1280.0, 1920.0));
            metrics.scrollable = true;
            controller.notify_layers_updated(metrics);
        }
        (GestureRecognizer::new(controller.clone(), config), controller, receiver)
    }

    fn touch(id: i32, x: i32, y: i32) -> SingleTouch {
        SingleTouch::new(id, Point2D::new(x, y))
    }

    fn event(action: MultiTouchAction, touches: Vec<SingleTouch>, time: u64) -> MultiTouchEvent {
        MultiTouchEvent {
            action: action,
            touches: touches,
            time: time,
        }
    }

    fn gestures(receiver: &Receiver<ObserverEvent>) -> Vec<GestureTopic> {
        let mut topics = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let ObserverEvent::Gesture(topic, _) = event {
                topics.push(topic);
            }
        }
        topics
    }

    #[test]
    fn single_tap_emits_up_and_confirmed() {
        let (mut recognizer, _controller, receiver) = recognizer(GestureConfig::default());
        recognizer.handle_touch_event(&event(MultiTouchAction::Start,
                                             vec![touch(0, 100, 200)],
                                             0));
        recognizer.handle_touch_event(&event(MultiTouchAction::End,
                                             vec![touch(0, 100, 200)],
                                             100));
        let topics = gestures(&receiver);
        // Tap-up and tap-confirmed both surface as a single-tap message;
        // the touch end itself cancels any content-side highlight.
        assert_eq!(topics,
                   vec![GestureTopic::SingleTap, GestureTopic::SingleTap, GestureTopic::Cancel]);
    }

    #[test]
    fn slow_release_is_not_a_tap() {
        let (mut recognizer, _controller, receiver) = recognizer(GestureConfig::default());
        recognizer.handle_touch_event(&event(MultiTouchAction::Start, vec![touch(0, 10, 10)], 0));
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(0, 10, 10)], 501));
        let topics = gestures(&receiver);
        assert_eq!(topics, vec![GestureTopic::Cancel]);
    }

    #[test]
    fn duplicate_and_unknown_identifiers_are_tolerated() {
        let (mut recognizer, _controller, _receiver) = recognizer(GestureConfig::default());
        recognizer.handle_touch_event(&event(MultiTouchAction::Start, vec![touch(0, 0, 0)], 0));
        // Adding the same identifier again must not create a phantom
        // second finger (which would read as a pinch).
        recognizer.handle_touch_event(&event(MultiTouchAction::StartPointer,
                                             vec![touch(0, 5, 5)],
                                             10));
        assert_eq!(recognizer.touches.len(), 1);
        // Removing a finger that was never tracked is a no-op.
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(9, 0, 0)], 20));
        assert_eq!(recognizer.touches.len(), 1);
    }

    #[test]
    fn two_fingers_drive_a_pinch() {
        let (mut recognizer, controller, _receiver) = recognizer(GestureConfig::default());
        recognizer.handle_touch_event(&event(MultiTouchAction::Start, vec![touch(0, 0, 0)], 0));
        recognizer.handle_touch_event(&event(MultiTouchAction::StartPointer,
                                             vec![touch(1, 100, 0)],
                                             10));
        assert_eq!(controller.state(), PanZoomState::Pinching);

        recognizer.handle_touch_event(&event(MultiTouchAction::Move,
                                             vec![touch(0, 0, 0), touch(1, 200, 0)],
                                             26));
        let resolution = controller.get_frame_metrics().resolution.width;
        assert!((resolution - 2.0).abs() < 1.0e-4, "resolution = {}", resolution);

        // Lifting one finger ends the pinch; the last finger can continue
        // panning.
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(1, 200, 0)], 40));
        assert_eq!(controller.state(), PanZoomState::Panning);
    }

    #[test]
    fn deterministic_event_interpretation() {
        // Equal traces produce equal outputs.
        let trace = [event(MultiTouchAction::Start, vec![touch(0, 0, 0)], 0),
                     event(MultiTouchAction::Move, vec![touch(0, 0, 30)], 16),
                     event(MultiTouchAction::Move, vec![touch(0, 0, 70)], 32),
                     event(MultiTouchAction::End, vec![touch(0, 0, 70)], 48)];

        let run = || {
            let (mut recognizer, controller, _receiver) = recognizer(GestureConfig::default());
            let results: Vec<_> =
                trace.iter().map(|e| recognizer.handle_touch_event(e)).collect();
            (results,
             controller.get_frame_metrics().viewport_scroll_offset,
             controller.state())
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn delayed_confirmation_allows_double_tap() {
        let config = GestureConfig { tap_confirm_delay_ms: Some(300) };
        let (mut recognizer, _controller, receiver) = recognizer(config);

        recognizer.handle_touch_event(&event(MultiTouchAction::Start, vec![touch(0, 50, 50)], 0));
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(0, 50, 50)], 80));
        recognizer.handle_touch_event(&event(MultiTouchAction::Start,
                                             vec![touch(1, 52, 48)],
                                             200));
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(1, 52, 48)], 260));

        let topics = gestures(&receiver);
        assert!(topics.contains(&GestureTopic::DoubleTap), "topics = {:?}", topics);
        // No confirmed single tap slipped through.
        assert_eq!(topics.iter().filter(|t| **t == GestureTopic::SingleTap).count(), 1);
    }

    #[test]
    fn delayed_confirmation_flushes_after_the_window() {
        let config = GestureConfig { tap_confirm_delay_ms: Some(300) };
        let (mut recognizer, _controller, receiver) = recognizer(config);

        recognizer.handle_touch_event(&event(MultiTouchAction::Start, vec![touch(0, 50, 50)], 0));
        recognizer.handle_touch_event(&event(MultiTouchAction::End, vec![touch(0, 50, 50)], 80));
        // Only the up half has been published so far.
        assert_eq!(gestures(&receiver), vec![GestureTopic::SingleTap, GestureTopic::Cancel]);

        recognizer.flush_pending_tap(400);
        assert_eq!(gestures(&receiver), vec![GestureTopic::SingleTap]);
    }
}
