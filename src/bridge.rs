/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The content-side bridge: viewport and gesture notifications headed for
//! the document-side runtime. Payloads stay typed at this boundary; the
//! serde derives produce the wire JSON only when a downstream observer
//! actually wants text.

use error::ApzError;
use euclid::{Point2D, Rect};
use metrics::FrameMetrics;
use serde_json;
use std::fmt;
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DisplayPortPayload {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub resolution: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportPayload {
    pub x: i32,
    pub y: i32,
    pub zoom: f32,
    #[serde(rename = "displayPort")]
    pub display_port: DisplayPortPayload,
}

impl ViewportPayload {
    pub fn new(metrics: &FrameMetrics, display_port: &Rect<i32>) -> ViewportPayload {
        ViewportPayload {
            x: metrics.viewport_scroll_offset.x,
            y: metrics.viewport_scroll_offset.y,
            // The x and y scales are interchangeable here.
            zoom: metrics.resolution.width,
            display_port: DisplayPortPayload {
                left: display_port.origin.x,
                top: display_port.origin.y,
                right: display_port.max_x(),
                bottom: display_port.max_y(),
                resolution: metrics.resolution.width,
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GesturePayload {
    pub x: i32,
    pub y: i32,
}

impl GesturePayload {
    pub fn new(point: Point2D<i32>) -> GesturePayload {
        GesturePayload {
            x: point.x,
            y: point.y,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureTopic {
    LongPress,
    SingleTap,
    DoubleTap,
    Cancel,
}

impl GestureTopic {
    pub fn as_str(&self) -> &'static str {
        match *self {
            GestureTopic::LongPress => "Gesture:LongPress",
            GestureTopic::SingleTap => "Gesture:SingleTap",
            GestureTopic::DoubleTap => "Gesture:DoubleTap",
            GestureTopic::Cancel => "Gesture:Cancel",
        }
    }
}

/// One queued message for the observer thread, drained in FIFO order.
pub enum ObserverEvent {
    /// Topic "Viewport:Change".
    ViewportChange(ViewportPayload),
    Gesture(GestureTopic, GesturePayload),
    /// A completion sink hopping to the observer thread. Invoke it.
    Callback(Box<FnOnce() + Send>),
    /// An auxiliary-object failure forwarded from the compositor.
    Error(ApzError),
}

impl fmt::Debug for ObserverEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ObserverEvent::ViewportChange(ref payload) => {
                write!(f, "ViewportChange({:?})", payload)
            }
            ObserverEvent::Gesture(topic, ref payload) => {
                write!(f, "Gesture({}, {:?})", topic.as_str(), payload)
            }
            ObserverEvent::Callback(..) => write!(f, "Callback(..)"),
            ObserverEvent::Error(ref error) => write!(f, "Error({:?})", error),
        }
    }
}

/// Where the controller publishes state changes bound for the document
/// side. Implementations must deliver asynchronously; no caller of these
/// methods may block on the observer thread.
pub trait ContentController: Send + Sync {
    /// Topic "Viewport:Change": updated metrics for the document to repaint
    /// against. `display_port` is relative to the scroll offset.
    fn send_viewport_change(&self, metrics: &FrameMetrics, display_port: &Rect<i32>);

    /// One of the "Gesture:*" topics, with the point in layer coordinates.
    fn send_gesture_event(&self, topic: GestureTopic, point: Point2D<i32>);

    /// Run a one-shot callback on the observer thread. Used for completion
    /// sinks, which fire exactly once there.
    fn post(&self, callback: Box<FnOnce() + Send>);

    /// Forward a failure to the observer thread.
    fn report_error(&self, error: ApzError);
}

/// A `ContentController` backed by a channel to the observer thread.
pub struct ContentBridge {
    sender: Mutex<Sender<ObserverEvent>>,
}

impl ContentBridge {
    pub fn new() -> (ContentBridge, Receiver<ObserverEvent>) {
        let (sender, receiver) = channel();
        (ContentBridge { sender: Mutex::new(sender) }, receiver)
    }

    fn send(&self, event: ObserverEvent) {
        // A disconnected observer means teardown is underway; drop the
        // notification rather than surface a transient error.
        let _ = self.sender.lock().unwrap().send(event);
    }
}

impl ContentController for ContentBridge {
    fn send_viewport_change(&self, metrics: &FrameMetrics, display_port: &Rect<i32>) {
        self.send(ObserverEvent::ViewportChange(ViewportPayload::new(metrics, display_port)));
    }

    fn send_gesture_event(&self, topic: GestureTopic, point: Point2D<i32>) {
        self.send(ObserverEvent::Gesture(topic, GesturePayload::new(point)));
    }

    fn post(&self, callback: Box<FnOnce() + Send>) {
        self.send(ObserverEvent::Callback(callback));
    }

    fn report_error(&self, error: ApzError) {
        self.send(ObserverEvent::Error(error));
    }
}
