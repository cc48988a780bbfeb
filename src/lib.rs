/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! An asynchronous pan/zoom engine: interprets raw multi-touch input into
//! gestures, runs the viewport/zoom state machine with fling and
//! overscroll physics, and publishes the affine transform the compositor
//! applies every frame, so the screen tracks the user's finger while the
//! document-side engine catches up at its own pace.
//!
//! Three threads participate. The UI thread feeds input through
//! [`GestureRecognizer`] and [`PanZoomController::handle_input`]; the
//! compositor thread (spawned by [`spawn_compositor`]) runs the frame
//! loop and drives animations; the observer thread drains
//! [`ObserverEvent`]s carrying viewport and gesture notifications to the
//! document side.

extern crate euclid;
extern crate fnv;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate time;

mod animation;
mod axis;
mod bridge;
mod compositor;
mod controller;
mod error;
mod gesture;
mod internal_types;
mod layers;
mod metrics;
mod spring;
mod util;

pub use animation::{AnimatedValue, Animation, AnimationDirection, AnimationSegment,
                    TimingFunction};
pub use axis::{Axis, AxisFrame, Overscroll};
pub use bridge::{ContentBridge, ContentController, DisplayPortPayload, GesturePayload,
                 GestureTopic, ObserverEvent, ViewportPayload};
pub use compositor::{Compositor, CompositorApi, spawn_compositor};
pub use controller::{PanZoomController, REPAINT_INTERVAL_MS, ZoomCompletionSink};
pub use error::ApzError;
pub use gesture::{GestureConfig, GestureRecognizer};
pub use internal_types::{CompositorMsg, EventResult, InputEvent, LayersId, MultiTouchAction,
                         MultiTouchEvent, PanZoomState, PinchEvent, PinchPhase, SingleTouch,
                         StateEvent, TapEvent, TapKind, ViewTransform, transition};
pub use layers::{BasicLayerManager, ConnectedReferences, Layer, LayerManager, Region,
                 RenderNotifier, set_indirect_layer_tree};
pub use metrics::FrameMetrics;
pub use spring::Spring;
pub use util::MatrixHelpers;
