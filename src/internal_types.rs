/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use euclid::{Matrix4D, Point2D};
use layers::Layer;
use util::MatrixHelpers;

/// What the host should do with an input event after the engine has seen it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventResult {
    /// Not handled; the host takes its default action.
    Ignore,
    /// Handled; the host must not take its default action.
    ConsumeNoDefault,
    /// Handled, but the host should still take its default action.
    ConsumeDoDefault,
}

/// Identifier of a shadow layer tree living outside the primary tree.
/// Reference layers name their referent subtree with one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayersId(pub u64);

/// One finger on the screen, keyed by the host's stable identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleTouch {
    pub identifier: i32,
    /// Position in device pixels, relative to the top left of the window.
    pub screen_point: Point2D<i32>,
}

impl SingleTouch {
    pub fn new(identifier: i32, screen_point: Point2D<i32>) -> SingleTouch {
        SingleTouch {
            identifier: identifier,
            screen_point: screen_point,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiTouchAction {
    /// First finger down. Replaces the tracked touch set.
    Start,
    /// An additional finger down. Appends to the tracked touch set.
    StartPointer,
    Move,
    End,
    Cancel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiTouchEvent {
    pub action: MultiTouchAction,
    pub touches: Vec<SingleTouch>,
    /// Monotonic milliseconds.
    pub time: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchPhase {
    Start,
    Scale,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchEvent {
    pub phase: PinchPhase,
    /// Midpoint of the two touches, in device pixels.
    pub focus_point: Point2D<i32>,
    /// Euclidean distance between the two touches.
    pub current_span: f32,
    pub previous_span: f32,
    pub time: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapKind {
    Long,
    Up,
    Confirmed,
    Double,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TapEvent {
    pub kind: TapKind,
    pub point: Point2D<i32>,
    pub time: u64,
}

/// The typed input family accepted by the pan/zoom controller. Events
/// arrive already dispatched by the host; the engine never touches OS
/// input plumbing.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    MultiTouch(MultiTouchEvent),
    Pinch(PinchEvent),
    Tap(TapEvent),
}

impl InputEvent {
    pub fn time(&self) -> u64 {
        match *self {
            InputEvent::MultiTouch(ref event) => event.time,
            InputEvent::Pinch(ref event) => event.time,
            InputEvent::Tap(ref event) => event.time,
        }
    }
}

/// The controller's runtime state. Terminal animation states (`Fling`,
/// `Bounce`, `AnimatedZoom`) are driven by the composite loop until they
/// decide to transition back to `Nothing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanZoomState {
    /// No touch-start events received.
    Nothing,
    /// A finger is down but content has not yet said whether a touch
    /// listener consumed the block.
    WaitingListeners,
    /// One touch-start event received.
    Touching,
    /// Panning without axis lock.
    Panning,
    /// Panning with an axis lock in effect.
    PanningLocked,
    /// In a pan, but the finger is currently stationary.
    PanningHold,
    /// Like `PanningHold`, with the axis lock still in effect.
    PanningHoldLocked,
    /// Two or more fingers down; pan and zoom both allowed.
    Pinching,
    /// All fingers lifted, but the page is still scrolling.
    Fling,
    /// Spring-animating back inside the page bounds.
    Bounce,
    /// Animating towards a requested resolution and offset.
    AnimatedZoom,
}

impl PanZoomState {
    pub fn is_panning(&self) -> bool {
        match *self {
            PanZoomState::Panning |
            PanZoomState::PanningLocked |
            PanZoomState::PanningHold |
            PanZoomState::PanningHoldLocked => true,
            _ => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        match *self {
            PanZoomState::Fling | PanZoomState::Bounce | PanZoomState::AnimatedZoom => true,
            _ => false,
        }
    }
}

/// Everything that can move the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateEvent {
    TouchStart,
    /// A touch-move whose cumulative pan distance crossed the threshold.
    PanThresholdExceeded,
    TouchEnd,
    PinchStart,
    PinchEnd,
    /// A composite tick decided the current animation is finished.
    AnimationFinished,
    /// The running animation ended with the viewport outside the page.
    OverscrollAtRest,
    /// An animated zoom was requested.
    ZoomRequested,
    /// A running animation was cancelled (typically by a new touch).
    AnimationCancelled,
    /// A touch block was forwarded to content; wait for its verdict.
    ContentListenersPending,
    /// Content answered (or the wait timed out).
    ContentListenersResponded,
}

/// Allowed transitions as a total function. Pairs not listed keep the
/// current state, so a stray event can never drive the machine somewhere
/// unnamed.
pub fn transition(state: PanZoomState, event: StateEvent) -> PanZoomState {
    use self::PanZoomState::*;
    use self::StateEvent::*;

    match (state, event) {
        (Nothing, TouchStart) |
        (WaitingListeners, TouchStart) |
        (Fling, TouchStart) |
        (Bounce, TouchStart) |
        (AnimatedZoom, TouchStart) => Touching,

        (Nothing, PanThresholdExceeded) |
        (WaitingListeners, PanThresholdExceeded) |
        (Touching, PanThresholdExceeded) |
        (Fling, PanThresholdExceeded) |
        (Bounce, PanThresholdExceeded) |
        (AnimatedZoom, PanThresholdExceeded) => Panning,

        (Touching, TouchEnd) => Nothing,
        (Panning, TouchEnd) |
        (PanningLocked, TouchEnd) |
        (PanningHold, TouchEnd) |
        (PanningHoldLocked, TouchEnd) => Fling,

        (_, PinchStart) => Pinching,
        (Pinching, PinchEnd) => Panning,

        (Fling, AnimationFinished) |
        (Bounce, AnimationFinished) |
        (AnimatedZoom, AnimationFinished) => Nothing,

        (Fling, OverscrollAtRest) |
        (Pinching, OverscrollAtRest) => Bounce,

        (_, ZoomRequested) => AnimatedZoom,

        (Fling, AnimationCancelled) |
        (Bounce, AnimationCancelled) |
        (AnimatedZoom, AnimationCancelled) => Nothing,

        (Nothing, ContentListenersPending) => WaitingListeners,
        (WaitingListeners, ContentListenersResponded) => Nothing,

        (state, _) => state,
    }
}

/// The async transform for one layer: a translation applied before a
/// non-uniform scale, in row-vector order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translation: Point2D<f32>,
    pub x_scale: f32,
    pub y_scale: f32,
}

impl ViewTransform {
    pub fn new(translation: Point2D<f32>, x_scale: f32, y_scale: f32) -> ViewTransform {
        ViewTransform {
            translation: translation,
            x_scale: x_scale,
            y_scale: y_scale,
        }
    }

    pub fn to_matrix(&self) -> Matrix4D<f32> {
        Matrix4D::create_translation(self.translation.x, self.translation.y, 0.0)
            .then(&Matrix4D::create_scale(self.x_scale, self.y_scale, 1.0))
    }
}

/// Messages accepted by the compositor thread.
pub enum CompositorMsg {
    /// Request a composite, coalesced to the frame rate cap.
    ScheduleComposite,
    /// Stop compositing and release the surface. The sender blocks on the
    /// pause monitor until acknowledged.
    Pause,
    /// Renew the surface at the given widget size and composite. The
    /// sender blocks on the resume monitor until acknowledged.
    Resume { width: i32, height: i32 },
    /// A new shadow tree was committed by the document side.
    ShadowTreeUpdated { root: Layer, first_paint: bool },
    /// Install or drop the referent subtree for an indirect tree ID.
    IndirectTreeUpdated { id: LayersId, root: Option<Layer> },
    /// Tear down the layer tree but keep the thread alive.
    WillStop,
    /// Tear down and exit the compositor thread.
    Stop,
}
