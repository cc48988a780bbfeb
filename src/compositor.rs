/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The compositor driver: a dedicated thread that schedules composite
//! frames at the display rate cap, resolves the async pan/zoom transform,
//! counter-translates fixed layers, samples property animations and
//! redraws the shadow tree.

use animation::AnimatedValue;
use controller::PanZoomController;
use error::ApzError;
use euclid::{Matrix4D, Point2D, Rect, Size2D};
use internal_types::{CompositorMsg, LayersId};
use layers::{self, ConnectedReferences, Layer, LayerManager};
use metrics::FrameMetrics;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use time::precise_time_ns;
use util::{MatrixHelpers, round};

/// 60 fps is the most we can achieve; composites closer together than
/// this waste computation.
const MIN_COMPOSITE_INTERVAL_MS: u64 = 15;

struct Monitor {
    acked: Mutex<Option<Result<(), ApzError>>>,
    cvar: Condvar,
}

impl Monitor {
    fn new() -> Monitor {
        Monitor {
            acked: Mutex::new(None),
            cvar: Condvar::new(),
        }
    }

    fn notify(&self, result: Result<(), ApzError>) {
        let mut acked = self.acked.lock().unwrap();
        *acked = Some(result);
        self.cvar.notify_all();
    }
}

/// Handle for talking to the compositor thread. Cheap to clone; every
/// operation is a message send except the pause/resume handshakes, which
/// block the caller until the compositor thread acknowledges.
pub struct CompositorApi {
    sender: Sender<CompositorMsg>,
    pause_monitor: Arc<Monitor>,
    resume_monitor: Arc<Monitor>,
}

impl Clone for CompositorApi {
    fn clone(&self) -> CompositorApi {
        CompositorApi {
            sender: self.sender.clone(),
            pause_monitor: self.pause_monitor.clone(),
            resume_monitor: self.resume_monitor.clone(),
        }
    }
}

impl CompositorApi {
    /// Request a composite. Multiple requests inside one frame interval
    /// coalesce into a single composite.
    pub fn schedule_composite(&self) {
        // A closed channel means the compositor is already gone; dropping
        // the request is the correct transient behavior.
        let _ = self.sender.send(CompositorMsg::ScheduleComposite);
    }

    /// Stop compositing and release the window surface. Blocks until the
    /// compositor thread has actually paused, so the host can tear the
    /// surface down safely afterwards. Must not be called from the
    /// compositor thread.
    pub fn schedule_pause(&self) -> Result<(), ApzError> {
        let mut acked = self.pause_monitor.acked.lock().unwrap();
        *acked = None;
        if self.sender.send(CompositorMsg::Pause).is_err() {
            return Err(ApzError::Transient);
        }
        while acked.is_none() {
            acked = self.pause_monitor.cvar.wait(acked).unwrap();
        }
        acked.take().unwrap()
    }

    /// Renew the surface at the new widget size and composite. Blocks
    /// until the compositor thread has processed the resume. Must not be
    /// called from the compositor thread.
    pub fn schedule_resume(&self, width: i32, height: i32) -> Result<(), ApzError> {
        let mut acked = self.resume_monitor.acked.lock().unwrap();
        *acked = None;
        let msg = CompositorMsg::Resume {
            width: width,
            height: height,
        };
        if self.sender.send(msg).is_err() {
            return Err(ApzError::Transient);
        }
        while acked.is_none() {
            acked = self.resume_monitor.cvar.wait(acked).unwrap();
        }
        acked.take().unwrap()
    }

    /// Commit a new shadow tree from the document side.
    pub fn update_shadow_tree(&self, root: Layer, first_paint: bool) {
        let msg = CompositorMsg::ShadowTreeUpdated {
            root: root,
            first_paint: first_paint,
        };
        let _ = self.sender.send(msg);
    }

    /// Install or drop the referent subtree for an indirect tree ID.
    pub fn update_indirect_tree(&self, id: LayersId, root: Option<Layer>) {
        let _ = self.sender.send(CompositorMsg::IndirectTreeUpdated {
            id: id,
            root: root,
        });
    }

    /// Tear down the layer tree but keep the thread for a later resume.
    pub fn will_stop(&self) {
        let _ = self.sender.send(CompositorMsg::WillStop);
    }

    /// Tear down and exit the compositor thread.
    pub fn stop(&self) {
        let _ = self.sender.send(CompositorMsg::Stop);
    }
}

pub struct Compositor {
    receiver: Receiver<CompositorMsg>,
    layer_manager: Box<LayerManager>,
    controller: Option<Arc<PanZoomController>>,
    pause_monitor: Arc<Monitor>,
    resume_monitor: Arc<Monitor>,
    paused: bool,
    /// Deadline of the queued composite, in nanoseconds; `None` when no
    /// composite is queued.
    composite_deadline: Option<u64>,
    last_compose: Option<u64>,
    first_paint: bool,
    content_rect: Rect<i32>,
    widget_size: Size2D<f32>,
}

/// Start the compositor thread. The returned handle is the only way to
/// talk to it; hand a clone to the pan/zoom controller so it can request
/// repaints.
pub fn spawn_compositor(layer_manager: Box<LayerManager>,
                        controller: Option<Arc<PanZoomController>>)
                        -> (CompositorApi, thread::JoinHandle<()>) {
    let (sender, receiver) = channel();
    let pause_monitor = Arc::new(Monitor::new());
    let resume_monitor = Arc::new(Monitor::new());
    let api = CompositorApi {
        sender: sender,
        pause_monitor: pause_monitor.clone(),
        resume_monitor: resume_monitor.clone(),
    };

    let join_handle = thread::Builder::new()
        .name("Compositor".to_owned())
        .spawn(move || {
            let mut compositor =
                Compositor::new(receiver, layer_manager, controller, pause_monitor,
                                resume_monitor);
            compositor.run();
        })
        .unwrap();

    (api, join_handle)
}

impl Compositor {
    fn new(receiver: Receiver<CompositorMsg>,
           layer_manager: Box<LayerManager>,
           controller: Option<Arc<PanZoomController>>,
           pause_monitor: Arc<Monitor>,
           resume_monitor: Arc<Monitor>)
           -> Compositor {
        Compositor {
            receiver: receiver,
            layer_manager: layer_manager,
            controller: controller,
            pause_monitor: pause_monitor,
            resume_monitor: resume_monitor,
            paused: false,
            composite_deadline: None,
            last_compose: None,
            first_paint: false,
            content_rect: Rect::zero(),
            widget_size: Size2D::new(0.0, 0.0),
        }
    }

    fn run(&mut self) {
        loop {
            let msg = if let Some(deadline) = self.composite_deadline {
                let now = precise_time_ns();
                if now >= deadline {
                    self.composite();
                    continue;
                }
                let wait = Duration::from_millis((deadline - now) / 1_000_000 + 1);
                match self.receiver.recv_timeout(wait) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => {
                        self.composite();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            } else {
                match self.receiver.recv() {
                    Ok(msg) => msg,
                    Err(..) => return,
                }
            };

            match msg {
                CompositorMsg::ScheduleComposite => self.schedule_composition(),
                CompositorMsg::Pause => self.pause(),
                CompositorMsg::Resume { width, height } => self.resume(width, height),
                CompositorMsg::ShadowTreeUpdated { root, first_paint } => {
                    self.shadow_layers_updated(root, first_paint);
                }
                CompositorMsg::IndirectTreeUpdated { id, root } => {
                    layers::set_indirect_layer_tree(id, root);
                }
                CompositorMsg::WillStop => {
                    self.paused = true;
                    self.layer_manager.set_root(None);
                }
                CompositorMsg::Stop => {
                    self.layer_manager.set_root(None);
                    return;
                }
            }
        }
    }

    /// Queue a composite, unless one is already queued. The deadline
    /// enforces the frame rate cap: back-to-back requests are pushed out
    /// to the remainder of the current interval.
    fn schedule_composition(&mut self) {
        if self.composite_deadline.is_some() {
            return;
        }

        let now = precise_time_ns();
        let deadline = match self.last_compose {
            Some(last) => {
                let delta_ms = (now - last) / 1_000_000;
                if delta_ms < MIN_COMPOSITE_INTERVAL_MS {
                    now + (MIN_COMPOSITE_INTERVAL_MS - delta_ms) * 1_000_000
                } else {
                    now
                }
            }
            None => now,
        };
        self.composite_deadline = Some(deadline);
    }

    fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.layer_manager.release_surface();
        }
        // Tell anyone waiting that composition really is paused.
        self.pause_monitor.notify(Ok(()));
    }

    fn resume(&mut self, width: i32, height: i32) {
        self.widget_size = Size2D::new(width as f32, height as f32);
        match self.layer_manager.renew_surface() {
            Ok(()) => {
                self.paused = false;
                self.composite();
                self.resume_monitor.notify(Ok(()));
            }
            Err(error) => {
                error!("compositor resume failed: {}", error);
                if let Some(ref controller) = self.controller {
                    controller.report_error(error.clone());
                }
                self.resume_monitor.notify(Err(error));
            }
        }
    }

    fn shadow_layers_updated(&mut self, mut root: Layer, first_paint: bool) {
        self.first_paint = self.first_paint || first_paint;
        layers::set_shadow_properties(&mut root);
        self.layer_manager.set_root(Some(root));
        self.schedule_composition();
    }

    fn composite(&mut self) {
        self.composite_deadline = None;
        let now = precise_time_ns();
        self.last_compose = Some(now);

        // Racing a teardown or a pause is not an error; the frame just
        // doesn't happen.
        if self.paused || self.layer_manager.root().is_none() {
            return;
        }

        let schedule_again = self.transform_shadow_tree(now);
        self.layer_manager.end_empty_transaction();
        if schedule_again {
            self.schedule_composition();
        }
    }

    fn transform_shadow_tree(&mut self, now_ns: u64) -> bool {
        let mut schedule_again = false;
        let widget_size = self.widget_size;
        let controller = self.controller.clone();

        let root = match self.layer_manager.root_mut() {
            Some(root) => root,
            None => return false,
        };
        // Reference layers borrow their referent subtrees for exactly this
        // frame.
        let mut root = ConnectedReferences::new(root);
        let root_transform = root.transform;

        let scrollable_path = layers::primary_scrollable_path(&root);
        let metrics = match scrollable_path {
            Some(ref path) => layers::layer_at_path(&root, path).metrics.clone(),
            None => FrameMetrics::new(),
        };

        if let Some(ref controller) = controller {
            if self.first_paint {
                controller.adopt_first_paint(metrics.viewport_scroll_offset,
                                             1.0 / root_transform.x_scale(),
                                             metrics.content_rect,
                                             metrics.css_content_rect);
                controller.publish_viewport();
                self.first_paint = false;
                self.content_rect = metrics.content_rect;
            } else if metrics.content_rect != self.content_rect {
                self.content_rect = metrics.content_rect;
                controller.adopt_page_rect(metrics.css_content_rect);
                controller.publish_viewport();
            }

            // Advance any fling, bounce or zoom by one frame.
            if controller.advance_animations() {
                schedule_again = true;
            }
            if controller.take_layers_updated() {
                schedule_again = true;
            }

            let (tree_transform, fixed_translation) =
                controller.get_content_transform_for_frame(&metrics,
                                                           &root_transform,
                                                           &widget_size);
            if let Some(ref path) = scrollable_path {
                let layer = layers::layer_at_path_mut(&mut root, path);
                let current_transform = layer.transform;
                layer.set_shadow_transform(tree_transform.then(&current_transform));
            }
            translate_fixed_layers(&mut root, &fixed_translation, false);
        }

        let mut active_animation = false;
        sample_animations(&mut root, now_ns / 1_000_000, &mut active_animation);
        if active_animation {
            schedule_again = true;
        }

        schedule_again
    }
}

/// Move fixed-position layers (and their clips) opposite the async
/// scroll, so they stay anchored to the viewport. Layers nested under a
/// fixed ancestor already move with it.
fn translate_fixed_layers(layer: &mut Layer, translation: &Point2D<f32>, ancestor_fixed: bool) {
    if layer.fixed_position && !ancestor_fixed {
        let transform = layer.transform.translated_2d(translation);
        layer.set_shadow_transform(transform);
        if let Some(clip_rect) = layer.clip_rect {
            let moved =
                clip_rect.translate(&Point2D::new(round(translation.x), round(translation.y)));
            layer.set_shadow_clip_rect(Some(moved));
        }
    }
    let ancestor_fixed = ancestor_fixed || layer.fixed_position;
    for index in 0..layer.child_count() {
        translate_fixed_layers(layer.child_at_mut(index), translation, ancestor_fixed);
    }
}

/// Sample every layer's property animations at `now`. Expired animations
/// are removed on the frame they expire; `active` reports whether any
/// animation remains.
fn sample_animations(layer: &mut Layer, now_ms: u64, active: &mut bool) {
    let mut sampled = Vec::new();
    layer.animations.retain(|animation| match animation.sample(now_ms) {
        Some(value) => {
            sampled.push(value);
            true
        }
        None => false,
    });

    let scaling = Matrix4D::create_scale(layer.transform.x_scale(),
                                         layer.transform.y_scale(),
                                         1.0);
    for value in sampled {
        *active = true;
        match value {
            AnimatedValue::Opacity(opacity) => layer.set_shadow_opacity(opacity),
            AnimatedValue::Transform(matrix) => {
                layer.set_shadow_transform(matrix.then(&scaling));
            }
        }
    }

    for index in 0..layer.child_count() {
        sample_animations(layer.child_at_mut(index), now_ms, active);
    }
}
