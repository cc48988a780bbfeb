/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The compositor's shadow layer tree: a mirror of the document's logical
//! tree carrying the transforms, clips and opacities actually rasterized.
//! The async pan/zoom transform is applied to shadow state only, so the
//! document-side values stay untouched until it repaints.

use animation::Animation;
use error::ApzError;
use euclid::{Matrix4D, Rect};
use fnv::FnvHasher;
use internal_types::LayersId;
use metrics::FrameMetrics;
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// A set of device-pixel rects.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub rects: Vec<Rect<i32>>,
}

impl Region {
    pub fn new() -> Region {
        Region { rects: Vec::new() }
    }

    pub fn from_rect(rect: Rect<i32>) -> Region {
        Region { rects: vec![rect] }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.iter().all(|rect| rect.size.width == 0 || rect.size.height == 0)
    }

    pub fn bounds(&self) -> Rect<i32> {
        let mut bounds: Option<Rect<i32>> = None;
        for rect in &self.rects {
            bounds = Some(match bounds {
                Some(current) => current.union(rect),
                None => *rect,
            });
        }
        bounds.unwrap_or(Rect::zero())
    }
}

impl Default for Region {
    fn default() -> Region {
        Region::new()
    }
}

pub struct Layer {
    pub transform: Matrix4D<f32>,
    pub clip_rect: Option<Rect<i32>>,
    pub visible_region: Region,
    pub opacity: f32,
    /// Fixed-position layers are counter-translated each composite so they
    /// appear anchored to the viewport.
    pub fixed_position: bool,
    pub metrics: FrameMetrics,
    pub animations: Vec<Animation>,
    pub children: Vec<Layer>,
    /// A reference layer: its subtree lives in another tree, resolved by
    /// ID for the duration of each composite.
    pub reference: Option<LayersId>,

    resolved: Option<Box<Layer>>,

    shadow_transform: Matrix4D<f32>,
    shadow_clip_rect: Option<Rect<i32>>,
    shadow_visible_region: Region,
    shadow_opacity: f32,
}

impl Layer {
    pub fn new() -> Layer {
        Layer {
            transform: Matrix4D::identity(),
            clip_rect: None,
            visible_region: Region::new(),
            opacity: 1.0,
            fixed_position: false,
            metrics: FrameMetrics::new(),
            animations: Vec::new(),
            children: Vec::new(),
            reference: None,
            resolved: None,
            shadow_transform: Matrix4D::identity(),
            shadow_clip_rect: None,
            shadow_visible_region: Region::new(),
            shadow_opacity: 1.0,
        }
    }

    pub fn add_child(&mut self, child: Layer) {
        self.children.push(child);
    }

    pub fn set_shadow_transform(&mut self, transform: Matrix4D<f32>) {
        self.shadow_transform = transform;
    }

    pub fn set_shadow_clip_rect(&mut self, clip_rect: Option<Rect<i32>>) {
        self.shadow_clip_rect = clip_rect;
    }

    pub fn set_shadow_visible_region(&mut self, region: Region) {
        self.shadow_visible_region = region;
    }

    pub fn set_shadow_opacity(&mut self, opacity: f32) {
        self.shadow_opacity = opacity;
    }

    pub fn shadow_transform(&self) -> &Matrix4D<f32> {
        &self.shadow_transform
    }

    pub fn shadow_clip_rect(&self) -> Option<&Rect<i32>> {
        self.shadow_clip_rect.as_ref()
    }

    pub fn shadow_visible_region(&self) -> &Region {
        &self.shadow_visible_region
    }

    pub fn shadow_opacity(&self) -> f32 {
        self.shadow_opacity
    }

    /// Number of children, counting a connected referent subtree.
    pub fn child_count(&self) -> usize {
        self.children.len() + if self.resolved.is_some() { 1 } else { 0 }
    }

    pub fn child_at(&self, index: usize) -> &Layer {
        if index < self.children.len() {
            &self.children[index]
        } else {
            self.resolved.as_ref().expect("child index out of range")
        }
    }

    pub fn child_at_mut(&mut self, index: usize) -> &mut Layer {
        if index < self.children.len() {
            &mut self.children[index]
        } else {
            self.resolved.as_mut().expect("child index out of range")
        }
    }
}

/// Copy every layer's committed properties to its shadow copies. Run when
/// a new tree arrives, before any async transform is applied on top.
pub fn set_shadow_properties(layer: &mut Layer) {
    layer.shadow_transform = layer.transform;
    layer.shadow_clip_rect = layer.clip_rect;
    layer.shadow_visible_region = layer.visible_region.clone();
    layer.shadow_opacity = layer.opacity;
    for child in &mut layer.children {
        set_shadow_properties(child);
    }
}

/// Breadth-first search for the first scrollable layer; the path returned
/// indexes through `child_at`. `None` means every layer is a leaf or
/// fixed, and the composite applies identity transforms.
pub fn primary_scrollable_path(root: &Layer) -> Option<Vec<usize>> {
    let mut queue: Vec<Vec<usize>> = vec![Vec::new()];
    while !queue.is_empty() {
        let path = queue.remove(0);
        let layer = layer_at_path(root, &path);
        if layer.metrics.is_scrollable() {
            return Some(path);
        }
        for index in 0..layer.child_count() {
            let mut child_path = path.clone();
            child_path.push(index);
            queue.push(child_path);
        }
    }
    None
}

pub fn layer_at_path<'a>(root: &'a Layer, path: &[usize]) -> &'a Layer {
    let mut layer = root;
    for &index in path {
        layer = layer.child_at(index);
    }
    layer
}

pub fn layer_at_path_mut<'a>(root: &'a mut Layer, path: &[usize]) -> &'a mut Layer {
    let mut layer = root;
    for &index in path {
        layer = layer.child_at_mut(index);
    }
    layer
}

/// Told when an empty transaction has produced a new frame to draw.
pub trait RenderNotifier: Send {
    fn new_frame_ready(&mut self);
}

/// The surface the compositor drives. Concrete graphics backends live
/// behind this; the engine only mutates shadow state and asks for
/// redraws.
pub trait LayerManager: Send {
    fn root(&self) -> Option<&Layer>;
    fn root_mut(&mut self) -> Option<&mut Layer>;
    fn set_root(&mut self, root: Option<Layer>);
    /// The window surface is going away (compositor pause).
    fn release_surface(&mut self) {}
    /// Recreate the window surface on resume.
    fn renew_surface(&mut self) -> Result<(), ApzError> {
        Ok(())
    }
    /// Redraw the current shadow tree without any content changes.
    fn end_empty_transaction(&mut self);
}

/// A layer manager with no rendering backend: it holds the tree and
/// reports frames to a notifier.
pub struct BasicLayerManager {
    root: Option<Layer>,
    notifier: Option<Box<RenderNotifier>>,
}

impl BasicLayerManager {
    pub fn new(notifier: Option<Box<RenderNotifier>>) -> BasicLayerManager {
        BasicLayerManager {
            root: None,
            notifier: notifier,
        }
    }
}

impl LayerManager for BasicLayerManager {
    fn root(&self) -> Option<&Layer> {
        self.root.as_ref()
    }

    fn root_mut(&mut self) -> Option<&mut Layer> {
        self.root.as_mut()
    }

    fn set_root(&mut self, root: Option<Layer>) {
        self.root = root;
    }

    fn end_empty_transaction(&mut self) {
        if let Some(ref mut notifier) = self.notifier {
            notifier.new_frame_ready();
        }
    }
}

lazy_static! {
    /// Process-wide table mapping tree IDs to detached shadow roots.
    /// Mutated only from the compositor thread: inserts during shadow-tree
    /// updates, removals inside the scoped resolver during a composite.
    static ref INDIRECT_LAYER_TREES: Mutex<HashMap<LayersId,
                                                   Layer,
                                                   BuildHasherDefault<FnvHasher>>> =
        Mutex::new(HashMap::with_hasher(Default::default()));
}

/// Install (or with `None`, drop) the referent subtree for an indirect
/// tree ID.
pub fn set_indirect_layer_tree(id: LayersId, root: Option<Layer>) {
    let mut trees = INDIRECT_LAYER_TREES.lock().unwrap();
    match root {
        Some(root) => {
            trees.insert(id, root);
        }
        None => {
            trees.remove(&id);
        }
    }
}

/// Scoped connection of reference layers to their referent subtrees.
/// Referents are moved out of the process-wide table on entry and moved
/// back on drop, so every exit path (including unwinding) leaves the
/// table whole.
pub struct ConnectedReferences<'a> {
    root: &'a mut Layer,
}

impl<'a> ConnectedReferences<'a> {
    pub fn new(root: &'a mut Layer) -> ConnectedReferences<'a> {
        {
            let mut trees = INDIRECT_LAYER_TREES.lock().unwrap();
            let mut seen = HashSet::new();
            connect(root, &mut trees, &mut seen);
        }
        ConnectedReferences { root: root }
    }
}

fn connect(layer: &mut Layer,
           trees: &mut HashMap<LayersId, Layer, BuildHasherDefault<FnvHasher>>,
           seen: &mut HashSet<LayersId>) {
    if let Some(id) = layer.reference {
        assert!(seen.insert(id),
                "indirect tree {:?} referenced twice in one composite",
                id);
        match trees.remove(&id) {
            Some(mut subtree) => {
                connect(&mut subtree, trees, seen);
                layer.resolved = Some(Box::new(subtree));
            }
            None => {
                debug!("no indirect tree registered for {:?}", id);
            }
        }
    }
    for child in &mut layer.children {
        connect(child, trees, seen);
    }
}

fn disconnect(layer: &mut Layer,
              trees: &mut HashMap<LayersId, Layer, BuildHasherDefault<FnvHasher>>) {
    if let Some(boxed) = layer.resolved.take() {
        let mut subtree = *boxed;
        disconnect(&mut subtree, trees);
        let id = layer.reference.expect("resolved subtree without a reference ID");
        trees.insert(id, subtree);
    }
    for child in &mut layer.children {
        disconnect(child, trees);
    }
}

impl<'a> Drop for ConnectedReferences<'a> {
    fn drop(&mut self) {
        let mut trees = INDIRECT_LAYER_TREES.lock().unwrap();
        disconnect(self.root, &mut trees);
    }
}

impl<'a> Deref for ConnectedReferences<'a> {
    type Target = Layer;
    fn deref(&self) -> &Layer {
        self.root
    }
}

impl<'a> DerefMut for ConnectedReferences<'a> {
    fn deref_mut(&mut self) -> &mut Layer {
        self.root
    }
}
