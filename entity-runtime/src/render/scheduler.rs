// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Layered render scheduler
//!
//! The scheduler keeps one queue of drawable producers per layer and, once
//! per frame, draws every visible producer back to front: layers in depth
//! order, then producers by depth key, then by registration order. The
//! result is a total order, so two frames over the same state issue the
//! same draw calls.
//!
//! Three kinds of producer can be registered, all identified by a
//! [`DrawableKey`]:
//!
//! - **Entities**, drawn through [`EntityRecord::draw`] with their
//!   `y + height` depth key so lower objects overlap higher ones.
//! - **Component drawables**, components that draw as a producer of their
//!   own on a layer of their choosing (a shadow under its owner, say).
//! - **Overlays**, standalone [`Drawable`]s the scheduler owns outright:
//!   tile chunks, particle emitters, lighting passes, popups.
//!
//! Registration is keyed, so registering an already registered producer
//! moves it to the new layer and unregistering twice is harmless.

use crate::ecs::{ComponentKind, Entity, EntityRecord, World};
use crate::render::layer::{layers, LayerId, RenderLayer};
use crate::render::surface::{SpriteId, Surface};
use std::any::Any;
use std::collections::HashMap;

/// Identity of a registered producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawableKey {
    /// An entity drawn with its own sprite and component draw hooks
    Entity(Entity),
    /// A component that draws independently of its owner
    Component(Entity, ComponentKind),
    /// A standalone drawable owned by the scheduler
    Overlay(OverlayId),
}

impl DrawableKey {
    /// Entity this producer belongs to, if any
    pub fn owner(&self) -> Option<Entity> {
        match self {
            DrawableKey::Entity(e) | DrawableKey::Component(e, _) => Some(*e),
            DrawableKey::Overlay(_) => None,
        }
    }
}

/// Handle to an overlay owned by a render scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

/// Standalone producer owned by the scheduler
pub trait Drawable {
    /// Layer the producer draws on
    fn layer(&self) -> LayerId;

    /// Sort key within the layer; lower keys draw first
    fn depth_key(&self) -> i32 {
        0
    }

    /// Invisible producers are skipped for the frame
    fn is_visible(&self) -> bool {
        true
    }

    /// Issue draw calls
    fn draw(&self, surface: &mut dyn Surface);

    /// Allow downcasting to the concrete producer
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete producer
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A sprite pinned to a world position, e.g. one chunk of a tile map
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteOverlay {
    /// Sprite to draw
    pub sprite: SpriteId,
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Layer to draw on
    pub layer: LayerId,
    /// Sort key within the layer
    pub depth: i32,
    /// Hidden overlays stay registered but are not drawn
    pub visible: bool,
}

impl SpriteOverlay {
    /// Create a visible overlay with depth key 0
    pub fn new(sprite: SpriteId, x: i32, y: i32, layer: LayerId) -> Self {
        SpriteOverlay {
            sprite,
            x,
            y,
            layer,
            depth: 0,
            visible: true,
        }
    }

    /// Set the sort key
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }
}

impl Drawable for SpriteOverlay {
    fn layer(&self) -> LayerId {
        self.layer
    }

    fn depth_key(&self) -> i32 {
        self.depth
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_sprite(self.sprite, self.x, self.y);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    key: DrawableKey,
    sequence: u64,
}

/// Registry of drawable producers, drawn once per frame in layer order
pub struct RenderScheduler {
    /// Registered layers indexed by `LayerId`
    layers: Vec<RenderLayer>,
    /// Layer ids sorted by depth, ties in registration order
    draw_order: Vec<LayerId>,
    /// Registrations per layer, indexed by `LayerId`, in registration order
    queues: Vec<Vec<Registration>>,
    /// Current layer of every registered producer
    placements: HashMap<DrawableKey, LayerId>,
    overlays: HashMap<OverlayId, Box<dyn Drawable>>,
    next_sequence: u64,
    next_overlay: u64,
    debug_masks: bool,
}

impl RenderScheduler {
    /// Create a scheduler with the standard layers registered
    pub fn new() -> Self {
        let mut scheduler = RenderScheduler {
            layers: Vec::new(),
            draw_order: Vec::new(),
            queues: Vec::new(),
            placements: HashMap::new(),
            overlays: HashMap::new(),
            next_sequence: 0,
            next_overlay: 0,
            debug_masks: false,
        };
        for (name, depth) in layers::STANDARD {
            scheduler.register_layer(RenderLayer::new(name, depth));
        }
        scheduler
    }

    /// Outline every entity's hit mask after drawing it
    pub fn set_debug_masks(&mut self, enabled: bool) {
        self.debug_masks = enabled;
    }

    /// Whether the hit-mask overlay is on
    pub fn debug_masks(&self) -> bool {
        self.debug_masks
    }

    /// Register a layer, or return the existing layer with the same name
    ///
    /// Names compare case-insensitively. Re-registering a name with a
    /// different depth keeps the original depth and logs a warning.
    pub fn register_layer(&mut self, layer: RenderLayer) -> LayerId {
        if let Some(existing) = self.layer_by_name(layer.name()) {
            if self.layers[existing.index()].depth() != layer.depth() {
                log::warn!(
                    "layer '{}' is already registered at depth {}; ignoring depth {}",
                    layer.name(),
                    self.layers[existing.index()].depth(),
                    layer.depth()
                );
            }
            return existing;
        }

        let id = LayerId(self.layers.len() as u32);
        self.layers.push(layer);
        self.queues.push(Vec::new());
        self.draw_order.push(id);
        let layers = &self.layers;
        // Stable sort keeps registration order among equal depths.
        self.draw_order.sort_by_key(|l| layers[l.index()].depth());
        id
    }

    /// Look a layer up by name, ignoring case
    pub fn layer_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name().eq_ignore_ascii_case(name))
            .map(|i| LayerId(i as u32))
    }

    /// Look a layer up by name, falling back to [`layers::FALLBACK`]
    pub fn resolve_layer(&self, name: &str) -> LayerId {
        match self.layer_by_name(name) {
            Some(id) => id,
            None => {
                log::warn!(
                    "unknown render layer '{}'; using {}",
                    name,
                    self.layers[layers::FALLBACK.index()].name()
                );
                layers::FALLBACK
            }
        }
    }

    /// Description of a registered layer
    pub fn layer(&self, id: LayerId) -> Option<&RenderLayer> {
        self.layers.get(id.index())
    }

    /// Registered layers in draw order
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &RenderLayer)> + '_ {
        self.draw_order
            .iter()
            .map(move |id| (*id, &self.layers[id.index()]))
    }

    /// Register a producer on a layer
    ///
    /// A producer that is already registered is moved, taking a fresh place
    /// at the end of its new layer. Unknown layer ids fall back to
    /// [`layers::FALLBACK`]. Returns the layer actually used.
    pub fn register(&mut self, key: DrawableKey, layer: LayerId) -> LayerId {
        let layer = if layer.index() < self.layers.len() {
            layer
        } else {
            log::warn!("{} is not registered; drawing {:?} on the fallback layer", layer, key);
            layers::FALLBACK
        };

        self.unregister(key);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queues[layer.index()].push(Registration { key, sequence });
        self.placements.insert(key, layer);
        layer
    }

    /// Remove a producer; returns whether it was registered
    pub fn unregister(&mut self, key: DrawableKey) -> bool {
        match self.placements.remove(&key) {
            Some(layer) => {
                self.queues[layer.index()].retain(|r| r.key != key);
                true
            }
            None => false,
        }
    }

    /// Remove every producer belonging to an entity
    ///
    /// Returns the number of producers removed.
    pub fn unregister_owner(&mut self, owner: Entity) -> usize {
        let keys: Vec<DrawableKey> = self
            .placements
            .keys()
            .filter(|k| k.owner() == Some(owner))
            .copied()
            .collect();
        for key in &keys {
            self.unregister(*key);
        }
        keys.len()
    }

    /// Check whether a producer is registered
    pub fn is_registered(&self, key: DrawableKey) -> bool {
        self.placements.contains_key(&key)
    }

    /// Layer a producer is currently registered on
    pub fn layer_of(&self, key: DrawableKey) -> Option<LayerId> {
        self.placements.get(&key).copied()
    }

    /// Number of registered producers
    pub fn registered_count(&self) -> usize {
        self.placements.len()
    }

    /// Hand an overlay to the scheduler and register it on its layer
    pub fn add_overlay(&mut self, drawable: Box<dyn Drawable>) -> OverlayId {
        let id = OverlayId(self.next_overlay);
        self.next_overlay += 1;
        let layer = drawable.layer();
        self.overlays.insert(id, drawable);
        self.register(DrawableKey::Overlay(id), layer);
        id
    }

    /// Unregister an overlay and give it back
    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Box<dyn Drawable>> {
        self.unregister(DrawableKey::Overlay(id));
        self.overlays.remove(&id)
    }

    /// Typed access to an overlay
    pub fn overlay<T: Drawable + 'static>(&self, id: OverlayId) -> Option<&T> {
        self.overlays.get(&id)?.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to an overlay
    ///
    /// Changing an overlay's layer takes effect after [`Self::relayer_overlay`].
    pub fn overlay_mut<T: Drawable + 'static>(&mut self, id: OverlayId) -> Option<&mut T> {
        self.overlays.get_mut(&id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Re-register an overlay under the layer it currently reports
    pub fn relayer_overlay(&mut self, id: OverlayId) -> bool {
        let layer = match self.overlays.get(&id) {
            Some(drawable) => drawable.layer(),
            None => return false,
        };
        self.register(DrawableKey::Overlay(id), layer);
        true
    }

    /// Drop every registration and overlay, keeping the configured layers
    pub fn reset(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
        self.placements.clear();
        self.overlays.clear();
        self.next_sequence = 0;
    }

    /// Draw every visible producer, back to front
    ///
    /// The full draw order is computed before any producer draws. Returns
    /// the number of producers drawn.
    pub fn render_frame(&self, world: &World, surface: &mut dyn Surface) -> usize {
        let order = self.frame_order(world);
        for key in &order {
            self.draw_producer(world, *key, surface);
        }
        log::trace!("rendered {} producers", order.len());
        order.len()
    }

    /// Draw order the next frame would use, without drawing
    pub fn frame_order(&self, world: &World) -> Vec<DrawableKey> {
        let mut order = Vec::with_capacity(self.placements.len());
        let mut batch: Vec<(i32, u64, DrawableKey)> = Vec::new();
        for layer in &self.draw_order {
            batch.clear();
            for registration in &self.queues[layer.index()] {
                if let Some(depth) = self.visible_depth(world, registration.key) {
                    batch.push((depth, registration.sequence, registration.key));
                }
            }
            batch.sort_by_key(|&(depth, sequence, _)| (depth, sequence));
            order.extend(batch.iter().map(|&(_, _, key)| key));
        }
        order
    }

    fn visible_depth(&self, world: &World, key: DrawableKey) -> Option<i32> {
        match key {
            DrawableKey::Entity(entity) => {
                let record = world.get(entity)?;
                record.is_visible().then(|| record.depth_key())
            }
            DrawableKey::Component(owner, kind) => {
                let record = world.get(owner)?;
                let drawable = component_drawable(record, kind)?;
                drawable
                    .is_visible(record)
                    .then(|| drawable.depth_key(record))
            }
            DrawableKey::Overlay(id) => {
                let overlay = self.overlays.get(&id)?;
                overlay.is_visible().then(|| overlay.depth_key())
            }
        }
    }

    fn draw_producer(&self, world: &World, key: DrawableKey, surface: &mut dyn Surface) {
        match key {
            DrawableKey::Entity(entity) => {
                if let Some(record) = world.get(entity) {
                    record.draw(surface, self.debug_masks);
                }
            }
            DrawableKey::Component(owner, kind) => {
                if let Some(record) = world.get(owner) {
                    if let Some(drawable) = component_drawable(record, kind) {
                        drawable.render(record, surface);
                    }
                }
            }
            DrawableKey::Overlay(id) => {
                if let Some(overlay) = self.overlays.get(&id) {
                    overlay.draw(surface);
                }
            }
        }
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn component_drawable(
    record: &EntityRecord,
    kind: ComponentKind,
) -> Option<&dyn crate::ecs::ComponentDrawable> {
    record.components().get_dyn(kind)?.as_drawable()
}
