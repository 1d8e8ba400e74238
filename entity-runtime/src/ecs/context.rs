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
//! Scoped access to runtime services
//!
//! Systems and component hooks never hold on to the world, the render
//! scheduler or the event bus. They receive a context for the duration of
//! one call instead:
//!
//! - [`SystemContext`] is what systems run with, and what the scene uses
//!   for every mutating operation;
//! - [`ComponentContext`] is what a component hook runs with. It knows the
//!   owning entity and can read the owner's other components.
//!
//! While an entity's hooks run, its components are detached from the
//! record so that each hook can borrow the world mutably. Components added
//! from inside a hook are therefore queued and attached as soon as the
//! current pass over the owner's components finishes.

use crate::collision::CollisionType;
use crate::config::RuntimeConfig;
use crate::ecs::component::ComponentSlot;
use crate::ecs::{Component, ComponentKind, Entity, EntityRecord, World};
use crate::events::{EngineEvent, EventBus};
use crate::geometry::HitMask;
use crate::properties::Properties;
use crate::render::{layers, DrawableKey, LayerId, RenderScheduler, SpriteId};
use serde_json::Value;
use std::collections::VecDeque;

/// A component waiting to be attached
pub(crate) struct PendingComponent {
    owner: Entity,
    kind: ComponentKind,
    component: Box<dyn Component>,
}

impl PendingComponent {
    pub(crate) fn new<T: Component>(owner: Entity, component: T) -> Self {
        PendingComponent {
            owner,
            kind: ComponentKind::of::<T>(),
            component: Box::new(component),
        }
    }
}

/// Services available to systems
///
/// While [`SystemContext::dispatch`] runs an entity's hooks, that entity's
/// components are out of its record and the world reports none for it.
pub struct SystemContext<'a> {
    world: &'a mut World,
    renderer: &'a mut RenderScheduler,
    events: &'a EventBus,
    config: &'a RuntimeConfig,
}

impl<'a> SystemContext<'a> {
    /// Bundle the services of a scene
    pub fn new(
        world: &'a mut World,
        renderer: &'a mut RenderScheduler,
        events: &'a EventBus,
        config: &'a RuntimeConfig,
    ) -> Self {
        SystemContext {
            world,
            renderer,
            events,
            config,
        }
    }

    /// The entity arena
    pub fn world(&self) -> &World {
        self.world
    }

    /// Mutable entity arena
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// The render scheduler
    pub fn renderer(&self) -> &RenderScheduler {
        self.renderer
    }

    /// Mutable render scheduler
    pub fn renderer_mut(&mut self) -> &mut RenderScheduler {
        self.renderer
    }

    /// The event bus
    pub fn events(&self) -> &EventBus {
        self.events
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        self.config
    }

    /// Create an entity from a property bag and register it for drawing
    pub fn spawn(&mut self, props: &Properties) -> Entity {
        spawn_entity(self.world, self.renderer, self.config, props)
    }

    /// Add a prepared record and register it for drawing
    pub fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        spawn_record(self.world, self.renderer, record)
    }

    /// Flag an entity as destroyed and stop drawing everything it owns
    pub fn destroy(&mut self, entity: Entity) -> bool {
        destroy_entity(self.world, self.renderer, entity)
    }

    /// Move an entity to another render layer
    pub fn set_render_layer(&mut self, entity: Entity, layer: LayerId) -> bool {
        set_render_layer(self.world, self.renderer, entity, layer)
    }

    /// Attach a component, replacing any component of the same type
    ///
    /// The replaced component's `on_remove` hook runs before the new
    /// component's `attach`. Returns `false` when the owner is absent or
    /// destroyed.
    pub fn add_component<T: Component>(&mut self, owner: Entity, component: T) -> bool {
        self.install(vec![PendingComponent::new(owner, component)])
    }

    /// Detach and drop a component, running its `on_remove` hook
    pub fn remove_component<T: Component>(&mut self, owner: Entity) -> bool {
        let kind = ComponentKind::of::<T>();
        let Some((_, mut removed)) = self
            .world
            .get_mut(owner)
            .and_then(|r| r.components.remove(kind))
        else {
            return false;
        };
        let mut pending = Vec::new();
        {
            let mut ctx = ComponentContext::detached(
                owner,
                self.world,
                self.renderer,
                self.events,
                self.config,
                &mut pending,
            );
            removed.on_remove(&mut ctx);
        }
        self.install(pending);
        true
    }

    /// Run a hook on every component of a live entity, in insertion order
    ///
    /// Returns `false` without calling anything when the entity is absent
    /// or destroyed. An entity destroyed by one of its own hooks still has
    /// the remaining hooks of this pass called.
    ///
    /// The owner's components are lifted out of its record for the pass, so
    /// `world().component::<T>(owner)` is `None` inside these hooks. Use
    /// [`ComponentContext::sibling`] to reach the owner's other components.
    pub fn dispatch<F>(&mut self, owner: Entity, mut hook: F) -> bool
    where
        F: FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    {
        let mut detached = match self.world.get_mut(owner) {
            Some(record) if !record.is_destroyed() => std::mem::take(&mut record.components),
            _ => return false,
        };

        let mut pending = Vec::new();
        {
            let slots = detached.slots_mut();
            for index in 0..slots.len() {
                let (head, rest) = slots.split_at_mut(index);
                let Some((current, tail)) = rest.split_first_mut() else {
                    break;
                };
                let mut ctx = ComponentContext {
                    owner,
                    world: &mut *self.world,
                    renderer: &mut *self.renderer,
                    events: self.events,
                    config: self.config,
                    siblings: [&*head, &*tail],
                    pending: &mut pending,
                };
                hook(current.component.as_mut(), &mut ctx);
            }
        }

        if let Some(record) = self.world.get_mut(owner) {
            debug_assert!(record.components.is_empty(), "components attached during dispatch");
            record.components = detached;
        }
        self.install(pending);
        true
    }

    /// Attach queued components, including any they queue in turn
    ///
    /// Returns whether the first queued component was attached.
    fn install(&mut self, pending: Vec<PendingComponent>) -> bool {
        let mut queue: VecDeque<PendingComponent> = pending.into();
        let mut first = None;
        while let Some(next) = queue.pop_front() {
            let installed = self.install_one(next, &mut queue);
            first.get_or_insert(installed);
        }
        first.unwrap_or(false)
    }

    fn install_one(
        &mut self,
        pending: PendingComponent,
        queue: &mut VecDeque<PendingComponent>,
    ) -> bool {
        let PendingComponent {
            owner,
            kind,
            mut component,
        } = pending;

        let previous = match self.world.get_mut(owner) {
            Some(record) if !record.is_destroyed() => record.components.remove(kind),
            Some(_) => {
                log::debug!("not attaching {:?} to destroyed {}", kind, owner);
                return false;
            }
            None => {
                log::debug!("not attaching {:?} to missing {}", kind, owner);
                return false;
            }
        };
        let slot = previous.as_ref().map(|(index, _)| *index);

        let mut queued = Vec::new();
        {
            let mut ctx = ComponentContext::detached(
                owner,
                self.world,
                self.renderer,
                self.events,
                self.config,
                &mut queued,
            );
            if let Some((_, mut old)) = previous {
                old.on_remove(&mut ctx);
            }
            component.attach(&mut ctx);
        }

        if let Some(record) = self.world.get_mut(owner) {
            record.components.insert_at(slot, kind, component);
        }
        queue.extend(queued);
        true
    }
}

/// Services available to a component hook
///
/// The owner's components are detached while its hooks run, so looking them
/// up through [`ComponentContext::world`] finds nothing. Go through
/// [`ComponentContext::sibling`] instead.
pub struct ComponentContext<'a> {
    owner: Entity,
    world: &'a mut World,
    renderer: &'a mut RenderScheduler,
    events: &'a EventBus,
    config: &'a RuntimeConfig,
    /// Components of the owner detached for the current pass
    siblings: [&'a [ComponentSlot]; 2],
    pending: &'a mut Vec<PendingComponent>,
}

impl<'a> ComponentContext<'a> {
    fn detached(
        owner: Entity,
        world: &'a mut World,
        renderer: &'a mut RenderScheduler,
        events: &'a EventBus,
        config: &'a RuntimeConfig,
        pending: &'a mut Vec<PendingComponent>,
    ) -> Self {
        ComponentContext {
            owner,
            world,
            renderer,
            events,
            config,
            siblings: [&[], &[]],
            pending,
        }
    }

    /// Entity the component belongs to
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// The owner's record
    pub fn owner_record(&self) -> Option<&EntityRecord> {
        self.world.get(self.owner)
    }

    /// The owner's record, mutably
    pub fn owner_record_mut(&mut self) -> Option<&mut EntityRecord> {
        self.world.get_mut(self.owner)
    }

    /// Change the owner's collision classification
    pub fn set_collision_type(&mut self, collision: CollisionType) {
        if let Some(record) = self.world.get_mut(self.owner) {
            record.set_collision_type(collision);
        }
    }

    /// The entity arena
    pub fn world(&self) -> &World {
        self.world
    }

    /// Mutable entity arena
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// The render scheduler
    pub fn renderer(&self) -> &RenderScheduler {
        self.renderer
    }

    /// Mutable render scheduler
    pub fn renderer_mut(&mut self) -> &mut RenderScheduler {
        self.renderer
    }

    /// The event bus
    pub fn events(&self) -> &EventBus {
        self.events
    }

    /// Publish an event on the bus
    pub fn publish(&self, event: EngineEvent) -> usize {
        self.events.publish(event)
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        self.config
    }

    /// Another component of the owner, including ones detached for the
    /// current pass
    pub fn sibling<T: Component>(&self) -> Option<&T> {
        let kind = ComponentKind::of::<T>();
        for slots in self.siblings {
            if let Some(slot) = slots.iter().find(|s| s.kind == kind) {
                return slot.component.as_any().downcast_ref::<T>();
            }
        }
        self.world.get(self.owner)?.component::<T>()
    }

    /// Queue a component for the owner
    pub fn add_component<T: Component>(&mut self, component: T) {
        let owner = self.owner;
        self.add_component_to(owner, component);
    }

    /// Queue a component for any entity
    pub fn add_component_to<T: Component>(&mut self, entity: Entity, component: T) {
        self.pending.push(PendingComponent::new(entity, component));
    }

    /// Create an entity from a property bag and register it for drawing
    pub fn spawn(&mut self, props: &Properties) -> Entity {
        spawn_entity(self.world, self.renderer, self.config, props)
    }

    /// Add a prepared record and register it for drawing
    pub fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        spawn_record(self.world, self.renderer, record)
    }

    /// Flag an entity as destroyed and stop drawing everything it owns
    pub fn destroy(&mut self, entity: Entity) -> bool {
        destroy_entity(self.world, self.renderer, entity)
    }

    /// Destroy the owner
    pub fn destroy_owner(&mut self) -> bool {
        let owner = self.owner;
        self.destroy(owner)
    }

    /// Move an entity to another render layer
    pub fn set_render_layer(&mut self, entity: Entity, layer: LayerId) -> bool {
        set_render_layer(self.world, self.renderer, entity, layer)
    }
}

pub(crate) fn spawn_entity(
    world: &mut World,
    renderer: &mut RenderScheduler,
    config: &RuntimeConfig,
    props: &Properties,
) -> Entity {
    let width = props.get_u32("width", config.default_size);
    let height = props.get_u32("height", config.default_size);
    let layer = match props.get_opt_str("renderLayer") {
        Some(name) => renderer.resolve_layer(name),
        None => layers::FALLBACK,
    };
    let collision = match props.get("collisionType") {
        None | Some(Value::Null) => CollisionType::default(),
        Some(Value::String(name)) => name.parse().unwrap_or_else(|err: String| {
            log::warn!("{}; using {}", err, CollisionType::default());
            CollisionType::default()
        }),
        Some(other) => {
            log::warn!(
                "collisionType should be a string but was {}; using {}",
                other,
                CollisionType::default()
            );
            CollisionType::default()
        }
    };

    let mut record = EntityRecord::new(
        props.get_str("name", ""),
        props.get_f64("x", 0.0),
        props.get_f64("y", 0.0),
        width,
        height,
    )
    .with_layer(layer)
    .with_collision(collision)
    .with_protection(props.get_bool("protectedFromCleanup", false));

    if props.contains("maskWidth") || props.contains("maskHeight") {
        record.set_mask(HitMask::new(
            props.get_i32("maskX", 0),
            props.get_i32("maskY", 0),
            props.get_u32("maskWidth", width),
            props.get_u32("maskHeight", height),
        ));
    }
    if props.contains("sprite") {
        record.set_sprite(Some(SpriteId(props.get_u32("sprite", 0))));
    }

    spawn_record(world, renderer, record)
}

pub(crate) fn spawn_record(
    world: &mut World,
    renderer: &mut RenderScheduler,
    record: EntityRecord,
) -> Entity {
    let layer = record.render_layer();
    let destroyed = record.is_destroyed();
    let entity = world.spawn(record);
    if !destroyed {
        let used = renderer.register(DrawableKey::Entity(entity), layer);
        if used != layer {
            if let Some(record) = world.get_mut(entity) {
                record.layer = used;
            }
        }
    }
    entity
}

pub(crate) fn destroy_entity(
    world: &mut World,
    renderer: &mut RenderScheduler,
    entity: Entity,
) -> bool {
    if !world.destroy(entity) {
        return false;
    }
    renderer.unregister_owner(entity);
    log::debug!("destroyed {}", entity);
    true
}

pub(crate) fn set_render_layer(
    world: &mut World,
    renderer: &mut RenderScheduler,
    entity: Entity,
    layer: LayerId,
) -> bool {
    let Some(record) = world.get_mut(entity) else {
        return false;
    };
    if record.is_destroyed() {
        record.layer = layer;
        return true;
    }
    let used = renderer.register(DrawableKey::Entity(entity), layer);
    record.layer = used;
    true
}
