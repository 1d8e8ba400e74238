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
//! The scene: one level's worth of runtime state
//!
//! A [`Scene`] owns the world, the render scheduler, the event bus and the
//! staged systems, and drives them in a fixed frame shape:
//!
//! 1. [`Scene::tick`] runs every system in stage order. The built-in stages
//!    update every live entity, notify colliding pairs, then sweep
//!    destroyed entities.
//! 2. [`Scene::render_frame`] draws every visible producer once.
//!
//! # Example
//!
//! ```rust
//! use entity_runtime::config::RuntimeConfig;
//! use entity_runtime::properties::Properties;
//! use entity_runtime::render::CommandBuffer;
//! use entity_runtime::scene::Scene;
//!
//! let mut scene = Scene::new(RuntimeConfig::default());
//! let player = scene.spawn(&Properties::new().with("name", "player").with("sprite", 1));
//! scene.tick();
//!
//! let mut frame = CommandBuffer::new();
//! assert_eq!(scene.render_frame(&mut frame), 1);
//! assert!(scene.world().is_alive(player));
//! ```

use crate::archetypes::ArchetypeRegistry;
use crate::config::RuntimeConfig;
use crate::ecs::scheduler::{stages, Scheduler, StageId};
use crate::ecs::systems::{CleanupSystem, CollisionSystem, EntityUpdateSystem};
use crate::ecs::{Component, Entity, EntityRecord, System, SystemContext, World};
use crate::error::{RegistryError, StateError};
use crate::events::{EngineEvent, EventBus};
use crate::persistence;
use crate::properties::Properties;
use crate::render::{LayerId, RenderScheduler, Surface};
use serde_json::Value;

/// World, services and systems of one running level
pub struct Scene {
    world: World,
    renderer: RenderScheduler,
    events: EventBus,
    config: RuntimeConfig,
    systems: Scheduler,
    archetypes: ArchetypeRegistry,
    ticks: u64,
}

impl Scene {
    /// Create an empty scene with the built-in systems and archetypes
    pub fn new(config: RuntimeConfig) -> Self {
        let mut renderer = RenderScheduler::new();
        renderer.set_debug_masks(config.debug_masks);

        let mut systems = Scheduler::new();
        systems.add_system(EntityUpdateSystem, stages::ENTITY_UPDATE);
        systems.add_system(CollisionSystem, stages::COLLISION);
        systems.add_system(CleanupSystem, stages::CLEANUP);

        Scene {
            world: World::new(),
            renderer,
            events: EventBus::new(),
            config,
            systems,
            archetypes: ArchetypeRegistry::with_standard(),
            ticks: 0,
        }
    }

    /// Entity storage
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable entity storage
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Render scheduler
    pub fn renderer(&self) -> &RenderScheduler {
        &self.renderer
    }

    /// Mutable render scheduler, for registering layers and overlays
    pub fn renderer_mut(&mut self) -> &mut RenderScheduler {
        &mut self.renderer
    }

    /// Event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Archetypes used by [`Scene::spawn_archetype`] and [`Scene::load_level`]
    pub fn archetypes(&self) -> &ArchetypeRegistry {
        &self.archetypes
    }

    /// Mutable archetype registry, for registering game archetypes
    pub fn archetypes_mut(&mut self) -> &mut ArchetypeRegistry {
        &mut self.archetypes
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Borrow the world and services as a system would see them
    pub fn context(&mut self) -> SystemContext<'_> {
        SystemContext::new(&mut self.world, &mut self.renderer, &self.events, &self.config)
    }

    /// Spawn an entity from a property bag
    pub fn spawn(&mut self, props: &Properties) -> Entity {
        self.context().spawn(props)
    }

    /// Spawn a prepared record
    pub fn spawn_record(&mut self, record: EntityRecord) -> Entity {
        self.context().spawn_record(record)
    }

    /// Spawn an entity and build it as `type_name`
    ///
    /// The entity is destroyed again when the archetype rejects the
    /// properties.
    pub fn spawn_archetype(
        &mut self,
        type_name: &str,
        props: &Properties,
    ) -> Result<Entity, RegistryError> {
        if !self.archetypes.contains(type_name) {
            return Err(RegistryError::UnknownArchetype(type_name.to_string()));
        }
        let mut ctx =
            SystemContext::new(&mut self.world, &mut self.renderer, &self.events, &self.config);
        let entity = ctx.spawn(props);
        if let Err(err) = self.archetypes.build(&mut ctx, entity, type_name, props) {
            ctx.destroy(entity);
            return Err(err);
        }
        log::debug!("spawned {} as {}", entity, type_name);
        Ok(entity)
    }

    /// Spawn every object of a level, then publish `WorldLoaded` once
    ///
    /// Objects whose `type` names a registered archetype are built by it.
    /// Objects of unknown type become plain entities. Objects an archetype
    /// rejects are skipped. Returns the spawned entities in order.
    pub fn load_level(&mut self, objects: &[Value]) -> Vec<Entity> {
        let mut spawned = Vec::with_capacity(objects.len());
        for object in objects {
            let props = Properties::from_value(object.clone());
            let entity = match props.object_type() {
                Some(type_name) if self.archetypes.contains(type_name) => {
                    match self.spawn_archetype(type_name, &props) {
                        Ok(entity) => entity,
                        Err(err) => {
                            log::warn!("skipping level object: {}", err);
                            continue;
                        }
                    }
                }
                Some(type_name) => {
                    log::warn!("unknown object type '{}'; spawning a plain entity", type_name);
                    self.spawn(&props)
                }
                None => self.spawn(&props),
            };
            spawned.push(entity);
        }
        log::info!("level loaded with {} entities", spawned.len());
        self.events.publish(EngineEvent::WorldLoaded {
            entities: spawned.clone(),
        });
        spawned
    }

    /// Flag an entity as destroyed and stop drawing it
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.context().destroy(entity)
    }

    /// Attach a component, replacing any component of the same type
    pub fn add_component<T: Component>(&mut self, owner: Entity, component: T) -> bool {
        self.context().add_component(owner, component)
    }

    /// Detach a component, running its `on_remove` hook
    pub fn remove_component<T: Component>(&mut self, owner: Entity) -> bool {
        self.context().remove_component::<T>(owner)
    }

    /// Typed component access
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.world.component::<T>(entity)
    }

    /// Typed mutable component access
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.world.component_mut::<T>(entity)
    }

    /// Check whether an entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.has_component::<T>(entity)
    }

    /// Move an entity and its attached children
    pub fn set_position(&mut self, entity: Entity, x: f64, y: f64) -> bool {
        self.world.set_position(entity, x, y)
    }

    /// Move an entity to another render layer
    pub fn set_render_layer(&mut self, entity: Entity, layer: LayerId) -> bool {
        self.context().set_render_layer(entity, layer)
    }

    /// Attach `child` to `parent` at an offset
    pub fn attach(&mut self, parent: Entity, child: Entity, offset_x: f64, offset_y: f64) -> bool {
        self.world.attach(parent, child, offset_x, offset_y)
    }

    /// Break `child` away from its parent
    pub fn detach(&mut self, child: Entity) -> bool {
        self.world.detach(child)
    }

    /// `source` interacts with `target`
    ///
    /// Runs `on_interact` on the target's components, then publishes
    /// `InteractionTriggered`. Nothing happens when the target is not live.
    pub fn interact(&mut self, target: Entity, source: Entity) -> bool {
        let reached = self
            .context()
            .dispatch(target, |component, ctx| component.on_interact(ctx, source));
        if reached {
            self.events
                .publish(EngineEvent::InteractionTriggered { source, target });
        }
        reached
    }

    /// Schedule a game system
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        self.systems.add_system(system, stage);
    }

    /// Advance the scene by one frame
    pub fn tick(&mut self) {
        let mut systems = std::mem::take(&mut self.systems);
        {
            let mut ctx = self.context();
            systems.run(&mut ctx);
        }
        self.systems = systems;
        self.ticks += 1;
        log::trace!("tick {} done", self.ticks);
    }

    /// Draw the current frame; returns the number of producers drawn
    pub fn render_frame(&self, surface: &mut dyn Surface) -> usize {
        self.renderer.render_frame(&self.world, surface)
    }

    /// Snapshot the persistent state of every named entity
    pub fn save_states(&self) -> Value {
        persistence::save_world(&self.world)
    }

    /// Restore a snapshot taken by [`Scene::save_states`]
    pub fn load_states(&mut self, state: &Value) -> Result<usize, StateError> {
        persistence::load_world(&mut self.context(), state)
    }

    /// Drop every entity, registration and subscription
    ///
    /// Systems, archetypes and configured render layers are kept.
    pub fn reset(&mut self) {
        self.world.clear();
        self.renderer.reset();
        self.events.reset();
        self.ticks = 0;
        log::debug!("scene reset");
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::{DoorComponent, FnArchetype};
    use crate::collision::CollisionType;
    use crate::ecs::ComponentContext;
    use crate::events::EventKind;
    use crate::render::CommandBuffer;
    use serde_json::json;
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Ticker {
        updates: u32,
        touched_by: Vec<Entity>,
    }

    impl Component for Ticker {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.updates += 1;
        }

        fn on_interact(&mut self, _ctx: &mut ComponentContext<'_>, source: Entity) {
            self.touched_by.push(source);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_tick_updates_and_cleans_up() {
        let mut scene = Scene::default();
        let a = scene.spawn(&Properties::new().with("name", "a"));
        let b = scene.spawn(&Properties::new().with("name", "b"));
        scene.add_component(a, Ticker::default());

        scene.tick();
        scene.tick();
        assert_eq!(scene.component::<Ticker>(a).unwrap().updates, 2);
        assert_eq!(scene.tick_count(), 2);

        scene.destroy(b);
        scene.tick();
        assert!(!scene.world().contains(b));
        assert_eq!(scene.world().entity_count(), 1);
    }

    #[test]
    fn test_custom_system_runs_in_stage_order() {
        let mut scene = Scene::default();
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&order);
        scene.add_system(
            move |ctx: &mut SystemContext<'_>| log.borrow_mut().push(ctx.world().alive_count()),
            stages::POST_UPDATE,
        );
        let log = Rc::clone(&order);
        scene.add_system(
            move |ctx: &mut SystemContext<'_>| {
                ctx.spawn(&Properties::new().with("name", "spawned"));
                log.borrow_mut().push(0);
            },
            stages::PRE_UPDATE,
        );

        scene.tick();
        assert_eq!(*order.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_interact_publishes_event() {
        let mut scene = Scene::default();
        let npc = scene.spawn(&Properties::new().with("name", "npc"));
        let player = scene.spawn(&Properties::new().with("name", "player"));
        scene.add_component(npc, Ticker::default());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scene.events().subscribe(EventKind::InteractionTriggered, move |event, _| {
            sink.borrow_mut().push(event.clone());
        });

        assert!(scene.interact(npc, player));
        assert_eq!(scene.component::<Ticker>(npc).unwrap().touched_by, vec![player]);
        assert_eq!(
            *seen.borrow(),
            vec![EngineEvent::InteractionTriggered {
                source: player,
                target: npc
            }]
        );

        scene.destroy(npc);
        assert!(!scene.interact(npc, player));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_load_level_uses_archetypes() {
        let mut scene = Scene::default();
        let loaded = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&loaded);
        scene.events().subscribe(EventKind::WorldLoaded, move |event, _| {
            if let EngineEvent::WorldLoaded { entities } = event {
                *counter.borrow_mut() += entities.len();
            }
        });

        let entities = scene.load_level(&[
            json!({"type": "door", "name": "gate", "x": 32, "y": 0}),
            json!({"type": "statue", "name": "statue"}),
            json!({"name": "player", "x": 8, "y": 8}),
        ]);

        assert_eq!(entities.len(), 3);
        assert_eq!(*loaded.borrow(), 3);
        assert!(scene.has_component::<DoorComponent>(entities[0]));
        assert_eq!(
            scene.world().get(entities[0]).unwrap().collision_type(),
            CollisionType::Solid
        );
        assert_eq!(scene.world().get(entities[1]).unwrap().name(), "statue");
    }

    #[test]
    fn test_rejected_archetype_is_skipped() {
        let mut scene = Scene::default();
        scene
            .archetypes_mut()
            .register(Box::new(FnArchetype::new("fragile", |_ctx, _entity, _props| {
                Err("always breaks".to_string())
            })))
            .unwrap();

        let err = scene.spawn_archetype("fragile", &Properties::new()).unwrap_err();
        assert!(matches!(err, RegistryError::BuildFailed { .. }));
        assert_eq!(scene.world().alive_count(), 0);
        assert!(matches!(
            scene.spawn_archetype("ghost", &Properties::new()),
            Err(RegistryError::UnknownArchetype(_))
        ));
        assert!(scene.load_level(&[json!({"type": "fragile"})]).is_empty());
    }

    #[test]
    fn test_render_frame_draws_visible_entities() {
        let mut scene = Scene::default();
        scene.spawn(&Properties::new().with("sprite", 3));
        let hidden = scene.spawn(&Properties::new().with("sprite", 4));
        scene.world_mut().get_mut(hidden).unwrap().set_hidden(true);

        let mut frame = CommandBuffer::new();
        assert_eq!(scene.render_frame(&mut frame), 1);
        assert_eq!(frame.sprites(), vec![crate::render::SpriteId(3)]);
    }

    #[test]
    fn test_reset_clears_everything_but_systems() {
        let mut scene = Scene::default();
        let a = scene.spawn(&Properties::new().with("name", "a"));
        scene.events().subscribe_to_all(|_, _| {});
        scene.tick();

        scene.reset();
        assert!(!scene.world().contains(a));
        assert_eq!(scene.events().listener_count(), 0);
        assert_eq!(scene.renderer().registered_count(), 0);
        assert_eq!(scene.tick_count(), 0);
        assert!(scene.archetypes().contains("door"));
    }

    #[test]
    fn test_save_and_load_states() {
        let mut scene = Scene::default();
        let door = scene
            .spawn_archetype("door", &Properties::new().with("name", "gate"))
            .unwrap();
        let player = scene.spawn(&Properties::new().with("name", "player").with("x", 100));
        scene.interact(door, player);
        let saved = scene.save_states();
        assert_eq!(saved["gate"]["components"]["door"]["isOpen"], json!(true));

        let mut fresh = Scene::default();
        let door = fresh
            .spawn_archetype("door", &Properties::new().with("name", "gate"))
            .unwrap();
        assert_eq!(fresh.load_states(&saved), Ok(1));
        assert!(fresh.component::<DoorComponent>(door).unwrap().is_open());
        assert_eq!(
            fresh.world().get(door).unwrap().collision_type(),
            CollisionType::Trigger
        );
    }
}
