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
//! Frame lifecycle tests: update order, attachment, destruction and events

use entity_runtime::ecs::scheduler::stages;
use entity_runtime::ecs::{Component, ComponentContext, SystemContext};
use entity_runtime::events::{EngineEvent, EventKind};
use entity_runtime::interaction::{InteractionComponent, ZoneKind, ZoneShape};
use entity_runtime::properties::Properties;
use entity_runtime::{Entity, Scene};
use serde_json::json;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

/// Walks a fixed step every update
struct Walker {
    dx: f64,
    dy: f64,
}

impl Component for Walker {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        let owner = ctx.owner();
        ctx.world_mut().translate(owner, self.dx, self.dy);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Writes its tag to a shared journal on every hook
struct Tracer {
    tag: String,
    journal: Journal,
}

impl Tracer {
    fn new(tag: &str, journal: &Journal) -> Self {
        Tracer {
            tag: tag.to_string(),
            journal: Rc::clone(journal),
        }
    }
}

impl Component for Tracer {
    fn attach(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.journal.borrow_mut().push(format!("attach {}", self.tag));
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.journal.borrow_mut().push(format!("update {}", self.tag));
    }

    fn on_remove(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.journal.borrow_mut().push(format!("remove {}", self.tag));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Destroys a victim on its first update
struct Assassin {
    victim: Entity,
}

impl Component for Assassin {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.destroy(self.victim);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_child_follows_parent_in_same_tick() {
    let mut scene = Scene::default();
    let cart = scene.spawn(&Properties::new().with("x", 100).with("y", 50));
    let lamp = scene.spawn(&Properties::new().with("name", "lamp"));
    assert!(scene.attach(cart, lamp, 4.0, -12.0));
    assert_eq!(scene.world().get(lamp).unwrap().position().x, 104.0);

    scene.add_component(cart, Walker { dx: 3.0, dy: 2.0 });
    scene.tick();

    let cart_record = scene.world().get(cart).unwrap();
    let lamp_record = scene.world().get(lamp).unwrap();
    assert_eq!((cart_record.x(), cart_record.y()), (103.0, 52.0));
    assert_eq!((lamp_record.x(), lamp_record.y()), (107.0, 40.0));
}

#[test]
fn test_detached_child_stays_put() {
    let mut scene = Scene::default();
    let cart = scene.spawn(&Properties::new());
    let lamp = scene.spawn(&Properties::new());
    scene.attach(cart, lamp, 4.0, 0.0);
    scene.add_component(cart, Walker { dx: 10.0, dy: 0.0 });

    scene.tick();
    assert!(scene.detach(lamp));
    scene.tick();
    assert_eq!(scene.world().get(lamp).unwrap().x(), 14.0);
    assert_eq!(scene.world().get(cart).unwrap().x(), 20.0);
}

#[test]
fn test_components_update_in_insertion_order() {
    let journal = Journal::default();
    let mut scene = Scene::default();
    let first = scene.spawn(&Properties::new());
    let second = scene.spawn(&Properties::new());
    scene.add_component(second, Tracer::new("b", &journal));
    scene.add_component(first, Tracer::new("a", &journal));
    journal.borrow_mut().clear();

    scene.tick();
    assert_eq!(*journal.borrow(), vec!["update a", "update b"]);
}

#[test]
fn test_replacing_component_removes_old_first() {
    let journal = Journal::default();
    let mut scene = Scene::default();
    let e = scene.spawn(&Properties::new());
    scene.add_component(e, Tracer::new("old", &journal));
    scene.add_component(e, Tracer::new("new", &journal));
    assert!(scene.remove_component::<Tracer>(e));
    assert!(!scene.remove_component::<Tracer>(e));

    assert_eq!(
        *journal.borrow(),
        vec!["attach old", "remove old", "attach new", "remove new"]
    );
}

#[test]
fn test_destroyed_mid_tick_skips_later_passes() {
    let journal = Journal::default();
    let mut scene = Scene::default();
    let victim_first = scene.spawn(&Properties::new());
    let assassin = scene.spawn(&Properties::new());
    let victim_later = scene.spawn(&Properties::new().with("x", 100));
    scene.add_component(victim_first, Tracer::new("early", &journal));
    scene.add_component(victim_later, Tracer::new("late", &journal));
    scene.add_component(assassin, Assassin { victim: victim_later });
    journal.borrow_mut().clear();

    scene.tick();
    // the earlier entity already updated; the later one never does
    assert_eq!(*journal.borrow(), vec!["update early"]);
    assert!(!scene.world().contains(victim_later));
    assert!(scene.world().is_alive(victim_first));
}

#[test]
fn test_protected_entity_survives_cleanup() {
    let mut scene = Scene::default();
    let keep = scene.spawn(&Properties::new().with("protectedFromCleanup", true));
    scene.destroy(keep);
    scene.tick();
    assert!(scene.world().contains(keep));
    assert!(!scene.world().is_alive(keep));
}

#[test]
fn test_stale_handle_is_neutral() {
    let mut scene = Scene::default();
    let old = scene.spawn(&Properties::new());
    scene.destroy(old);
    scene.tick();
    let reused = scene.spawn(&Properties::new());

    assert_eq!(old.index(), reused.index());
    assert!(scene.world().get(old).is_none());
    assert!(!scene.set_position(old, 1.0, 1.0));
    assert!(!scene.add_component(old, Walker { dx: 1.0, dy: 0.0 }));
    assert!(!scene.destroy(old));
}

#[test]
fn test_handles_from_before_reset_stay_stale() {
    let mut scene = Scene::default();
    let old = scene.spawn(&Properties::new().with("name", "before"));
    scene.reset();
    let new = scene.spawn(&Properties::new().with("name", "after"));

    assert_ne!(old, new);
    assert!(scene.world().get(old).is_none());
    assert!(!scene.set_position(old, 5.0, 5.0));
    assert_eq!(scene.world().get(new).map(|r| r.name()), Some("after"));
}

#[test]
fn test_zone_event_drives_reaction_through_bus() {
    let mut scene = Scene::default();
    let goblin = scene.spawn(&Properties::new().with("name", "goblin"));
    let player = scene.spawn(&Properties::new().with("name", "player").with("x", 200));
    scene.add_component(
        goblin,
        InteractionComponent::new()
            .with_zone(ZoneKind::Aggro, ZoneShape::circle(60.0))
            .tracking_named("player"),
    );

    let chasing = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&chasing);
    scene
        .events()
        .subscribe(EventKind::TargetEnteredZone, move |event, bus| {
            let zone = event.zone_event().unwrap();
            sink.borrow_mut().push(zone.owner);
            bus.publish(EngineEvent::CharacterSpoke {
                speaker: zone.owner,
                message: "Intruder!".to_string(),
                duration_secs: 2.0,
            });
        });
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    scene.events().subscribe(EventKind::CharacterSpoke, move |event, _| {
        if let EngineEvent::CharacterSpoke { message, .. } = event {
            sink.borrow_mut().push(message.clone());
        }
    });

    scene.tick();
    scene.set_position(player, 30.0, 0.0);
    scene.tick();
    assert_eq!(*chasing.borrow(), vec![goblin]);
    assert_eq!(*lines.borrow(), vec!["Intruder!".to_string()]);
}

#[test]
fn test_world_loaded_fires_once_per_load() {
    let mut scene = Scene::default();
    let loads = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&loads);
    scene.events().subscribe(EventKind::WorldLoaded, move |_, _| {
        *counter.borrow_mut() += 1;
    });

    scene.load_level(&[json!({"name": "a"}), json!({"name": "b"})]);
    scene.tick();
    assert_eq!(*loads.borrow(), 1);
    scene.load_level(&[]);
    assert_eq!(*loads.borrow(), 2);
}

#[test]
fn test_system_spawns_are_updated_same_tick() {
    let journal = Journal::default();
    let mut scene = Scene::default();
    let spawned = Rc::new(RefCell::new(false));
    let log = Rc::clone(&journal);
    scene.add_system(
        move |ctx: &mut SystemContext<'_>| {
            if !*spawned.borrow() {
                *spawned.borrow_mut() = true;
                let e = ctx.spawn(&Properties::new());
                ctx.add_component(e, Tracer::new("fresh", &log));
            }
        },
        stages::PRE_UPDATE,
    );

    scene.tick();
    assert_eq!(*journal.borrow(), vec!["attach fresh", "update fresh"]);
}
