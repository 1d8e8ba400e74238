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
//! Collision predicate and collision pass tests

use entity_runtime::collision::{colliding_pairs, is_colliding, CollisionType};
use entity_runtime::ecs::{Component, ComponentContext, EntityRecord};
use entity_runtime::geometry::HitMask;
use entity_runtime::properties::Properties;
use entity_runtime::{Entity, Scene, World};
use rstest::rstest;
use std::any::Any;

fn record(x: f64, y: f64, collision: CollisionType) -> EntityRecord {
    EntityRecord::new("box", x, y, 16, 16).with_collision(collision)
}

#[rstest]
#[case(20.0, 10.0, true)]
#[case(25.0, 10.0, true)]
#[case(26.0, 10.0, false)]
#[case(10.0, 26.0, false)]
#[case(-5.0, -5.0, true)]
#[case(-6.0, 10.0, false)]
fn test_sixteen_pixel_boxes(#[case] x: f64, #[case] y: f64, #[case] expected: bool) {
    let e = record(10.0, 10.0, CollisionType::Solid);
    let f = record(x, y, CollisionType::Trigger);
    assert_eq!(is_colliding(&e, &f), expected);
    assert_eq!(is_colliding(&f, &e), expected);
}

#[rstest]
fn test_no_collision_never_collides(
    #[values(
        CollisionType::NoCollision,
        CollisionType::Solid,
        CollisionType::Trigger,
        CollisionType::CharacterSolid,
        CollisionType::CharacterTrigger,
        CollisionType::DamageSource
    )]
    other: CollisionType,
) {
    let ghost = record(0.0, 0.0, CollisionType::NoCollision);
    let target = record(0.0, 0.0, other);
    assert!(!is_colliding(&ghost, &target));
    assert!(!is_colliding(&target, &ghost));
}

#[test]
fn test_mask_replaces_visual_bounds() {
    // A 32x32 sprite whose feet are the only solid part
    let tree = EntityRecord::new("tree", 0.0, 0.0, 32, 32)
        .with_collision(CollisionType::Solid)
        .with_mask(HitMask::new(8, 24, 16, 8));
    let above = record(8.0, 0.0, CollisionType::CharacterSolid);
    let at_feet = record(8.0, 20.0, CollisionType::CharacterSolid);

    assert!(!is_colliding(&tree, &above));
    assert!(is_colliding(&tree, &at_feet));
}

#[test]
fn test_empty_mask_never_collides() {
    let flat = record(0.0, 0.0, CollisionType::Solid).with_mask(HitMask::new(0, 0, 0, 16));
    let other = record(0.0, 0.0, CollisionType::Solid);
    assert!(!is_colliding(&flat, &other));
}

#[test]
fn test_fractional_positions_are_truncated() {
    let e = record(10.9, 10.0, CollisionType::Solid);
    let f = record(26.5, 10.0, CollisionType::Solid);
    assert!(!is_colliding(&e, &f));
}

#[test]
fn test_pairs_skip_destroyed_entities() {
    let mut world = World::new();
    let a = world.spawn(record(0.0, 0.0, CollisionType::Solid));
    let b = world.spawn(record(4.0, 0.0, CollisionType::Solid));
    let c = world.spawn(record(8.0, 0.0, CollisionType::Trigger));

    assert_eq!(colliding_pairs(&world), vec![(a, b), (a, c), (b, c)]);
    world.destroy(b);
    assert_eq!(colliding_pairs(&world), vec![(a, c)]);
    assert!(!world.is_colliding(a, b));
}

#[derive(Default)]
struct Contacts {
    seen: Vec<Entity>,
}

impl Component for Contacts {
    fn on_collision(&mut self, _ctx: &mut ComponentContext<'_>, other: Entity) {
        self.seen.push(other);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Destroys itself on first contact
struct Fragile;

impl Component for Fragile {
    fn on_collision(&mut self, ctx: &mut ComponentContext<'_>, _other: Entity) {
        ctx.destroy_owner();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_collision_pass_notifies_both_sides() {
    let mut scene = Scene::default();
    let wall = scene.spawn(&Properties::new().with("collisionType", "SOLID"));
    let hero = scene.spawn(&Properties::new().with("x", 8).with("collisionType", "CHARACTER_SOLID"));
    scene.spawn(&Properties::new().with("x", 100));
    scene.add_component(wall, Contacts::default());
    scene.add_component(hero, Contacts::default());

    scene.tick();
    assert_eq!(scene.component::<Contacts>(wall).unwrap().seen, vec![hero]);
    assert_eq!(scene.component::<Contacts>(hero).unwrap().seen, vec![wall]);
}

#[test]
fn test_destroyed_entity_leaves_later_pairs() {
    let mut scene = Scene::default();
    let glass = scene.spawn(&Properties::new().with("name", "glass"));
    let a = scene.spawn(&Properties::new().with("x", 4));
    let b = scene.spawn(&Properties::new().with("x", 8));
    scene.add_component(glass, Fragile);
    scene.add_component(a, Contacts::default());
    scene.add_component(b, Contacts::default());

    scene.tick();
    // glass breaks on its first pair, so only a and b still meet each other
    assert_eq!(scene.component::<Contacts>(a).unwrap().seen, vec![b]);
    assert_eq!(scene.component::<Contacts>(b).unwrap().seen, vec![a]);
    assert!(!scene.world().contains(glass));
}
