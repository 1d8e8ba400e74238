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
//! Headless dungeon walk-through
//!
//! Loads a small level, walks the player past a guard, a chest, a coin
//! and a portal, and prints what the runtime reports along the way. Each
//! frame is rendered into a command buffer instead of a window.
//!
//! Run with `ENTITY_RUNTIME_LOG_VERBOSE=1` to see lifecycle logging.

use entity_runtime::archetypes::{ChestArchetype, ChestHooks};
use entity_runtime::config::RuntimeConfig;
use entity_runtime::ecs::components::{InteractionPrompt, ShadowComponent};
use entity_runtime::ecs::scheduler::stages;
use entity_runtime::ecs::{ComponentContext, SystemContext};
use entity_runtime::events::{EngineEvent, EventKind};
use entity_runtime::interaction::{InteractionComponent, ZoneKind, ZoneShape};
use entity_runtime::logging;
use entity_runtime::render::CommandBuffer;
use entity_runtime::{Entity, Scene};
use serde_json::json;

struct Narrator;

impl ChestHooks for Narrator {
    fn give_loot(&mut self, _ctx: &mut ComponentContext<'_>, looter: Entity, loot_table: &str) {
        println!("  {} rolls on loot table '{}'", looter, loot_table);
    }

    fn on_already_looted(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity) {
        println!("  the chest is empty");
    }
}

fn main() {
    let config = RuntimeConfig::from_env();
    logging::init(config.verbose_logging);

    println!("Entity Runtime - Dungeon Walk-through");
    println!("=====================================\n");

    let mut scene = Scene::new(config);
    if let Err(err) = scene
        .archetypes_mut()
        .replace(Box::new(ChestArchetype::with_hooks(|| Narrator)))
    {
        eprintln!("could not install chest hooks: {}", err);
        return;
    }

    scene.events().subscribe_to_all(|event, _| match event {
        EngineEvent::WorldLoaded { entities } => {
            println!("[event] level loaded with {} entities", entities.len())
        }
        EngineEvent::TargetEnteredZone(zone) => {
            println!("[event] {} entered {} zone of {}", zone.target, zone.kind, zone.owner)
        }
        EngineEvent::TargetExitedZone(zone) => {
            println!("[event] {} left {} zone of {}", zone.target, zone.kind, zone.owner)
        }
        EngineEvent::InteractionTriggered { source, target } => {
            println!("[event] {} interacted with {}", source, target)
        }
        EngineEvent::CharacterSpoke { speaker, message, .. } => {
            println!("[event] {} says \"{}\"", speaker, message)
        }
        EngineEvent::Custom { name, payload, .. } => {
            println!("[event] {} {}", name, payload)
        }
    });

    let entities = scene.load_level(&[
        json!({"name": "player", "x": 0, "y": 40, "sprite": 1,
               "renderLayer": "CHARACTERS", "collisionType": "CHARACTER_SOLID"}),
        json!({"name": "guard", "x": 120, "y": 0, "sprite": 2, "renderLayer": "CHARACTERS"}),
        json!({"type": "chest", "name": "chest", "x": 200, "y": 60, "sprite": 3,
               "lootTable": "dungeon_common"}),
        json!({"type": "pickup", "name": "coin", "x": 260, "y": 40, "sprite": 4,
               "itemId": "coin", "autoPickup": true}),
        json!({"type": "portal", "name": "exit", "x": 320, "y": 40, "sprite": 5,
               "autoTeleport": true, "destinationX": 0, "destinationY": 200}),
        json!({"type": "bookshelf", "name": "shelf", "x": 40, "y": 0, "sprite": 6}),
    ]);
    let (player, guard, chest) = (entities[0], entities[1], entities[2]);

    scene.add_component(player, ShadowComponent::oval(12, 4, 0.4, 14));
    scene.add_component(
        guard,
        InteractionComponent::new()
            .with_zone(ZoneKind::Aggro, ZoneShape::circle(60.0))
            .tracking(player),
    );
    scene.add_component(chest, InteractionPrompt::new("Open"));

    let guard_listener = scene.events().subscribe(EventKind::TargetEnteredZone, move |event, bus| {
        if let Some(zone) = event.zone_event() {
            if zone.owner == guard && zone.kind == ZoneKind::Aggro {
                bus.publish(EngineEvent::CharacterSpoke {
                    speaker: guard,
                    message: "Halt!".to_string(),
                    duration_secs: 1.5,
                });
            }
        }
    });

    // Walk right four pixels a frame until the portal sends the player away
    scene.add_system(
        move |ctx: &mut SystemContext<'_>| {
            let walking = ctx.world().get(player).map_or(false, |p| p.y() < 100.0);
            if walking {
                ctx.world_mut().translate(player, 4.0, 0.0);
            }
        },
        stages::PRE_UPDATE,
    );

    let mut frame = CommandBuffer::new();
    for tick in 0..100 {
        scene.tick();

        if tick == 50 {
            scene.interact(chest, player);
            scene.interact(chest, player);
        }

        frame.clear();
        let drawn = scene.render_frame(&mut frame);
        if tick % 25 == 0 {
            let position = scene.world().get(player).map(|p| p.position());
            println!(
                "frame {:3}: {} producers, {} draw calls, player at {:?}",
                tick,
                drawn,
                frame.len(),
                position
            );
        }
    }
    scene.events().unsubscribe(guard_listener);

    println!("\nSaved state:");
    match serde_json::to_string_pretty(&scene.save_states()) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("could not format save: {}", err),
    }
}
