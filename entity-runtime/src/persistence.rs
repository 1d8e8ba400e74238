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
//! Saving and restoring scene state by entity name
//!
//! A save is a JSON object with one entry per named entity:
//!
//! ```json
//! {
//!   "chest_1": {
//!     "x": 96.0,
//!     "y": 40.0,
//!     "destroyed": false,
//!     "components": { "chest": { "isOpen": true, "hasBeenLooted": true } }
//!   }
//! }
//! ```
//!
//! Only components that report a [`Component::state_key`] are saved.
//! Loading matches entries to the first live entity of the same name, so a
//! save is restored onto a freshly loaded level rather than onto handles.
//!
//! [`Component::state_key`]: crate::ecs::Component::state_key

use crate::ecs::{Entity, SystemContext, World};
use crate::error::{json_type_name, StateError};
use serde_json::{json, Map, Value};

/// Borrow `state` as a JSON object, naming `what` in the diagnostic
pub(crate) fn state_object<'v>(
    state: &'v Value,
    what: &'static str,
) -> Result<&'v Map<String, Value>, StateError> {
    match state {
        Value::Object(map) => Ok(map),
        other => {
            log::warn!("{} state should be an object but was {}", what, json_type_name(other));
            Err(StateError::NotAnObject(json_type_name(other)))
        }
    }
}

/// Read a required boolean field
pub(crate) fn read_bool(state: &Map<String, Value>, field: &'static str) -> Result<bool, StateError> {
    match state.get(field) {
        None => Err(StateError::MissingField(field)),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(StateError::Malformed(format!(
            "'{}' should be a boolean but was {}",
            field,
            json_type_name(other)
        ))),
    }
}

/// Read a required non-negative integer field
pub(crate) fn read_u32(state: &Map<String, Value>, field: &'static str) -> Result<u32, StateError> {
    let value = state.get(field).ok_or(StateError::MissingField(field))?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            StateError::Malformed(format!(
                "'{}' should be a non-negative integer but was {}",
                field, value
            ))
        })
}

/// Snapshot every named entity of `world`
///
/// Unnamed entities are skipped. When several entities share a name the
/// first live one, in spawn order, is saved. A destroyed record is saved
/// only while no live entity carries its name.
pub fn save_world(world: &World) -> Value {
    let mut saved = Map::new();
    for (entity, record) in world.iter() {
        if record.name().is_empty() {
            continue;
        }
        let claimed_by_destroyed = saved
            .get(record.name())
            .and_then(|entry| entry["destroyed"].as_bool())
            .unwrap_or(false);
        if saved.contains_key(record.name()) && (record.is_destroyed() || !claimed_by_destroyed) {
            log::warn!(
                "{} shares the name '{}' with an earlier entity; not saved",
                entity,
                record.name()
            );
            continue;
        }

        let mut components = Map::new();
        for (_, component) in record.components().iter() {
            if let Some(key) = component.state_key() {
                components.insert(key.to_string(), component.save_state());
            }
        }
        saved.insert(
            record.name().to_string(),
            json!({
                "x": record.x(),
                "y": record.y(),
                "destroyed": record.is_destroyed(),
                "components": components,
            }),
        );
    }
    log::debug!("saved {} entities", saved.len());
    Value::Object(saved)
}

/// Restore a snapshot produced by [`save_world`]
///
/// Entries without a matching live entity, and entries or component states
/// that fail to decode, are skipped with a warning so that one bad entry
/// does not lose the rest of the save. Components restored successfully get
/// their `after_load` hook. Returns the number of entities restored.
pub fn load_world(ctx: &mut SystemContext<'_>, state: &Value) -> Result<usize, StateError> {
    let entries = state_object(state, "scene")?;
    let mut restored = 0;
    for (name, entry) in entries {
        let Some(entity) = ctx.world().find_by_name(name) else {
            log::warn!("no live entity named '{}'; saved state ignored", name);
            continue;
        };
        match load_entity(ctx, entity, entry) {
            Ok(()) => restored += 1,
            Err(err) => log::warn!("could not restore '{}': {}", name, err),
        }
    }
    log::debug!("restored {} of {} saved entities", restored, entries.len());
    Ok(restored)
}

fn load_entity(ctx: &mut SystemContext<'_>, entity: Entity, entry: &Value) -> Result<(), StateError> {
    let entry = state_object(entry, "entity")?;
    if entry.get("destroyed").and_then(Value::as_bool).unwrap_or(false) {
        ctx.destroy(entity);
        return Ok(());
    }

    let x = entry.get("x").and_then(Value::as_f64);
    let y = entry.get("y").and_then(Value::as_f64);
    if let (Some(x), Some(y)) = (x, y) {
        ctx.world_mut().set_position(entity, x, y);
    }

    let components = match entry.get("components") {
        None | Some(Value::Null) => return Ok(()),
        Some(value) => state_object(value, "components")?,
    };
    ctx.dispatch(entity, |component, cctx| {
        let Some(key) = component.state_key() else {
            return;
        };
        let Some(saved) = components.get(key) else {
            return;
        };
        match component.load_state(saved) {
            Ok(()) => component.after_load(cctx),
            Err(err) => log::warn!("{} state of {} not restored: {}", key, cctx.owner(), err),
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::ecs::components::HealthComponent;
    use crate::events::EventBus;
    use crate::properties::Properties;
    use crate::render::RenderScheduler;

    struct Services {
        world: World,
        renderer: RenderScheduler,
        events: EventBus,
        config: RuntimeConfig,
    }

    impl Services {
        fn new() -> Self {
            Services {
                world: World::new(),
                renderer: RenderScheduler::new(),
                events: EventBus::new(),
                config: RuntimeConfig::default(),
            }
        }

        fn ctx(&mut self) -> SystemContext<'_> {
            SystemContext::new(&mut self.world, &mut self.renderer, &self.events, &self.config)
        }
    }

    fn level(services: &mut Services) -> (Entity, Entity) {
        let mut ctx = services.ctx();
        let hero = ctx.spawn(&Properties::new().with("name", "hero").with("x", 10));
        let slime = ctx.spawn(&Properties::new().with("name", "slime"));
        ctx.add_component(hero, HealthComponent::new(100));
        (hero, slime)
    }

    #[test]
    fn test_state_object_rejects_scalars() {
        assert_eq!(state_object(&json!(3), "door"), Err(StateError::NotAnObject("number")));
        assert!(state_object(&json!({}), "door").is_ok());
    }

    #[test]
    fn test_read_fields() {
        let state = json!({"open": true, "ticks": 4, "bad": -1});
        let map = state.as_object().unwrap();
        assert_eq!(read_bool(map, "open"), Ok(true));
        assert_eq!(read_u32(map, "ticks"), Ok(4));
        assert_eq!(read_bool(map, "shut"), Err(StateError::MissingField("shut")));
        assert!(matches!(read_u32(map, "bad"), Err(StateError::Malformed(_))));
        assert!(matches!(read_bool(map, "ticks"), Err(StateError::Malformed(_))));
    }

    #[test]
    fn test_save_and_restore_onto_fresh_level() {
        let mut before = Services::new();
        let (hero, slime) = level(&mut before);
        before.world.component_mut::<HealthComponent>(hero).unwrap().take_damage(30);
        before.world.set_position(hero, 50.0, 60.0);
        before.ctx().destroy(slime);
        let saved = save_world(&before.world);
        assert_eq!(saved["hero"]["components"]["health"]["current"], json!(70));
        assert_eq!(saved["slime"]["destroyed"], json!(true));

        let mut after = Services::new();
        let (hero, slime) = level(&mut after);
        assert_eq!(load_world(&mut after.ctx(), &saved), Ok(2));

        let record = after.world.get(hero).unwrap();
        assert_eq!((record.x(), record.y()), (50.0, 60.0));
        assert_eq!(record.component::<HealthComponent>().unwrap().current(), 70);
        assert!(!after.world.is_alive(slime));
    }

    #[test]
    fn test_unknown_names_and_bad_entries_are_skipped() {
        let mut services = Services::new();
        let (hero, _) = level(&mut services);
        let saved = json!({
            "ghost": {"x": 1.0, "y": 1.0},
            "slime": 7,
            "hero": {"components": {"health": "full"}},
        });
        assert_eq!(load_world(&mut services.ctx(), &saved), Ok(1));
        assert_eq!(services.world.component::<HealthComponent>(hero).unwrap().current(), 100);
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut services = Services::new();
        assert_eq!(
            load_world(&mut services.ctx(), &json!([])),
            Err(StateError::NotAnObject("array"))
        );
    }

    #[test]
    fn test_duplicate_and_unnamed_entities() {
        let mut services = Services::new();
        let mut ctx = services.ctx();
        ctx.spawn(&Properties::new().with("name", "bat").with("x", 1));
        ctx.spawn(&Properties::new().with("name", "bat").with("x", 2));
        ctx.spawn(&Properties::new());
        let saved = save_world(&services.world);
        assert_eq!(saved.as_object().unwrap().len(), 1);
        assert_eq!(saved["bat"]["x"], json!(1.0));
    }

    #[test]
    fn test_live_entity_wins_name_over_destroyed() {
        let mut services = Services::new();
        let mut ctx = services.ctx();
        let corpse = ctx.spawn(
            &Properties::new()
                .with("name", "guard")
                .with("x", 1)
                .with("protectedFromCleanup", true),
        );
        ctx.destroy(corpse);
        ctx.spawn(&Properties::new().with("name", "guard").with("x", 2));
        ctx.spawn(&Properties::new().with("name", "guard").with("x", 3));

        let saved = save_world(&services.world);
        assert_eq!(saved["guard"]["x"], json!(2.0));
        assert_eq!(saved["guard"]["destroyed"], json!(false));
    }
}
