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
//! Chests that open once and hand out loot

use crate::archetypes::api::Archetype;
use crate::archetypes::{proximity_zone, required_key};
use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentContext, Entity, SystemContext};
use crate::error::StateError;
use crate::interaction::ZoneKind;
use crate::persistence::{read_bool, state_object};
use crate::properties::Properties;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;

/// Game-specific reactions to a chest
pub trait ChestHooks {
    /// Whether `looter` holds the key the chest asks for
    ///
    /// Locked chests stay shut unless this is overridden.
    fn has_key(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity, _key_id: &str) -> bool {
        false
    }

    /// Hand the contents of `loot_table` to `looter`
    fn give_loot(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity, _loot_table: &str) {}

    /// The lid opened
    fn on_opened(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// The loot was handed out
    fn on_looted(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity) {}

    /// Opening was refused for lack of a key
    fn on_key_required(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity) {}

    /// Someone interacted with an empty chest
    fn on_already_looted(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity) {}
}

impl ChestHooks for () {}

/// Chest behavior
///
/// The first successful interaction opens the chest and loots it in one
/// go. Later interactions only report that it is empty.
pub struct ChestComponent {
    open: bool,
    looted: bool,
    loot_table: String,
    required_key: Option<String>,
    hooks: Box<dyn ChestHooks>,
}

impl ChestComponent {
    /// Closed, unlocked chest holding `loot_table`
    pub fn new(loot_table: impl Into<String>) -> Self {
        ChestComponent {
            open: false,
            looted: false,
            loot_table: loot_table.into(),
            required_key: None,
            hooks: Box::new(()),
        }
    }

    /// Read `lootTable`, `startsOpen`, `hasBeenLooted`, `requiresKey` and
    /// `requiredKeyId`
    pub fn from_properties(props: &Properties) -> Self {
        ChestComponent {
            open: props.get_bool("startsOpen", false),
            looted: props.get_bool("hasBeenLooted", false),
            loot_table: props.get_str("lootTable", "").to_string(),
            required_key: required_key(props),
            hooks: Box::new(()),
        }
    }

    /// Lock the chest behind a key
    pub fn locked_with(mut self, key_id: impl Into<String>) -> Self {
        self.required_key = Some(key_id.into());
        self
    }

    /// Use game-specific hooks
    pub fn with_hooks(mut self, hooks: impl ChestHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Whether the lid is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the loot was handed out
    pub fn is_looted(&self) -> bool {
        self.looted
    }

    /// Loot table name
    pub fn loot_table(&self) -> &str {
        &self.loot_table
    }

    /// Key id the chest asks for, if locked
    pub fn required_key(&self) -> Option<&str> {
        self.required_key.as_deref()
    }
}

impl Component for ChestComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.set_collision_type(CollisionType::Solid);
    }

    fn on_interact(&mut self, ctx: &mut ComponentContext<'_>, source: Entity) {
        if self.open && self.looted {
            self.hooks.on_already_looted(ctx, source);
            return;
        }
        if !self.open {
            if let Some(key) = &self.required_key {
                if !self.hooks.has_key(ctx, source, key) {
                    self.hooks.on_key_required(ctx, source);
                    return;
                }
            }
            self.open = true;
            self.hooks.on_opened(ctx);
        }
        self.looted = true;
        log::debug!("{} looted {} ('{}')", source, ctx.owner(), self.loot_table);
        self.hooks.give_loot(ctx, source, &self.loot_table);
        self.hooks.on_looted(ctx, source);
    }

    fn state_key(&self) -> Option<&'static str> {
        Some("chest")
    }

    fn save_state(&self) -> Value {
        json!({ "isOpen": self.open, "hasBeenLooted": self.looted })
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        let state = state_object(state, "chest")?;
        let open = read_bool(state, "isOpen")?;
        let looted = read_bool(state, "hasBeenLooted")?;
        self.open = open;
        self.looted = looted;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for ChestComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChestComponent")
            .field("open", &self.open)
            .field("looted", &self.looted)
            .field("loot_table", &self.loot_table)
            .field("required_key", &self.required_key)
            .finish_non_exhaustive()
    }
}

/// Builds `chest` objects: a [`ChestComponent`] plus a dialogue zone
pub struct ChestArchetype {
    hooks: Box<dyn Fn() -> Box<dyn ChestHooks>>,
}

impl ChestArchetype {
    /// Chests with no game-specific hooks
    pub fn new() -> Self {
        Self::with_hooks(|| ())
    }

    /// Chests whose hooks come from `factory`, called once per chest
    pub fn with_hooks<H, F>(factory: F) -> Self
    where
        H: ChestHooks + 'static,
        F: Fn() -> H + 'static,
    {
        ChestArchetype {
            hooks: Box::new(move || -> Box<dyn ChestHooks> { Box::new(factory()) }),
        }
    }
}

impl Default for ChestArchetype {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetype for ChestArchetype {
    fn name(&self) -> &str {
        "chest"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn build(
        &self,
        ctx: &mut SystemContext<'_>,
        entity: Entity,
        props: &Properties,
    ) -> Result<(), String> {
        let mut chest = ChestComponent::from_properties(props);
        chest.hooks = (self.hooks)();
        let zone = proximity_zone(ctx, props, ZoneKind::Dialogue);
        ctx.add_component(entity, chest);
        ctx.add_component(entity, zone);
        Ok(())
    }
}
