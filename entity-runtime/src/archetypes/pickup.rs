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
//! Collectible items

use crate::archetypes::api::Archetype;
use crate::archetypes::{is_default_target, proximity_zone, required_key};
use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentContext, Entity, SystemContext};
use crate::error::StateError;
use crate::interaction::ZoneKind;
use crate::persistence::{read_bool, read_u32, state_object};
use crate::properties::Properties;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;

/// Ticks before a respawning pickup comes back, unless configured
pub const DEFAULT_RESPAWN_TICKS: u32 = 300;

/// Game-specific reactions to a pickup
pub trait PickupHooks {
    /// Whether `collector` holds the key the pickup asks for
    fn has_key(&mut self, _ctx: &mut ComponentContext<'_>, _collector: Entity, _key_id: &str) -> bool {
        false
    }

    /// Whether touching the pickup collects it; by default only the
    /// configured target entity does
    fn is_collector(&mut self, ctx: &mut ComponentContext<'_>, entity: Entity) -> bool {
        is_default_target(ctx, entity)
    }

    /// Add the item to `collector`'s inventory
    fn give_item(
        &mut self,
        _ctx: &mut ComponentContext<'_>,
        _collector: Entity,
        _item_id: &str,
        _quantity: u32,
    ) {
    }

    /// The item was collected
    fn on_collected(&mut self, _ctx: &mut ComponentContext<'_>, _collector: Entity) {}

    /// A respawning item came back
    fn on_respawned(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Collection was refused for lack of a key
    fn on_key_required(&mut self, _ctx: &mut ComponentContext<'_>, _collector: Entity) {}
}

impl PickupHooks for () {}

/// Pickup behavior
///
/// Manual pickups are collected by interacting with them, automatic ones
/// by touching them. Once collected, a pickup either starts its respawn
/// countdown or stops colliding and destroys its owner.
pub struct PickupComponent {
    item_id: String,
    quantity: u32,
    auto_pickup: bool,
    respawns: bool,
    respawn_ticks: u32,
    respawn_timer: u32,
    collected: bool,
    required_key: Option<String>,
    hooks: Box<dyn PickupHooks>,
}

impl PickupComponent {
    /// One manual, non-respawning `item_id`
    pub fn new(item_id: impl Into<String>) -> Self {
        PickupComponent {
            item_id: item_id.into(),
            quantity: 1,
            auto_pickup: false,
            respawns: false,
            respawn_ticks: DEFAULT_RESPAWN_TICKS,
            respawn_timer: 0,
            collected: false,
            required_key: None,
            hooks: Box::new(()),
        }
    }

    /// Read `itemId`, `quantity`, `autoPickup`, `respawns`, `respawnTime`,
    /// `isCollected`, `requiresKey` and `requiredKeyId`
    pub fn from_properties(props: &Properties) -> Self {
        PickupComponent {
            item_id: props.get_str("itemId", "").to_string(),
            quantity: props.get_u32("quantity", 1),
            auto_pickup: props.get_bool("autoPickup", false),
            respawns: props.get_bool("respawns", false),
            respawn_ticks: props.get_u32("respawnTime", DEFAULT_RESPAWN_TICKS),
            respawn_timer: 0,
            collected: props.get_bool("isCollected", false),
            required_key: required_key(props),
            hooks: Box::new(()),
        }
    }

    /// Number of items handed out
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Collect on touch instead of on interaction
    pub fn automatic(mut self) -> Self {
        self.auto_pickup = true;
        self
    }

    /// Come back `ticks` updates after being collected
    pub fn respawning_after(mut self, ticks: u32) -> Self {
        self.respawns = true;
        self.respawn_ticks = ticks;
        self
    }

    /// Require a key to collect
    pub fn locked_with(mut self, key_id: impl Into<String>) -> Self {
        self.required_key = Some(key_id.into());
        self
    }

    /// Use game-specific hooks
    pub fn with_hooks(mut self, hooks: impl PickupHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Item id
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Number of items handed out
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Whether touching collects
    pub fn is_automatic(&self) -> bool {
        self.auto_pickup
    }

    /// Whether the item is currently collected
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Ticks left before respawning
    pub fn respawn_timer(&self) -> u32 {
        self.respawn_timer
    }

    fn available_collision(&self) -> CollisionType {
        if self.auto_pickup {
            CollisionType::Trigger
        } else {
            CollisionType::Solid
        }
    }

    fn is_gone(&self) -> bool {
        self.collected && !self.respawns
    }

    fn try_collect(&mut self, ctx: &mut ComponentContext<'_>, collector: Entity) {
        if let Some(key) = &self.required_key {
            if !self.hooks.has_key(ctx, collector, key) {
                self.hooks.on_key_required(ctx, collector);
                return;
            }
        }

        self.collected = true;
        log::debug!("{} collected {} x{}", collector, self.item_id, self.quantity);
        self.hooks.give_item(ctx, collector, &self.item_id, self.quantity);
        self.hooks.on_collected(ctx, collector);

        ctx.set_collision_type(CollisionType::NoCollision);
        if self.respawns {
            self.respawn_timer = self.respawn_ticks;
        } else {
            ctx.destroy_owner();
        }
    }

    fn respawn(&mut self, ctx: &mut ComponentContext<'_>) {
        self.collected = false;
        ctx.set_collision_type(self.available_collision());
        self.hooks.on_respawned(ctx);
    }
}

impl Component for PickupComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        self.after_load(ctx);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.collected && self.respawns && self.respawn_timer > 0 {
            self.respawn_timer -= 1;
            if self.respawn_timer == 0 {
                self.respawn(ctx);
            }
        }
    }

    fn on_interact(&mut self, ctx: &mut ComponentContext<'_>, source: Entity) {
        if !self.collected {
            self.try_collect(ctx, source);
        }
    }

    fn on_collision(&mut self, ctx: &mut ComponentContext<'_>, other: Entity) {
        if !self.auto_pickup || self.collected {
            return;
        }
        if self.hooks.is_collector(ctx, other) {
            self.try_collect(ctx, other);
        }
    }

    fn state_key(&self) -> Option<&'static str> {
        Some("pickup")
    }

    fn save_state(&self) -> Value {
        json!({
            "isCollected": self.collected,
            "currentRespawnTimer": self.respawn_timer,
        })
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        let state = state_object(state, "pickup")?;
        let collected = read_bool(state, "isCollected")?;
        let timer = read_u32(state, "currentRespawnTimer")?;
        self.collected = collected;
        self.respawn_timer = timer;
        Ok(())
    }

    fn after_load(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.is_gone() {
            ctx.set_collision_type(CollisionType::NoCollision);
            ctx.destroy_owner();
        } else if self.collected {
            ctx.set_collision_type(CollisionType::NoCollision);
        } else {
            ctx.set_collision_type(self.available_collision());
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for PickupComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickupComponent")
            .field("item_id", &self.item_id)
            .field("quantity", &self.quantity)
            .field("auto_pickup", &self.auto_pickup)
            .field("respawns", &self.respawns)
            .field("respawn_timer", &self.respawn_timer)
            .field("collected", &self.collected)
            .finish_non_exhaustive()
    }
}

/// Builds `pickup` objects; manual pickups also get a dialogue zone
pub struct PickupArchetype {
    hooks: Box<dyn Fn() -> Box<dyn PickupHooks>>,
}

impl PickupArchetype {
    /// Pickups with no game-specific hooks
    pub fn new() -> Self {
        Self::with_hooks(|| ())
    }

    /// Pickups whose hooks come from `factory`, called once per pickup
    pub fn with_hooks<H, F>(factory: F) -> Self
    where
        H: PickupHooks + 'static,
        F: Fn() -> H + 'static,
    {
        PickupArchetype {
            hooks: Box::new(move || -> Box<dyn PickupHooks> { Box::new(factory()) }),
        }
    }
}

impl Default for PickupArchetype {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetype for PickupArchetype {
    fn name(&self) -> &str {
        "pickup"
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
        let mut pickup = PickupComponent::from_properties(props);
        pickup.hooks = (self.hooks)();
        let manual = !pickup.is_automatic();
        ctx.add_component(entity, pickup);
        if manual {
            let zone = proximity_zone(ctx, props, ZoneKind::Dialogue);
            ctx.add_component(entity, zone);
        }
        Ok(())
    }
}
