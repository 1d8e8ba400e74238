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
//! Archetypes for level objects
//!
//! This module turns object types found in level data into assembled
//! entities. It provides:
//!
//! - **Archetype API**: the [`Archetype`] trait and closure-backed
//!   [`FnArchetype`]
//! - **Registry**: [`ArchetypeRegistry`] with semver-checked registration
//!   and `extends` lineage
//! - **Interactive objects**: doors, chests, pickups, switches and portals.
//!   Each is a behavior component holding the shared state machine plus a
//!   small hook trait a game implements to customize it
//!
//! # Customizing an object
//!
//! ```rust
//! use entity_runtime::archetypes::{ArchetypeRegistry, ChestArchetype, ChestHooks};
//! use entity_runtime::ecs::{ComponentContext, Entity};
//!
//! struct Inventory;
//!
//! impl ChestHooks for Inventory {
//!     fn give_loot(&mut self, _ctx: &mut ComponentContext<'_>, _looter: Entity, table: &str) {
//!         println!("rolled loot table {}", table);
//!     }
//! }
//!
//! let mut registry = ArchetypeRegistry::with_standard();
//! registry.replace(Box::new(ChestArchetype::with_hooks(|| Inventory))).unwrap();
//! ```

pub mod api;
pub mod registry;

mod chest;
mod door;
mod pickup;
mod portal;
mod switch;

pub use api::{Archetype, FnArchetype, ARCHETYPE_API_VERSION};
pub use chest::{ChestArchetype, ChestComponent, ChestHooks};
pub use door::{DoorArchetype, DoorComponent, DoorHooks, DoorState};
pub use pickup::{PickupArchetype, PickupComponent, PickupHooks, DEFAULT_RESPAWN_TICKS};
pub use portal::{
    PortalArchetype, PortalComponent, PortalDestination, PortalHooks, DEFAULT_PORTAL_COOLDOWN,
};
pub use registry::ArchetypeRegistry;
pub use switch::{SwitchArchetype, SwitchComponent, SwitchHooks, SWITCH_TOGGLED_EVENT};

use crate::ecs::{ComponentContext, Entity, SystemContext};
use crate::interaction::{InteractionComponent, ZoneKind, ZoneShape};
use crate::properties::Properties;

/// Key id an object asks for, when `requiresKey` is set
fn required_key(props: &Properties) -> Option<String> {
    if props.get_bool("requiresKey", false) {
        Some(props.get_str("requiredKeyId", "").to_string())
    } else {
        None
    }
}

/// Circular zone around an object tracking the configured target
///
/// `interactionRadius` and `interactionTarget` override the runtime
/// defaults.
fn proximity_zone(ctx: &SystemContext<'_>, props: &Properties, kind: ZoneKind) -> InteractionComponent {
    let config = ctx.config();
    let radius = props.get_f64("interactionRadius", config.interaction_radius);
    let target = props.get_str("interactionTarget", &config.default_target);
    InteractionComponent::new()
        .with_zone(kind, ZoneShape::circle(radius))
        .tracking_named(target)
}

/// Whether an entity is the configured target, by name
fn is_default_target(ctx: &ComponentContext<'_>, entity: Entity) -> bool {
    ctx.world()
        .get(entity)
        .map_or(false, |record| record.name() == ctx.config().default_target)
}
