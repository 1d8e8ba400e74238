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
//! Portals that move travellers elsewhere

use crate::archetypes::api::Archetype;
use crate::archetypes::{is_default_target, proximity_zone, required_key};
use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentContext, Entity, SystemContext};
use crate::error::StateError;
use crate::interaction::ZoneKind;
use crate::persistence::{read_bool, read_u32, state_object};
use crate::properties::Properties;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;

/// Ticks a portal rests after use, unless configured
pub const DEFAULT_PORTAL_COOLDOWN: u32 = 60;

/// Where a portal leads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalDestination {
    /// Level to load; empty for the current level
    pub level: String,
    /// Arrival x
    pub x: i32,
    /// Arrival y
    pub y: i32,
    /// Portal to arrive at, when the game places travellers by portal
    pub portal_id: String,
}

impl PortalDestination {
    /// Read `destinationLevel`, `destinationX`, `destinationY` and
    /// `destinationPortalId`
    pub fn from_properties(props: &Properties) -> Self {
        PortalDestination {
            level: props.get_str("destinationLevel", "").to_string(),
            x: props.get_i32("destinationX", 0),
            y: props.get_i32("destinationY", 0),
            portal_id: props.get_str("destinationPortalId", "").to_string(),
        }
    }

    /// Whether the destination lies in the current level
    pub fn is_local(&self) -> bool {
        self.level.is_empty()
    }
}

/// Game-specific reactions to a portal
pub trait PortalHooks {
    /// Whether `traveller` holds the key the portal asks for
    fn has_key(&mut self, _ctx: &mut ComponentContext<'_>, _traveller: Entity, _key_id: &str) -> bool {
        false
    }

    /// Whether `traveller` completed the quest the portal asks for
    fn has_quest(
        &mut self,
        _ctx: &mut ComponentContext<'_>,
        _traveller: Entity,
        _quest_id: &str,
    ) -> bool {
        false
    }

    /// Whether touching the portal sends `entity` through; by default
    /// only the configured target entity travels
    fn is_traveller(&mut self, ctx: &mut ComponentContext<'_>, entity: Entity) -> bool {
        is_default_target(ctx, entity)
    }

    /// Move `traveller` to `destination`
    ///
    /// The default moves the traveller within the current level and leaves
    /// level changes to the game.
    fn teleport(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        traveller: Entity,
        destination: &PortalDestination,
    ) {
        if destination.is_local() {
            ctx.world_mut()
                .set_position(traveller, destination.x as f64, destination.y as f64);
        } else {
            log::debug!(
                "portal {} leads to level '{}'; level changes are up to the game",
                ctx.owner(),
                destination.level
            );
        }
    }

    /// Someone went through
    fn on_used(&mut self, _ctx: &mut ComponentContext<'_>, _traveller: Entity) {}

    /// Travel was refused for lack of a key
    fn on_key_required(&mut self, _ctx: &mut ComponentContext<'_>, _traveller: Entity) {}

    /// Travel was refused for lack of a quest
    fn on_quest_required(&mut self, _ctx: &mut ComponentContext<'_>, _traveller: Entity) {}
}

impl PortalHooks for () {}

/// Portal behavior
///
/// Manual portals send whoever interacts with them; automatic portals send
/// travellers that touch them. A portal rests for its cooldown after every
/// use, and one-time portals shut for good after the first.
pub struct PortalComponent {
    active: bool,
    used: bool,
    portal_id: String,
    destination: PortalDestination,
    required_key: Option<String>,
    required_quest: Option<String>,
    auto_teleport: bool,
    one_time: bool,
    cooldown_ticks: u32,
    cooldown: u32,
    hooks: Box<dyn PortalHooks>,
}

impl PortalComponent {
    /// Active, manual, reusable portal
    pub fn new(destination: PortalDestination) -> Self {
        PortalComponent {
            active: true,
            used: false,
            portal_id: String::new(),
            destination,
            required_key: None,
            required_quest: None,
            auto_teleport: false,
            one_time: false,
            cooldown_ticks: DEFAULT_PORTAL_COOLDOWN,
            cooldown: 0,
            hooks: Box::new(()),
        }
    }

    /// Read `portalId`, the destination, `isActive`, `isUsed`,
    /// `autoTeleport`, `oneTimeUse`, `cooldownTime` and the key and quest
    /// requirements
    pub fn from_properties(props: &Properties) -> Self {
        let required_quest = if props.get_bool("requiresQuest", false) {
            Some(props.get_str("requiredQuestId", "").to_string())
        } else {
            None
        };
        PortalComponent {
            active: props.get_bool("isActive", true),
            used: props.get_bool("isUsed", false),
            portal_id: props.get_str("portalId", "").to_string(),
            destination: PortalDestination::from_properties(props),
            required_key: required_key(props),
            required_quest,
            auto_teleport: props.get_bool("autoTeleport", false),
            one_time: props.get_bool("oneTimeUse", false),
            cooldown_ticks: props.get_u32("cooldownTime", DEFAULT_PORTAL_COOLDOWN),
            cooldown: 0,
            hooks: Box::new(()),
        }
    }

    /// Send travellers on touch instead of on interaction
    pub fn automatic(mut self) -> Self {
        self.auto_teleport = true;
        self
    }

    /// Shut for good after the first use
    pub fn one_time(mut self) -> Self {
        self.one_time = true;
        self
    }

    /// Rest for `ticks` updates after every use
    pub fn with_cooldown(mut self, ticks: u32) -> Self {
        self.cooldown_ticks = ticks;
        self
    }

    /// Require a key to travel
    pub fn locked_with(mut self, key_id: impl Into<String>) -> Self {
        self.required_key = Some(key_id.into());
        self
    }

    /// Require a quest to travel
    pub fn requiring_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.required_quest = Some(quest_id.into());
        self
    }

    /// Use game-specific hooks
    pub fn with_hooks(mut self, hooks: impl PortalHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Portal id
    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    /// Where the portal leads
    pub fn destination(&self) -> &PortalDestination {
        &self.destination
    }

    /// Whether the portal accepts travellers at all
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a one-time portal was used
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Whether the portal is resting
    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown > 0
    }

    /// Open the portal again; one-time portals that were used stay shut
    pub fn activate(&mut self) -> bool {
        if self.one_time && self.used {
            return false;
        }
        self.active = true;
        true
    }

    /// Shut the portal
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    fn is_ready(&self) -> bool {
        self.active && self.cooldown == 0 && !(self.one_time && self.used)
    }

    fn can_use(&mut self, ctx: &mut ComponentContext<'_>, traveller: Entity) -> bool {
        if let Some(key) = &self.required_key {
            if !self.hooks.has_key(ctx, traveller, key) {
                self.hooks.on_key_required(ctx, traveller);
                return false;
            }
        }
        if let Some(quest) = &self.required_quest {
            if !self.hooks.has_quest(ctx, traveller, quest) {
                self.hooks.on_quest_required(ctx, traveller);
                return false;
            }
        }
        true
    }

    fn send(&mut self, ctx: &mut ComponentContext<'_>, traveller: Entity) {
        self.cooldown = self.cooldown_ticks;
        if self.one_time {
            self.used = true;
            self.active = false;
        }
        log::debug!("{} travels through portal {}", traveller, ctx.owner());
        self.hooks.teleport(ctx, traveller, &self.destination);
        self.hooks.on_used(ctx, traveller);
    }
}

impl Component for PortalComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        let collision = if self.auto_teleport {
            CollisionType::Trigger
        } else {
            CollisionType::Solid
        };
        ctx.set_collision_type(collision);
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    fn on_interact(&mut self, ctx: &mut ComponentContext<'_>, source: Entity) {
        if self.is_ready() && self.can_use(ctx, source) {
            self.send(ctx, source);
        }
    }

    fn on_collision(&mut self, ctx: &mut ComponentContext<'_>, other: Entity) {
        if !self.auto_teleport || !self.is_ready() {
            return;
        }
        if self.hooks.is_traveller(ctx, other) && self.can_use(ctx, other) {
            self.send(ctx, other);
        }
    }

    fn state_key(&self) -> Option<&'static str> {
        Some("portal")
    }

    fn save_state(&self) -> Value {
        json!({
            "isActive": self.active,
            "isUsed": self.used,
            "currentCooldown": self.cooldown,
        })
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        let state = state_object(state, "portal")?;
        let active = read_bool(state, "isActive")?;
        let used = read_bool(state, "isUsed")?;
        let cooldown = read_u32(state, "currentCooldown")?;
        self.active = active;
        self.used = used;
        self.cooldown = cooldown;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for PortalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalComponent")
            .field("portal_id", &self.portal_id)
            .field("destination", &self.destination)
            .field("active", &self.active)
            .field("used", &self.used)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Builds `portal` objects; manual portals also get a dialogue zone
pub struct PortalArchetype {
    hooks: Box<dyn Fn() -> Box<dyn PortalHooks>>,
}

impl PortalArchetype {
    /// Portals with the default hooks
    pub fn new() -> Self {
        Self::with_hooks(|| ())
    }

    /// Portals whose hooks come from `factory`, called once per portal
    pub fn with_hooks<H, F>(factory: F) -> Self
    where
        H: PortalHooks + 'static,
        F: Fn() -> H + 'static,
    {
        PortalArchetype {
            hooks: Box::new(move || -> Box<dyn PortalHooks> { Box::new(factory()) }),
        }
    }
}

impl Default for PortalArchetype {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetype for PortalArchetype {
    fn name(&self) -> &str {
        "portal"
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
        let mut portal = PortalComponent::from_properties(props);
        portal.hooks = (self.hooks)();
        let manual = !portal.auto_teleport;
        ctx.add_component(entity, portal);
        if manual {
            let zone = proximity_zone(ctx, props, ZoneKind::Dialogue);
            ctx.add_component(entity, zone);
        }
        Ok(())
    }
}
