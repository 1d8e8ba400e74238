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
//! Switches and levers

use crate::archetypes::api::Archetype;
use crate::archetypes::{proximity_zone, required_key};
use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentContext, Entity, SystemContext};
use crate::error::StateError;
use crate::events::EngineEvent;
use crate::interaction::ZoneKind;
use crate::persistence::{read_bool, read_u32, state_object};
use crate::properties::Properties;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;

/// Name of the custom event published whenever a switch flips
pub const SWITCH_TOGGLED_EVENT: &str = "switch_toggled";

/// Game-specific reactions to a switch
pub trait SwitchHooks {
    /// Whether `user` holds the key the switch asks for
    fn has_key(&mut self, _ctx: &mut ComponentContext<'_>, _user: Entity, _key_id: &str) -> bool {
        false
    }

    /// The switch turned on
    fn on_activated(&mut self, _ctx: &mut ComponentContext<'_>, _switch_id: &str) {}

    /// The switch turned off
    fn on_deactivated(&mut self, _ctx: &mut ComponentContext<'_>, _switch_id: &str) {}

    /// Flipping was refused for lack of a key
    fn on_key_required(&mut self, _ctx: &mut ComponentContext<'_>, _user: Entity) {}
}

impl SwitchHooks for () {}

/// Switch behavior
///
/// Toggleable switches flip on every interaction; one-way switches only
/// ever turn on. After flipping, the switch ignores interaction for its
/// cooldown. Every flip publishes a [`SWITCH_TOGGLED_EVENT`] custom event
/// whose payload carries `switchId` and `isOn`.
pub struct SwitchComponent {
    on: bool,
    switch_id: String,
    toggleable: bool,
    required_key: Option<String>,
    cooldown_ticks: u32,
    cooldown: u32,
    hooks: Box<dyn SwitchHooks>,
}

impl SwitchComponent {
    /// Toggleable switch, initially off
    pub fn new(switch_id: impl Into<String>) -> Self {
        SwitchComponent {
            on: false,
            switch_id: switch_id.into(),
            toggleable: true,
            required_key: None,
            cooldown_ticks: 0,
            cooldown: 0,
            hooks: Box::new(()),
        }
    }

    /// Read `switchId`, `startsOn`, `isToggleable`, `cooldownTime`,
    /// `requiresKey` and `requiredKeyId`
    pub fn from_properties(props: &Properties) -> Self {
        SwitchComponent {
            on: props.get_bool("startsOn", false),
            switch_id: props.get_str("switchId", "").to_string(),
            toggleable: props.get_bool("isToggleable", true),
            required_key: required_key(props),
            cooldown_ticks: props.get_u32("cooldownTime", 0),
            cooldown: 0,
            hooks: Box::new(()),
        }
    }

    /// Only ever turn on
    pub fn one_way(mut self) -> Self {
        self.toggleable = false;
        self
    }

    /// Ignore interaction for `ticks` updates after flipping
    pub fn with_cooldown(mut self, ticks: u32) -> Self {
        self.cooldown_ticks = ticks;
        self
    }

    /// Require a key to flip
    pub fn locked_with(mut self, key_id: impl Into<String>) -> Self {
        self.required_key = Some(key_id.into());
        self
    }

    /// Use game-specific hooks
    pub fn with_hooks(mut self, hooks: impl SwitchHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Whether the switch is on
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Switch id shared with whatever it controls
    pub fn switch_id(&self) -> &str {
        &self.switch_id
    }

    /// Whether the switch is cooling down
    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown > 0
    }

    fn flip(&mut self, ctx: &mut ComponentContext<'_>, on: bool) {
        if self.on == on {
            return;
        }
        self.on = on;
        self.cooldown = self.cooldown_ticks;
        if on {
            self.hooks.on_activated(ctx, &self.switch_id);
        } else {
            self.hooks.on_deactivated(ctx, &self.switch_id);
        }
        ctx.publish(EngineEvent::Custom {
            name: SWITCH_TOGGLED_EVENT.to_string(),
            source: Some(ctx.owner()),
            payload: json!({ "switchId": self.switch_id, "isOn": on }),
        });
    }
}

impl Component for SwitchComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.set_collision_type(CollisionType::Solid);
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    fn on_interact(&mut self, ctx: &mut ComponentContext<'_>, source: Entity) {
        if self.is_on_cooldown() {
            return;
        }
        if let Some(key) = &self.required_key {
            if !self.hooks.has_key(ctx, source, key) {
                self.hooks.on_key_required(ctx, source);
                return;
            }
        }
        if self.toggleable {
            let on = !self.on;
            self.flip(ctx, on);
        } else {
            self.flip(ctx, true);
        }
    }

    fn state_key(&self) -> Option<&'static str> {
        Some("switch")
    }

    fn save_state(&self) -> Value {
        json!({ "isOn": self.on, "currentCooldown": self.cooldown })
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        let state = state_object(state, "switch")?;
        let on = read_bool(state, "isOn")?;
        let cooldown = read_u32(state, "currentCooldown")?;
        self.on = on;
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

impl fmt::Debug for SwitchComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchComponent")
            .field("on", &self.on)
            .field("switch_id", &self.switch_id)
            .field("toggleable", &self.toggleable)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Builds `switch` objects: a [`SwitchComponent`] plus a dialogue zone
pub struct SwitchArchetype {
    hooks: Box<dyn Fn() -> Box<dyn SwitchHooks>>,
}

impl SwitchArchetype {
    /// Switches with no game-specific hooks
    pub fn new() -> Self {
        Self::with_hooks(|| ())
    }

    /// Switches whose hooks come from `factory`, called once per switch
    pub fn with_hooks<H, F>(factory: F) -> Self
    where
        H: SwitchHooks + 'static,
        F: Fn() -> H + 'static,
    {
        SwitchArchetype {
            hooks: Box::new(move || -> Box<dyn SwitchHooks> { Box::new(factory()) }),
        }
    }
}

impl Default for SwitchArchetype {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetype for SwitchArchetype {
    fn name(&self) -> &str {
        "switch"
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
        let mut switch = SwitchComponent::from_properties(props);
        switch.hooks = (self.hooks)();
        let zone = proximity_zone(ctx, props, ZoneKind::Dialogue);
        ctx.add_component(entity, switch);
        ctx.add_component(entity, zone);
        Ok(())
    }
}
