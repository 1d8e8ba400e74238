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
//! Doors that open on interaction

use crate::archetypes::api::Archetype;
use crate::archetypes::proximity_zone;
use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentContext, Entity, SystemContext};
use crate::error::StateError;
use crate::interaction::ZoneKind;
use crate::persistence::{read_bool, state_object};
use crate::properties::Properties;
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;

/// Door position in its open/close cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    /// Shut and blocking
    Closed,
    /// Swinging open; still blocking
    Opening,
    /// Passable
    Open,
    /// Swinging shut; blocking again
    Closing,
}

impl DoorState {
    /// Whether the door is settled rather than mid-transition
    pub fn is_idle(self) -> bool {
        matches!(self, DoorState::Closed | DoorState::Open)
    }

    fn collision(self) -> CollisionType {
        match self {
            DoorState::Open => CollisionType::Trigger,
            _ => CollisionType::Solid,
        }
    }
}

/// Game-specific reactions to a door
///
/// Every method defaults to doing nothing.
pub trait DoorHooks {
    /// The door finished opening
    fn on_opened(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// The door finished closing
    fn on_closed(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Something stands in the doorway, so the door stays open
    fn on_blocked(&mut self, _ctx: &mut ComponentContext<'_>, _source: Entity) {}
}

impl DoorHooks for () {}

/// Door behavior
///
/// Interacting with a closed door opens it and interacting with an open
/// door closes it, unless anything collidable overlaps the doorway. Doors
/// block while closed or moving and let things through once open.
pub struct DoorComponent {
    state: DoorState,
    transition_ticks: u32,
    remaining: u32,
    hooks: Box<dyn DoorHooks>,
}

impl DoorComponent {
    /// Create a door, optionally already open
    pub fn new(open: bool) -> Self {
        DoorComponent {
            state: if open { DoorState::Open } else { DoorState::Closed },
            transition_ticks: 0,
            remaining: 0,
            hooks: Box::new(()),
        }
    }

    /// Read `startsOpen` and `transitionTicks`
    pub fn from_properties(props: &Properties) -> Self {
        DoorComponent::new(props.get_bool("startsOpen", false))
            .with_transition_ticks(props.get_u32("transitionTicks", 0))
    }

    /// Take `ticks` updates to open or close; zero switches instantly
    pub fn with_transition_ticks(mut self, ticks: u32) -> Self {
        self.transition_ticks = ticks;
        self
    }

    /// Use game-specific hooks
    pub fn with_hooks(mut self, hooks: impl DoorHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Current state
    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Whether the door is open or opening
    pub fn is_open(&self) -> bool {
        matches!(self.state, DoorState::Open | DoorState::Opening)
    }

    fn enter(&mut self, ctx: &mut ComponentContext<'_>, state: DoorState) {
        self.state = state;
        ctx.set_collision_type(state.collision());
        match state {
            DoorState::Open => self.hooks.on_opened(ctx),
            DoorState::Closed => self.hooks.on_closed(ctx),
            DoorState::Opening | DoorState::Closing => self.remaining = self.transition_ticks,
        }
    }

    fn begin(&mut self, ctx: &mut ComponentContext<'_>, moving: DoorState, settled: DoorState) {
        if self.transition_ticks == 0 {
            self.enter(ctx, settled);
        } else {
            self.enter(ctx, moving);
        }
    }
}

/// Whether anything collidable overlaps the owner's hit mask
fn is_obstructed(ctx: &ComponentContext<'_>) -> bool {
    let owner = ctx.owner();
    let Some(door) = ctx.owner_record() else {
        return false;
    };
    let doorway = door.hit_rect();
    ctx.world().iter().any(|(other, record)| {
        other != owner
            && !record.is_destroyed()
            && !record.collision_type().is_none()
            && record.hit_rect().intersects(&doorway)
    })
}

impl Component for DoorComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.set_collision_type(self.state.collision());
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.state.is_idle() {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            match self.state {
                DoorState::Opening => self.enter(ctx, DoorState::Open),
                DoorState::Closing => self.enter(ctx, DoorState::Closed),
                _ => {}
            }
        }
    }

    fn on_interact(&mut self, ctx: &mut ComponentContext<'_>, source: Entity) {
        match self.state {
            DoorState::Closed => self.begin(ctx, DoorState::Opening, DoorState::Open),
            DoorState::Open => {
                if is_obstructed(ctx) {
                    log::debug!("door {} is obstructed", ctx.owner());
                    self.hooks.on_blocked(ctx, source);
                } else {
                    self.begin(ctx, DoorState::Closing, DoorState::Closed);
                }
            }
            DoorState::Opening | DoorState::Closing => {}
        }
    }

    fn state_key(&self) -> Option<&'static str> {
        Some("door")
    }

    fn save_state(&self) -> Value {
        json!({ "isOpen": self.is_open() })
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        let open = read_bool(state_object(state, "door")?, "isOpen")?;
        self.state = if open { DoorState::Open } else { DoorState::Closed };
        self.remaining = 0;
        Ok(())
    }

    fn after_load(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.set_collision_type(self.state.collision());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for DoorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorComponent")
            .field("state", &self.state)
            .field("transition_ticks", &self.transition_ticks)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Builds `door` objects: a [`DoorComponent`] plus a trigger zone
pub struct DoorArchetype {
    hooks: Box<dyn Fn() -> Box<dyn DoorHooks>>,
}

impl DoorArchetype {
    /// Doors with no game-specific hooks
    pub fn new() -> Self {
        Self::with_hooks(|| ())
    }

    /// Doors whose hooks come from `factory`, called once per door
    pub fn with_hooks<H, F>(factory: F) -> Self
    where
        H: DoorHooks + 'static,
        F: Fn() -> H + 'static,
    {
        DoorArchetype {
            hooks: Box::new(move || -> Box<dyn DoorHooks> { Box::new(factory()) }),
        }
    }
}

impl Default for DoorArchetype {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetype for DoorArchetype {
    fn name(&self) -> &str {
        "door"
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
        let mut door = DoorComponent::from_properties(props);
        door.hooks = (self.hooks)();
        let zone = proximity_zone(ctx, props, ZoneKind::Trigger);
        ctx.add_component(entity, door);
        ctx.add_component(entity, zone);
        Ok(())
    }
}
