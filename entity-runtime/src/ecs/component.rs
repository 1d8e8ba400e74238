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
//! Components and per-entity component storage
//!
//! A component is a unit of behavior or state owned by exactly one entity.
//! Every entity keeps its components in a [`ComponentSet`], at most one per
//! concrete type, in insertion order. Replacing a component keeps its slot,
//! so update order is stable for the lifetime of the entity.
//!
//! Components receive lifecycle hooks through a [`ComponentContext`],
//! which gives scoped access to the owner, the world, the render scheduler
//! and the event bus without handing out long-lived references.

use crate::ecs::{ComponentContext, Entity, EntityRecord};
use crate::error::StateError;
use crate::render::Surface;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;

/// Behavior unit attached to an entity
///
/// Every hook has an empty default, so a component implements only what it
/// needs plus the two downcasting methods.
///
/// # Example
///
/// ```rust
/// use entity_runtime::ecs::{Component, ComponentContext};
/// use std::any::Any;
///
/// struct Spin {
///     turns: u32,
/// }
///
/// impl Component for Spin {
///     fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
///         self.turns += 1;
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Component: 'static {
    /// Called once when the component is attached to its owner
    fn attach(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called once per tick while the owner is alive
    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called after the update pass when the owner's hit mask overlaps
    /// another entity's
    fn on_collision(&mut self, _ctx: &mut ComponentContext<'_>, _other: Entity) {}

    /// Called when another entity interacts with the owner
    fn on_interact(&mut self, _ctx: &mut ComponentContext<'_>, _source: Entity) {}

    /// Called when the component is replaced or removed
    fn on_remove(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Draw as part of the owner, after the owner's sprite
    fn draw(&self, _owner: &EntityRecord, _surface: &mut dyn Surface) {}

    /// Components that register as render producers of their own return
    /// themselves here
    fn as_drawable(&self) -> Option<&dyn ComponentDrawable> {
        None
    }

    /// Key under which this component's state is saved; `None` opts out
    fn state_key(&self) -> Option<&'static str> {
        None
    }

    /// Snapshot of the persistent state
    fn save_state(&self) -> Value {
        Value::Null
    }

    /// Restore state produced by [`Component::save_state`]
    fn load_state(&mut self, _state: &Value) -> Result<(), StateError> {
        Ok(())
    }

    /// Called after [`Component::load_state`] succeeded, so restored state
    /// can be pushed back onto the owner
    fn after_load(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Allow downcasting to the concrete component type
    fn as_any(&self) -> &dyn Any;

    /// Allow mutable downcasting to the concrete component type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A component drawn as an independent render producer
///
/// The component registers `DrawableKey::Component(owner, kind)` with the
/// render scheduler, usually in [`Component::attach`], and unregisters in
/// [`Component::on_remove`].
pub trait ComponentDrawable {
    /// Sort key within the producer's layer
    fn depth_key(&self, owner: &EntityRecord) -> i32;

    /// Whether to draw this frame
    fn is_visible(&self, owner: &EntityRecord) -> bool;

    /// Issue draw calls
    fn render(&self, owner: &EntityRecord, surface: &mut dyn Surface);
}

/// Identifies a concrete component type
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Kind of the component type `T`
    pub fn of<T: Component>() -> Self {
        ComponentKind {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.name.rsplit("::").next().unwrap_or(self.name);
        write!(f, "ComponentKind({})", short)
    }
}

pub(crate) struct ComponentSlot {
    pub(crate) kind: ComponentKind,
    pub(crate) component: Box<dyn Component>,
}

/// Components of one entity, at most one per kind, in insertion order
#[derive(Default)]
pub struct ComponentSet {
    slots: Vec<ComponentSlot>,
}

impl ComponentSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check for a component by kind
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots.iter().any(|s| s.kind == kind)
    }

    /// Check for a component by type
    pub fn has<T: Component>(&self) -> bool {
        self.contains(ComponentKind::of::<T>())
    }

    /// Typed access
    pub fn get<T: Component>(&self) -> Option<&T> {
        let kind = ComponentKind::of::<T>();
        self.slots
            .iter()
            .find(|s| s.kind == kind)
            .and_then(|s| s.component.as_any().downcast_ref::<T>())
    }

    /// Typed mutable access
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let kind = ComponentKind::of::<T>();
        self.slots
            .iter_mut()
            .find(|s| s.kind == kind)
            .and_then(|s| s.component.as_any_mut().downcast_mut::<T>())
    }

    /// Untyped access by kind
    pub fn get_dyn(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.slots
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.component.as_ref())
    }

    /// Kinds in insertion order
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.slots.iter().map(|s| s.kind)
    }

    /// Components in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &dyn Component)> + '_ {
        self.slots.iter().map(|s| (s.kind, s.component.as_ref()))
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentKind, &mut (dyn Component + 'static))> + '_ {
        self.slots
            .iter_mut()
            .map(|s| (s.kind, s.component.as_mut()))
    }

    /// Insert at `index` (clamped), or append when no index is given
    pub(crate) fn insert_at(
        &mut self,
        index: Option<usize>,
        kind: ComponentKind,
        component: Box<dyn Component>,
    ) {
        debug_assert!(!self.contains(kind), "duplicate component {:?}", kind);
        let slot = ComponentSlot { kind, component };
        match index {
            Some(i) if i < self.slots.len() => self.slots.insert(i, slot),
            _ => self.slots.push(slot),
        }
    }

    /// Remove a component, returning its former slot index
    pub(crate) fn remove(&mut self, kind: ComponentKind) -> Option<(usize, Box<dyn Component>)> {
        let index = self.slots.iter().position(|s| s.kind == kind)?;
        Some((index, self.slots.remove(index).component))
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [ComponentSlot] {
        &mut self.slots
    }
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
