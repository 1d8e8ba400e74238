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
//! Archetype API
//!
//! An archetype is a named recipe that turns a level object's property bag
//! into a fully assembled entity. The scene spawns the bare entity from the
//! standard properties first, then hands it to the archetype to add
//! components, zones and anything else the object type needs.
//!
//! Archetypes may extend another archetype by name. Building runs the
//! whole lineage, root first, against the same entity.

use crate::ecs::{Entity, SystemContext};
use crate::properties::Properties;

/// Version of the archetype API
///
/// Archetypes declare the API version they were written against and the
/// registry refuses incompatible ones. Format: MAJOR.MINOR.PATCH following
/// semantic versioning.
pub const ARCHETYPE_API_VERSION: &str = "0.1.0";

/// Recipe assembling an entity from its properties
pub trait Archetype {
    /// Object type this archetype builds, as written in level data
    fn name(&self) -> &str;

    /// Version of the archetype itself
    fn version(&self) -> &str;

    /// Archetype API version this archetype was written against
    fn api_version(&self) -> &str {
        ARCHETYPE_API_VERSION
    }

    /// Archetype whose build runs before this one
    fn extends(&self) -> Option<&str> {
        None
    }

    /// Add components and configuration to a freshly spawned entity
    ///
    /// Returning an error leaves whatever was already added in place; the
    /// registry reports the failure but never destroys the entity.
    fn build(
        &self,
        ctx: &mut SystemContext<'_>,
        entity: Entity,
        props: &Properties,
    ) -> Result<(), String>;
}

/// Archetype built from a closure
///
/// # Examples
///
/// ```
/// use entity_runtime::archetypes::{Archetype, FnArchetype};
/// use entity_runtime::ecs::components::HealthComponent;
///
/// let slime = FnArchetype::new("slime", |ctx, entity, props| {
///     ctx.add_component(entity, HealthComponent::new(props.get_i32("health", 3)));
///     Ok(())
/// });
/// assert_eq!(slime.name(), "slime");
/// ```
pub struct FnArchetype<F> {
    name: String,
    version: String,
    extends: Option<String>,
    build: F,
}

impl<F> FnArchetype<F>
where
    F: Fn(&mut SystemContext<'_>, Entity, &Properties) -> Result<(), String>,
{
    /// Create an archetype at version 0.1.0
    pub fn new(name: impl Into<String>, build: F) -> Self {
        FnArchetype {
            name: name.into(),
            version: "0.1.0".to_string(),
            extends: None,
            build,
        }
    }

    /// Run `parent` before this archetype
    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Set the archetype version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl<F> Archetype for FnArchetype<F>
where
    F: Fn(&mut SystemContext<'_>, Entity, &Properties) -> Result<(), String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    fn build(
        &self,
        ctx: &mut SystemContext<'_>,
        entity: Entity,
        props: &Properties,
    ) -> Result<(), String> {
        (self.build)(ctx, entity, props)
    }
}
