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
//! Archetype registry
//!
//! This module provides the registry that maps object type names to
//! archetypes, including:
//! - Static registration with API version compatibility checking
//! - Case-insensitive lookup by object type
//! - Lineage resolution along `extends` links with cycle detection

use crate::archetypes::api::{Archetype, ARCHETYPE_API_VERSION};
use crate::archetypes::{
    ChestArchetype, DoorArchetype, PickupArchetype, PortalArchetype, SwitchArchetype,
};
use crate::ecs::{Entity, SystemContext};
use crate::error::RegistryError;
use crate::properties::Properties;
use semver::Version;
use std::collections::{HashMap, HashSet};

/// Registry of archetypes keyed by object type
pub struct ArchetypeRegistry {
    /// Registered archetypes indexed by lowercased name
    archetypes: HashMap<String, Box<dyn Archetype>>,
}

impl ArchetypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ArchetypeRegistry {
            archetypes: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in interactive objects
    ///
    /// Registers `door`, `chest`, `pickup`, `switch` and `portal` with
    /// hooks that do nothing beyond the shared behavior.
    pub fn with_standard() -> Self {
        let mut registry = Self::new();
        let standard: [Box<dyn Archetype>; 5] = [
            Box::new(DoorArchetype::new()),
            Box::new(ChestArchetype::new()),
            Box::new(PickupArchetype::new()),
            Box::new(SwitchArchetype::new()),
            Box::new(PortalArchetype::new()),
        ];
        for archetype in standard {
            if let Err(err) = registry.register(archetype) {
                log::warn!("{}", err);
            }
        }
        registry
    }

    /// Register an archetype
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyRegistered`] when the name is taken
    /// - [`RegistryError::IncompatibleVersion`] when the archetype targets
    ///   another API version
    pub fn register(&mut self, archetype: Box<dyn Archetype>) -> Result<(), RegistryError> {
        let name = archetype.name().to_string();
        let key = name.to_ascii_lowercase();

        if self.archetypes.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        let api_version = archetype.api_version();
        if !is_version_compatible(api_version, ARCHETYPE_API_VERSION) {
            return Err(RegistryError::IncompatibleVersion {
                name,
                found: api_version.to_string(),
                expected: ARCHETYPE_API_VERSION.to_string(),
            });
        }

        log::debug!("registered archetype '{}' v{}", name, archetype.version());
        self.archetypes.insert(key, archetype);
        Ok(())
    }

    /// Replace an archetype of the same name, or register it
    pub fn replace(&mut self, archetype: Box<dyn Archetype>) -> Result<(), RegistryError> {
        self.archetypes
            .remove(&archetype.name().to_ascii_lowercase());
        self.register(archetype)
    }

    /// Whether an archetype is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.archetypes.contains_key(&name.to_ascii_lowercase())
    }

    /// Archetype registered under `name`
    pub fn get(&self, name: &str) -> Option<&dyn Archetype> {
        self.archetypes
            .get(&name.to_ascii_lowercase())
            .map(|a| a.as_ref())
    }

    /// Number of registered archetypes
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.archetypes.values().map(|a| a.name()).collect();
        names.sort_unstable();
        names
    }

    /// Archetypes that build `name`, root first
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownArchetype`] when `name` is not registered
    /// - [`RegistryError::MissingParent`] when an `extends` link dangles
    /// - [`RegistryError::CircularInheritance`] when the links loop
    pub fn lineage(&self, name: &str) -> Result<Vec<&dyn Archetype>, RegistryError> {
        let mut current = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownArchetype(name.to_string()))?;
        let mut visited = HashSet::new();
        let mut chain = Vec::new();

        loop {
            if !visited.insert(current.name().to_ascii_lowercase()) {
                return Err(RegistryError::CircularInheritance(name.to_string()));
            }
            chain.push(current);
            match current.extends() {
                None => break,
                Some(parent) => {
                    current = self.get(parent).ok_or_else(|| RegistryError::MissingParent {
                        name: current.name().to_string(),
                        parent: parent.to_string(),
                    })?;
                }
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Run the lineage of `type_name` against `entity`
    ///
    /// # Errors
    ///
    /// Any lineage error, or [`RegistryError::BuildFailed`] with the first
    /// archetype that rejected its properties. Archetypes earlier in the
    /// lineage keep what they added.
    pub fn build(
        &self,
        ctx: &mut SystemContext<'_>,
        entity: Entity,
        type_name: &str,
        props: &Properties,
    ) -> Result<(), RegistryError> {
        for archetype in self.lineage(type_name)? {
            archetype
                .build(ctx, entity, props)
                .map_err(|reason| RegistryError::BuildFailed {
                    name: archetype.name().to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if an archetype API version is compatible with the runtime API version
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For versions >= 1.0.0: archetype minor version must be <= runtime minor version
/// - For 0.x.y versions: minor version must match exactly (0.x versions are unstable)
fn is_version_compatible(archetype_version: &str, runtime_version: &str) -> bool {
    let (Ok(archetype_ver), Ok(runtime_ver)) = (
        Version::parse(archetype_version),
        Version::parse(runtime_version),
    ) else {
        return false;
    };

    if archetype_ver.major != runtime_ver.major {
        return false;
    }

    if archetype_ver.major != 0 {
        archetype_ver.minor <= runtime_ver.minor
    } else {
        archetype_ver.minor == runtime_ver.minor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::FnArchetype;
    use crate::config::RuntimeConfig;
    use crate::ecs::components::HealthComponent;
    use crate::ecs::World;
    use crate::events::EventBus;
    use crate::render::RenderScheduler;
    use rstest::rstest;

    struct Legacy;

    impl Archetype for Legacy {
        fn name(&self) -> &str {
            "legacy"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn api_version(&self) -> &str {
            "1.0.0"
        }

        fn build(
            &self,
            _ctx: &mut SystemContext<'_>,
            _entity: Entity,
            _props: &Properties,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    fn noop(name: &str) -> Box<dyn Archetype> {
        Box::new(FnArchetype::new(name, |_, _, _| Ok(())))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ArchetypeRegistry::new();
        assert!(registry.is_empty());
        registry.register(noop("Enemy")).unwrap();

        assert!(registry.contains("enemy"));
        assert!(registry.contains("ENEMY"));
        assert_eq!(registry.get("enemy").map(|a| a.name()), Some("Enemy"));
        assert_eq!(
            registry.register(noop("enemy")),
            Err(RegistryError::AlreadyRegistered("enemy".to_string()))
        );
        assert!(registry.replace(noop("enemy")).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_incompatible_api_version() {
        let mut registry = ArchetypeRegistry::new();
        let result = registry.register(Box::new(Legacy));
        assert!(matches!(
            result,
            Err(RegistryError::IncompatibleVersion { ref name, .. }) if name == "legacy"
        ));
    }

    #[rstest]
    #[case("0.1.0", "0.1.0", true)]
    #[case("0.1.5", "0.1.0", true)]
    #[case("0.2.0", "0.1.0", false)]
    #[case("1.0.0", "1.2.0", true)]
    #[case("1.3.0", "1.2.0", false)]
    #[case("2.0.0", "1.0.0", false)]
    #[case("invalid", "0.1.0", false)]
    fn test_version_compatibility(
        #[case] archetype: &str,
        #[case] runtime: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_version_compatible(archetype, runtime), expected);
    }

    #[test]
    fn test_lineage_is_root_first() {
        let mut registry = ArchetypeRegistry::new();
        registry
            .register(Box::new(FnArchetype::new("boss", |_, _, _| Ok(())).extending("enemy")))
            .unwrap();
        registry.register(noop("enemy")).unwrap();

        let names: Vec<&str> = registry
            .lineage("boss")
            .unwrap()
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["enemy", "boss"]);
    }

    #[test]
    fn test_lineage_errors() {
        let mut registry = ArchetypeRegistry::new();
        registry
            .register(Box::new(FnArchetype::new("a", |_, _, _| Ok(())).extending("b")))
            .unwrap();
        assert!(matches!(
            registry.lineage("a"),
            Err(RegistryError::MissingParent { ref parent, .. }) if parent == "b"
        ));

        registry
            .register(Box::new(FnArchetype::new("b", |_, _, _| Ok(())).extending("a")))
            .unwrap();
        assert!(matches!(
            registry.lineage("a"),
            Err(RegistryError::CircularInheritance(_))
        ));
        assert!(matches!(
            registry.lineage("zzz"),
            Err(RegistryError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn test_build_runs_lineage() {
        let mut registry = ArchetypeRegistry::new();
        registry
            .register(Box::new(FnArchetype::new("enemy", |ctx, entity, props| {
                ctx.add_component(entity, HealthComponent::new(props.get_i32("health", 5)));
                Ok(())
            })))
            .unwrap();
        registry
            .register(Box::new(
                FnArchetype::new("boss", |ctx, entity, _| {
                    match ctx.world_mut().component_mut::<HealthComponent>(entity) {
                        Some(health) => {
                            health.take_damage(1);
                            Ok(())
                        }
                        None => Err("enemy base missing".to_string()),
                    }
                })
                .extending("enemy"),
            ))
            .unwrap();

        let mut world = World::new();
        let mut renderer = RenderScheduler::new();
        let events = EventBus::new();
        let config = RuntimeConfig::default();
        let mut ctx = SystemContext::new(&mut world, &mut renderer, &events, &config);
        let entity = ctx.spawn(&Properties::new());
        let props = Properties::new().with("health", 20);

        registry.build(&mut ctx, entity, "Boss", &props).unwrap();
        let health = world.component::<HealthComponent>(entity).unwrap();
        assert_eq!((health.current(), health.max()), (19, 20));
    }

    #[test]
    fn test_build_failure_names_archetype() {
        let mut registry = ArchetypeRegistry::new();
        registry
            .register(Box::new(FnArchetype::new("fragile", |_, _, _| {
                Err("missing lootTable".to_string())
            })))
            .unwrap();

        let mut world = World::new();
        let mut renderer = RenderScheduler::new();
        let events = EventBus::new();
        let config = RuntimeConfig::default();
        let mut ctx = SystemContext::new(&mut world, &mut renderer, &events, &config);
        let entity = ctx.spawn(&Properties::new());
        assert_eq!(
            registry.build(&mut ctx, entity, "fragile", &Properties::new()),
            Err(RegistryError::BuildFailed {
                name: "fragile".to_string(),
                reason: "missing lootTable".to_string(),
            })
        );
    }

    #[test]
    fn test_standard_archetypes() {
        let registry = ArchetypeRegistry::with_standard();
        assert_eq!(
            registry.names(),
            vec!["chest", "door", "pickup", "portal", "switch"]
        );
    }
}
