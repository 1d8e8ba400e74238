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
//! # Entity Runtime
//!
//! A single-threaded runtime for 2D games built from entities and
//! components, driven one frame at a time.
//!
//! ## Features
//!
//! - **Entities and components**: generational handles into a [`World`]
//!   arena, with behavior attached as [`ecs::Component`]s
//! - **Collision**: hit masks gated by a [`collision::CollisionType`]
//! - **Interaction zones**: circles and rectangles that report targets
//!   entering and leaving them
//! - **Layered rendering**: producers drawn by layer, then by depth key,
//!   onto any [`render::Surface`]
//! - **Events**: a synchronous publish/subscribe [`events::EventBus`]
//! - **Archetypes**: doors, chests, pickups, switches and portals built from
//!   level properties, with hooks for game-specific rules
//!
//! ## Example
//!
//! ```rust
//! use entity_runtime::config::RuntimeConfig;
//! use entity_runtime::events::{EngineEvent, EventKind};
//! use entity_runtime::interaction::{InteractionComponent, ZoneKind, ZoneShape};
//! use entity_runtime::properties::Properties;
//! use entity_runtime::Scene;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut scene = Scene::new(RuntimeConfig::default());
//! let guard = scene.spawn(&Properties::new().with("name", "guard"));
//! let player = scene.spawn(&Properties::new().with("name", "player").with("x", 200));
//! scene.add_component(
//!     guard,
//!     InteractionComponent::new()
//!         .with_zone(ZoneKind::Aggro, ZoneShape::circle(80.0))
//!         .tracking(player),
//! );
//!
//! let alerts = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&alerts);
//! scene.events().subscribe(EventKind::TargetEnteredZone, move |_, _| {
//!     seen.set(seen.get() + 1)
//! });
//!
//! scene.tick();
//! scene.set_position(player, 40.0, 0.0);
//! scene.tick();
//! assert_eq!(alerts.get(), 1);
//! ```

#![warn(missing_docs)]

/// Archetypes: named recipes that turn level objects into entities
pub mod archetypes;

/// Collision classification and the overlap predicate
pub mod collision;

/// Runtime configuration
pub mod config;

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Publish/subscribe event bus
pub mod events;

/// Points, rectangles and hit masks
pub mod geometry;

/// Interaction zones and the zone tracker component
pub mod interaction;

/// Logger initialisation
pub mod logging;

/// Saving and restoring scene state
pub mod persistence;

/// Level object property bags
pub mod properties;

/// Layered render scheduling
pub mod render;

/// The scene that owns and drives everything else
pub mod scene;

pub use ecs::{Component, Entity, World};
pub use events::{EngineEvent, EventBus, EventKind};
pub use scene::Scene;
