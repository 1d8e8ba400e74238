//! Entity Component System (ECS) core implementation
//!
//! This module provides the entity/component composition model:
//! - Generational entity handles and the [`World`] arena that owns records
//! - Components keyed by concrete type, with lifecycle hooks
//! - Scoped contexts handing out the world, renderer and event bus
//! - Staged system execution and the built-in frame passes

mod component;
mod context;
mod entity;
mod record;
mod system;
mod world;

pub mod components;
pub mod scheduler;
pub mod systems;

pub use component::{Component, ComponentDrawable, ComponentKind, ComponentSet};
pub use context::{ComponentContext, SystemContext};
pub use entity::Entity;
pub use record::EntityRecord;
pub use system::System;
pub use world::World;
