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
//! Built-in frame passes
//!
//! A scene schedules these three systems by default. Together they give a
//! frame its fixed shape: every live entity updates, then every colliding
//! pair is notified, then destroyed entities are swept.

use crate::collision;
use crate::ecs::{System, SystemContext};

/// Runs the `update` hook of every live entity's components
///
/// Entities are visited in spawn order. The pass walks the world by index,
/// so an entity spawned by an earlier entity's update is updated in the
/// same pass. After an entity's components have run, its children are
/// moved to follow it.
#[derive(Debug, Default)]
pub struct EntityUpdateSystem;

impl System for EntityUpdateSystem {
    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        let mut index = 0;
        while let Some(entity) = ctx.world().entity_at(index) {
            index += 1;
            if !ctx.world().is_alive(entity) {
                continue;
            }
            ctx.dispatch(entity, |component, ctx| component.update(ctx));
            ctx.world_mut().sync_children(entity);
        }
    }

    fn name(&self) -> &str {
        "EntityUpdateSystem"
    }
}

/// Notifies both members of every colliding pair
///
/// Pairs are gathered once, after all updates. Before each notification
/// both members are checked again, so an entity destroyed by an earlier
/// collision hook receives no further notifications this frame.
#[derive(Debug, Default)]
pub struct CollisionSystem;

impl System for CollisionSystem {
    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        let pairs = collision::colliding_pairs(ctx.world());
        log::trace!("{} colliding pairs", pairs.len());
        for (a, b) in pairs {
            if !(ctx.world().is_alive(a) && ctx.world().is_alive(b)) {
                continue;
            }
            ctx.dispatch(a, |component, ctx| component.on_collision(ctx, b));
            if !(ctx.world().is_alive(a) && ctx.world().is_alive(b)) {
                continue;
            }
            ctx.dispatch(b, |component, ctx| component.on_collision(ctx, a));
        }
    }

    fn name(&self) -> &str {
        "CollisionSystem"
    }
}

/// Removes destroyed entities that are not protected from cleanup
#[derive(Debug, Default)]
pub struct CleanupSystem;

impl System for CleanupSystem {
    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        for entity in ctx.world_mut().cleanup() {
            ctx.renderer_mut().unregister_owner(entity);
        }
    }

    fn name(&self) -> &str {
        "CleanupSystem"
    }
}
