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
//! Collision classification and the overlap predicate
//!
//! Collision is discrete and axis-aligned: once per tick, after every
//! entity has updated, hit masks are compared as whole-pixel rectangles.
//! Nothing here resolves penetration; components decide what an overlap
//! means through their `on_collision` hook.

use crate::ecs::{Entity, EntityRecord, World};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an entity takes part in collision tests
///
/// Level files spell the variants in upper snake case (`CHARACTER_SOLID`).
/// Apart from [`CollisionType::NoCollision`], the classification does not
/// change what [`is_colliding`] returns; it tells components how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollisionType {
    /// Never collides with anything
    NoCollision,
    /// Blocks movement
    Solid,
    /// Reports overlap without blocking
    #[default]
    Trigger,
    /// A character that blocks movement
    CharacterSolid,
    /// A character that reports overlap without blocking
    CharacterTrigger,
    /// Hurts whatever it overlaps
    DamageSource,
}

impl CollisionType {
    /// All classifications in declaration order
    pub const ALL: [CollisionType; 6] = [
        CollisionType::NoCollision,
        CollisionType::Solid,
        CollisionType::Trigger,
        CollisionType::CharacterSolid,
        CollisionType::CharacterTrigger,
        CollisionType::DamageSource,
    ];

    /// Name as written in level files
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionType::NoCollision => "NO_COLLISION",
            CollisionType::Solid => "SOLID",
            CollisionType::Trigger => "TRIGGER",
            CollisionType::CharacterSolid => "CHARACTER_SOLID",
            CollisionType::CharacterTrigger => "CHARACTER_TRIGGER",
            CollisionType::DamageSource => "DAMAGE_SOURCE",
        }
    }

    /// Whether this classification opts out of collision entirely
    pub fn is_none(&self) -> bool {
        matches!(self, CollisionType::NoCollision)
    }

    /// Whether this classification blocks movement
    pub fn is_blocking(&self) -> bool {
        matches!(self, CollisionType::Solid | CollisionType::CharacterSolid)
    }
}

impl fmt::Display for CollisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionType {
    type Err = String;

    /// Parse a level-file name, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CollisionType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown collision type '{}'", s))
    }
}

/// Decide whether two entities' hit masks overlap
///
/// Returns `false` when either entity is destroyed or classified
/// [`CollisionType::NoCollision`]. Otherwise each mask is placed at its
/// owner's truncated position and the two half-open rectangles are tested
/// for a shared pixel. Masks with no area never collide. The predicate is
/// symmetric; testing an entity against itself is the caller's concern.
pub fn is_colliding(a: &EntityRecord, b: &EntityRecord) -> bool {
    if a.is_destroyed() || b.is_destroyed() {
        return false;
    }
    if a.collision_type().is_none() || b.collision_type().is_none() {
        return false;
    }
    a.hit_rect().intersects(&b.hit_rect())
}

/// Every colliding pair of live entities, in spawn order
///
/// Each unordered pair appears once, with the earlier-spawned entity first.
pub fn colliding_pairs(world: &World) -> Vec<(Entity, Entity)> {
    let candidates: Vec<(Entity, &EntityRecord)> = world
        .iter()
        .filter(|(_, r)| !r.is_destroyed() && !r.collision_type().is_none() && !r.mask().is_empty())
        .collect();

    let mut pairs = Vec::new();
    for (i, (a, ra)) in candidates.iter().enumerate() {
        let rect_a = ra.hit_rect();
        for (b, rb) in &candidates[i + 1..] {
            if rect_a.intersects(&rb.hit_rect()) {
                pairs.push((*a, *b));
            }
        }
    }
    pairs
}
