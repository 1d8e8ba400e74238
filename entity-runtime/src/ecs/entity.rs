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
//! Entity handles
//!
//! An [`Entity`] is a copyable, generational handle into a [`World`]'s
//! arena. When an entity is removed its slot may be reused, but the slot's
//! generation is bumped first, so handles held by components, zones or the
//! render scheduler resolve to "absent" rather than to the newcomer.
//!
//! [`World`]: crate::ecs::World

use std::fmt;

/// Generational handle to an entity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Create a handle from a slot index and generation
    pub fn new(index: u32, generation: u32) -> Self {
        Entity { index, generation }
    }

    /// Arena slot this handle points at
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when the handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack the handle into a single integer, e.g. for logging or hashing
    pub fn to_bits(&self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Inverse of [`Entity::to_bits`]
    pub fn from_bits(bits: u64) -> Self {
        Entity {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}
