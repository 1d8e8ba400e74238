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
//! Render layers
//!
//! A layer is a named bucket of drawables with a depth. Layers are drawn
//! in ascending depth; layers sharing a depth keep their registration
//! order. The runtime registers the standard layers below on construction,
//! in this order, so their [`LayerId`]s are fixed constants.

use std::fmt;

/// Handle to a layer registered with a render scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub(crate) u32);

impl LayerId {
    /// Position of the layer in the scheduler's registration list
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layer({})", self.0)
    }
}

/// A named draw bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderLayer {
    name: String,
    depth: i32,
}

impl RenderLayer {
    /// Create a new layer description
    pub fn new(name: impl Into<String>, depth: i32) -> Self {
        RenderLayer {
            name: name.into(),
            depth,
        }
    }

    /// Layer name as written in level files
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layer depth; lower depths draw first
    pub fn depth(&self) -> i32 {
        self.depth
    }
}

/// Standard layers registered by every scheduler, back to front
pub mod layers {
    use super::LayerId;

    /// Distant scrolling backdrop
    pub const PARALLAX_BACKGROUND: LayerId = LayerId(0);
    /// Floor tiles
    pub const WORLD_BACKGROUND: LayerId = LayerId(1);
    /// Objects lying on the floor, shadows, and the fallback layer
    pub const GAMEPLAY_BELOW: LayerId = LayerId(2);
    /// Player, NPCs and enemies
    pub const CHARACTERS: LayerId = LayerId(3);
    /// Objects drawn over characters
    pub const GAMEPLAY_ABOVE: LayerId = LayerId(4);
    /// Bullets and thrown items
    pub const PROJECTILES: LayerId = LayerId(5);
    /// Particle effects
    pub const PARTICLES: LayerId = LayerId(6);
    /// Tree tops, roofs and other overhangs
    pub const WORLD_FOREGROUND: LayerId = LayerId(7);
    /// Darkness and light sources
    pub const LIGHTING: LayerId = LayerId(8);
    /// Heads-up display
    pub const UI: LayerId = LayerId(9);
    /// Speech bubbles and notifications, above everything else
    pub const POPUPS: LayerId = LayerId(10);

    /// Layer used when an unknown layer name is requested
    pub const FALLBACK: LayerId = GAMEPLAY_BELOW;

    /// Names and depths of the standard layers, indexed by their ids
    pub(crate) const STANDARD: [(&str, i32); 11] = [
        ("PARALLAX_BACKGROUND", 0),
        ("WORLD_BACKGROUND", 10),
        ("GAMEPLAY_BELOW", 20),
        ("CHARACTERS", 30),
        ("GAMEPLAY_ABOVE", 40),
        ("PROJECTILES", 50),
        ("PARTICLES", 60),
        ("WORLD_FOREGROUND", 70),
        ("LIGHTING", 80),
        ("UI", 90),
        ("POPUPS", 100),
    ];
}
