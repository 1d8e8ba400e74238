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
//! Interaction zones
//!
//! A zone is a circle or rectangle that follows its owning entity. Circles
//! are centered on the owner's center; rectangles hang off the owner's
//! position at a fixed offset. Both are tested against a single point,
//! normally the center of a target's visual bounds.

use crate::ecs::EntityRecord;
use crate::geometry::Vec2;
use std::fmt;
use std::str::FromStr;

/// Type tag carried by a zone and by its enter/exit events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    /// Enemies start chasing
    Aggro,
    /// Enemies can hit
    Attack,
    /// A conversation or prompt becomes available
    Dialogue,
    /// Generic trigger area
    Trigger,
    /// Game-defined tag
    Custom(String),
}

impl ZoneKind {
    /// Name as written in level files
    pub fn as_str(&self) -> &str {
        match self {
            ZoneKind::Aggro => "AGGRO",
            ZoneKind::Attack => "ATTACK",
            ZoneKind::Dialogue => "DIALOGUE",
            ZoneKind::Trigger => "TRIGGER",
            ZoneKind::Custom(name) => name,
        }
    }

    /// Parse a tag, ignoring case; unknown tags become [`ZoneKind::Custom`]
    pub fn parse(tag: &str) -> ZoneKind {
        match tag.trim().to_ascii_uppercase().as_str() {
            "AGGRO" => ZoneKind::Aggro,
            "ATTACK" => ZoneKind::Attack,
            "DIALOGUE" => ZoneKind::Dialogue,
            "TRIGGER" => ZoneKind::Trigger,
            _ => ZoneKind::Custom(tag.trim().to_string()),
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ZoneKind::parse(s))
    }
}

/// Index of a zone within its tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub(crate) u32);

impl ZoneId {
    /// Position of the zone in its tracker
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Zone geometry relative to the owner
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneShape {
    /// Circle centered on the owner's center
    Circle {
        /// Radius in pixels
        radius: f64,
    },
    /// Rectangle whose top-left corner sits at the owner's position plus
    /// an offset
    Rect {
        /// Width in pixels
        width: f64,
        /// Height in pixels
        height: f64,
        /// Horizontal offset from the owner's position
        offset_x: f64,
        /// Vertical offset from the owner's position
        offset_y: f64,
    },
}

impl ZoneShape {
    /// Circle of the given radius
    pub fn circle(radius: f64) -> Self {
        ZoneShape::Circle { radius }
    }

    /// Rectangle anchored at the owner's position
    pub fn rect(width: f64, height: f64) -> Self {
        ZoneShape::rect_at(width, height, 0.0, 0.0)
    }

    /// Rectangle anchored at an offset from the owner's position
    pub fn rect_at(width: f64, height: f64, offset_x: f64, offset_y: f64) -> Self {
        ZoneShape::Rect {
            width,
            height,
            offset_x,
            offset_y,
        }
    }
}

/// A zone placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionZone {
    id: ZoneId,
    kind: ZoneKind,
    shape: ZoneShape,
    /// Circle center, or rectangle top-left corner, in world space
    anchor: Vec2,
}

impl InteractionZone {
    pub(crate) fn new(id: ZoneId, kind: ZoneKind, shape: ZoneShape) -> Self {
        InteractionZone {
            id,
            kind,
            shape,
            anchor: Vec2::ZERO,
        }
    }

    /// Zone handle
    pub fn id(&self) -> ZoneId {
        self.id
    }

    /// Type tag
    pub fn kind(&self) -> &ZoneKind {
        &self.kind
    }

    /// Geometry relative to the owner
    pub fn shape(&self) -> ZoneShape {
        self.shape
    }

    /// Circle center or rectangle corner as of the last reposition
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Move the zone to follow its owner
    pub fn reposition(&mut self, owner: &EntityRecord) {
        self.anchor = match self.shape {
            ZoneShape::Circle { .. } => owner.center(),
            ZoneShape::Rect {
                offset_x, offset_y, ..
            } => Vec2::new(
                owner.pixel_x() as f64 + offset_x,
                owner.pixel_y() as f64 + offset_y,
            ),
        };
    }

    /// Containment test against the zone's current placement
    ///
    /// Circles include their boundary; rectangles are half-open.
    pub fn contains(&self, point: Vec2) -> bool {
        match self.shape {
            ZoneShape::Circle { radius } => self.anchor.distance_squared(point) <= radius * radius,
            ZoneShape::Rect { width, height, .. } => {
                point.x >= self.anchor.x
                    && point.x < self.anchor.x + width
                    && point.y >= self.anchor.y
                    && point.y < self.anchor.y + height
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_at(x: f64, y: f64) -> EntityRecord {
        EntityRecord::new("", x, y, 16, 16)
    }

    #[test]
    fn test_zone_kind_parsing() {
        assert_eq!(ZoneKind::parse("aggro"), ZoneKind::Aggro);
        assert_eq!(ZoneKind::parse("Dialogue"), ZoneKind::Dialogue);
        assert_eq!(ZoneKind::parse("shop"), ZoneKind::Custom("shop".to_string()));
        assert_eq!("TRIGGER".parse::<ZoneKind>(), Ok(ZoneKind::Trigger));
        assert_eq!(ZoneKind::Attack.to_string(), "ATTACK");
    }

    #[test]
    fn test_circle_follows_owner_center() {
        let mut zone = InteractionZone::new(ZoneId(0), ZoneKind::Aggro, ZoneShape::circle(10.0));
        zone.reposition(&owner_at(100.0, 100.0));
        assert_eq!(zone.anchor(), Vec2::new(108.0, 108.0));

        assert!(zone.contains(Vec2::new(118.0, 108.0)));
        assert!(!zone.contains(Vec2::new(118.1, 108.0)));

        zone.reposition(&owner_at(0.0, 0.0));
        assert!(!zone.contains(Vec2::new(118.0, 108.0)));
    }

    #[test]
    fn test_rect_is_half_open() {
        let mut zone = InteractionZone::new(
            ZoneId(0),
            ZoneKind::Trigger,
            ZoneShape::rect_at(20.0, 10.0, -2.0, 16.0),
        );
        zone.reposition(&owner_at(50.0, 50.0));
        assert_eq!(zone.anchor(), Vec2::new(48.0, 66.0));
        assert!(zone.contains(Vec2::new(48.0, 66.0)));
        assert!(zone.contains(Vec2::new(67.9, 75.9)));
        assert!(!zone.contains(Vec2::new(68.0, 70.0)));
        assert!(!zone.contains(Vec2::new(60.0, 76.0)));
    }
}
