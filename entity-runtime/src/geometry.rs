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
//! Plane geometry shared by collision, interaction zones and rendering
//!
//! World positions are fractional (`f64`) so movement can accumulate
//! sub-pixel steps, while everything that is tested for overlap or drawn
//! works on whole pixels. [`Rect`] is the pixel-space rectangle, half-open
//! on both axes: a rectangle at `x` with width `w` covers `x..x + w`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point or displacement in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component, growing to the right
    pub x: f64,
    /// Vertical component, growing downwards
    pub y: f64,
}

impl Vec2 {
    /// The origin
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Squared euclidean distance to another point
    pub fn distance_squared(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Vec2) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer axis-aligned rectangle, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive)
    pub x: i32,
    /// Top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect { x, y, width, height }
    }

    /// A rectangle with no area covers no points and overlaps nothing
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive), widened so it cannot overflow
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive), widened so it cannot overflow
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Check whether two rectangles share at least one pixel
    ///
    /// Rectangles that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (self.x as i64) < other.right()
            && (other.x as i64) < self.right()
            && (self.y as i64) < other.bottom()
            && (other.y as i64) < self.bottom()
    }

    /// Check whether a world-space point lies inside the rectangle
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x as f64
            && point.x < self.right() as f64
            && point.y >= self.y as f64
            && point.y < self.bottom() as f64
    }

    /// Center of the rectangle
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Collision rectangle expressed relative to its owner's position
///
/// A hit mask lets an entity collide with only part of its visual bounds,
/// for example the feet of a tall character sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HitMask {
    /// Horizontal offset from the owner's position
    pub offset_x: i32,
    /// Vertical offset from the owner's position
    pub offset_y: i32,
    /// Mask width in pixels
    pub width: u32,
    /// Mask height in pixels
    pub height: u32,
}

impl HitMask {
    /// Create a mask with an explicit offset and size
    pub const fn new(offset_x: i32, offset_y: i32, width: u32, height: u32) -> Self {
        HitMask {
            offset_x,
            offset_y,
            width,
            height,
        }
    }

    /// Mask covering the full visual bounds of an entity
    pub const fn full(width: u32, height: u32) -> Self {
        HitMask::new(0, 0, width, height)
    }

    /// Place the mask at an owner's pixel position
    pub fn at(&self, owner_x: i32, owner_y: i32) -> Rect {
        Rect::new(
            owner_x.saturating_add(self.offset_x),
            owner_y.saturating_add(self.offset_y),
            self.width,
            self.height,
        )
    }

    /// Check whether the mask has no area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
