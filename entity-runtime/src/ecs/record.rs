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
//! Entity records
//!
//! An [`EntityRecord`] holds everything the runtime knows about one entity:
//! where it is, how big it is, what it collides with, where it draws, who
//! its parent and children are, and which components it owns. Records live
//! in the [`World`] arena and are reached through [`Entity`] handles.
//!
//! Position setters that would break the parent/child invariant are only
//! reachable through [`World`], which propagates moves to children.
//!
//! [`World`]: crate::ecs::World

use crate::collision::CollisionType;
use crate::ecs::{Component, ComponentSet, Entity};
use crate::geometry::{HitMask, Rect, Vec2};
use crate::render::{layers, Color, LayerId, SpriteId, Surface};

/// State of a single entity
#[derive(Debug)]
pub struct EntityRecord {
    pub(crate) position: Vec2,
    width: u32,
    height: u32,
    mask: HitMask,
    collision: CollisionType,
    pub(crate) layer: LayerId,
    destroyed: bool,
    hidden: bool,
    name: String,
    protected: bool,
    sprite: Option<SpriteId>,
    pub(crate) parent: Option<Entity>,
    pub(crate) children: Vec<Entity>,
    pub(crate) local_offset: Vec2,
    pub(crate) components: ComponentSet,
}

impl EntityRecord {
    /// Create a record with a full-size hit mask, trigger collision and the
    /// fallback render layer
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: u32, height: u32) -> Self {
        EntityRecord {
            position: Vec2::new(x, y),
            width,
            height,
            mask: HitMask::full(width, height),
            collision: CollisionType::default(),
            layer: layers::FALLBACK,
            destroyed: false,
            hidden: false,
            name: name.into(),
            protected: false,
            sprite: None,
            parent: None,
            children: Vec::new(),
            local_offset: Vec2::ZERO,
            components: ComponentSet::new(),
        }
    }

    /// Set the collision classification
    pub fn with_collision(mut self, collision: CollisionType) -> Self {
        self.collision = collision;
        self
    }

    /// Set the hit mask
    pub fn with_mask(mut self, mask: HitMask) -> Self {
        self.mask = mask;
        self
    }

    /// Set the render layer used when the record is spawned
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }

    /// Set the sprite drawn by the default draw
    pub fn with_sprite(mut self, sprite: SpriteId) -> Self {
        self.sprite = Some(sprite);
        self
    }

    /// Keep the record through cleanup even once destroyed
    pub fn with_protection(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    /// World position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Horizontal world position
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Vertical world position
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Horizontal position truncated to whole pixels
    pub fn pixel_x(&self) -> i32 {
        self.position.x as i32
    }

    /// Vertical position truncated to whole pixels
    pub fn pixel_y(&self) -> i32 {
        self.position.y as i32
    }

    /// Visual width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Visual height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Visual bounds in pixel space
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pixel_x(), self.pixel_y(), self.width, self.height)
    }

    /// Center of the visual bounds
    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Hit mask relative to the position
    pub fn mask(&self) -> HitMask {
        self.mask
    }

    /// Replace the hit mask
    pub fn set_mask(&mut self, mask: HitMask) {
        self.mask = mask;
    }

    /// Hit mask placed in pixel space
    pub fn hit_rect(&self) -> Rect {
        self.mask.at(self.pixel_x(), self.pixel_y())
    }

    /// Center of the hit mask
    pub fn mask_center(&self) -> Vec2 {
        self.hit_rect().center()
    }

    /// Collision classification
    pub fn collision_type(&self) -> CollisionType {
        self.collision
    }

    /// Change the collision classification
    pub fn set_collision_type(&mut self, collision: CollisionType) {
        self.collision = collision;
    }

    /// Layer the entity draws on
    pub fn render_layer(&self) -> LayerId {
        self.layer
    }

    /// Sort key within the render layer: the bottom edge of the bounds
    pub fn depth_key(&self) -> i32 {
        self.pixel_y().saturating_add(self.height as i32)
    }

    /// Whether the entity has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) -> bool {
        let changed = !self.destroyed;
        self.destroyed = true;
        changed
    }

    /// Whether the entity is drawn this frame
    pub fn is_visible(&self) -> bool {
        !self.destroyed && !self.hidden
    }

    /// Hide or show the entity without unregistering it
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Name given by the level file; not unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether cleanup skips this record once destroyed
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Change cleanup protection
    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    /// Sprite drawn by the default draw
    pub fn sprite(&self) -> Option<SpriteId> {
        self.sprite
    }

    /// Change or clear the sprite
    pub fn set_sprite(&mut self, sprite: Option<SpriteId>) {
        self.sprite = sprite;
    }

    /// Parent entity, if attached
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Attached children in attachment order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Offset from the parent's position; zero when unattached
    pub fn local_offset(&self) -> Vec2 {
        self.local_offset
    }

    /// Components owned by this entity
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// Typed component access
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// Typed mutable component access
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    /// Check for a component
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.has::<T>()
    }

    /// Default draw: sprite, then component draw hooks, then the optional
    /// hit-mask outline
    pub fn draw(&self, surface: &mut dyn Surface, debug_masks: bool) {
        if let Some(sprite) = self.sprite {
            surface.draw_sprite(sprite, self.pixel_x(), self.pixel_y());
        }
        for (_, component) in self.components.iter() {
            component.draw(self, surface);
        }
        if debug_masks && !self.mask.is_empty() {
            surface.stroke_rect(self.hit_rect(), Color::DEBUG_MASK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CommandBuffer, DrawCommand};

    #[test]
    fn test_defaults() {
        let record = EntityRecord::new("crate", 10.0, 20.0, 16, 24);
        assert_eq!(record.mask(), HitMask::full(16, 24));
        assert_eq!(record.collision_type(), CollisionType::Trigger);
        assert_eq!(record.render_layer(), layers::GAMEPLAY_BELOW);
        assert!(record.is_visible());
        assert!(!record.is_protected());
        assert_eq!(record.parent(), None);
    }

    #[test]
    fn test_positions_truncate_to_pixels() {
        let record = EntityRecord::new("", 10.9, -3.7, 16, 16);
        assert_eq!(record.pixel_x(), 10);
        assert_eq!(record.pixel_y(), -3);
        assert_eq!(record.bounds(), Rect::new(10, -3, 16, 16));
        assert_eq!(record.center(), Vec2::new(18.0, 5.0));
    }

    #[test]
    fn test_hit_rect_and_depth() {
        let record = EntityRecord::new("", 100.0, 50.0, 16, 32)
            .with_mask(HitMask::new(2, 20, 12, 12));
        assert_eq!(record.hit_rect(), Rect::new(102, 70, 12, 12));
        assert_eq!(record.mask_center(), Vec2::new(108.0, 76.0));
        assert_eq!(record.depth_key(), 82);
    }

    #[test]
    fn test_destroy_and_hide_affect_visibility() {
        let mut record = EntityRecord::new("", 0.0, 0.0, 16, 16);
        record.set_hidden(true);
        assert!(!record.is_visible());
        record.set_hidden(false);
        assert!(record.mark_destroyed());
        assert!(!record.mark_destroyed());
        assert!(!record.is_visible());
    }

    #[test]
    fn test_default_draw() {
        let record = EntityRecord::new("", 4.0, 8.0, 16, 16).with_sprite(SpriteId(5));
        let mut surface = CommandBuffer::new();
        record.draw(&mut surface, false);
        assert_eq!(
            surface.commands(),
            &[DrawCommand::Sprite { sprite: SpriteId(5), x: 4, y: 8 }]
        );

        surface.clear();
        record.draw(&mut surface, true);
        assert_eq!(surface.len(), 2);
    }
}
