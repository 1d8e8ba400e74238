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
//! Built-in components
//!
//! General purpose components that most games built on the runtime need:
//! hit points, a drop shadow drawn beneath the owner, and a text prompt
//! shown while something stands in one of the owner's dialogue zones.

use crate::ecs::{Component, ComponentContext, ComponentDrawable, ComponentKind, EntityRecord};
use crate::error::StateError;
use crate::geometry::Rect;
use crate::interaction::{InteractionComponent, ZoneKind};
use crate::render::{layers, Color, DrawableKey, SpriteId, Surface};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;

/// Hit points
///
/// # Examples
///
/// ```
/// use entity_runtime::ecs::components::HealthComponent;
///
/// let mut health = HealthComponent::new(40);
/// health.take_damage(50);
/// assert_eq!(health.current(), 0);
/// assert!(health.is_dead());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthComponent {
    current: i32,
    max: i32,
}

impl HealthComponent {
    /// Create at full health
    pub fn new(max: i32) -> Self {
        HealthComponent { current: max, max }
    }

    /// Current hit points
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Maximum hit points
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Lose hit points, never going below zero
    pub fn take_damage(&mut self, amount: i32) {
        self.current = self.current.saturating_sub(amount).max(0);
    }

    /// Regain hit points, never going above the maximum
    pub fn heal(&mut self, amount: i32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Fraction of health left, `0.0` when the maximum is not positive
    pub fn percentage(&self) -> f32 {
        if self.max <= 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }

    /// Whether hit points ran out
    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

impl Component for HealthComponent {
    fn state_key(&self) -> Option<&'static str> {
        Some("health")
    }

    fn save_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn load_state(&mut self, state: &Value) -> Result<(), StateError> {
        *self = serde_json::from_value(state.clone())?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// How a shadow is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowStyle {
    /// A filled oval in translucent black
    Oval {
        /// Oval width in pixels
        width: u32,
        /// Oval height in pixels
        height: u32,
        /// Opacity between 0 and 1
        opacity: f32,
    },
    /// A prepared shadow image
    Sprite {
        /// Shadow image
        sprite: SpriteId,
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },
}

impl ShadowStyle {
    fn size(&self) -> (u32, u32) {
        match *self {
            ShadowStyle::Oval { width, height, .. } => (width, height),
            ShadowStyle::Sprite { width, height, .. } => (width, height),
        }
    }
}

/// Drop shadow drawn on `GAMEPLAY_BELOW` just under its owner
///
/// The shadow is its own render producer. It registers when attached,
/// unregisters when removed, and disappears with its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowComponent {
    style: ShadowStyle,
    y_offset: i32,
    active: bool,
}

impl ShadowComponent {
    /// Procedural oval shadow
    pub fn oval(width: u32, height: u32, opacity: f32, y_offset: i32) -> Self {
        ShadowComponent {
            style: ShadowStyle::Oval {
                width,
                height,
                opacity: opacity.clamp(0.0, 1.0),
            },
            y_offset,
            active: true,
        }
    }

    /// Shadow drawn from an image
    pub fn sprite(sprite: SpriteId, width: u32, height: u32, y_offset: i32) -> Self {
        ShadowComponent {
            style: ShadowStyle::Sprite {
                sprite,
                width,
                height,
            },
            y_offset,
            active: true,
        }
    }

    /// Drawing style
    pub fn style(&self) -> ShadowStyle {
        self.style
    }

    /// Whether the shadow is drawn
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Show or hide the shadow without removing it
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Where the shadow lands for an owner: centered horizontally and
    /// straddling the owner's base
    pub fn bounds_for(&self, owner: &EntityRecord) -> Rect {
        let (width, height) = self.style.size();
        let x = owner.pixel_x() + (owner.width() / 2) as i32 - (width / 2) as i32;
        let y = owner.pixel_y() + owner.height() as i32 - (height / 2) as i32 + self.y_offset;
        Rect::new(x, y, width, height)
    }
}

impl Component for ShadowComponent {
    fn attach(&mut self, ctx: &mut ComponentContext<'_>) {
        let key = DrawableKey::Component(ctx.owner(), ComponentKind::of::<Self>());
        ctx.renderer_mut().register(key, layers::GAMEPLAY_BELOW);
    }

    fn on_remove(&mut self, ctx: &mut ComponentContext<'_>) {
        let key = DrawableKey::Component(ctx.owner(), ComponentKind::of::<Self>());
        ctx.renderer_mut().unregister(key);
    }

    fn as_drawable(&self) -> Option<&dyn ComponentDrawable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ComponentDrawable for ShadowComponent {
    fn depth_key(&self, owner: &EntityRecord) -> i32 {
        owner.depth_key() - 1
    }

    fn is_visible(&self, owner: &EntityRecord) -> bool {
        self.active && owner.is_visible()
    }

    fn render(&self, owner: &EntityRecord, surface: &mut dyn Surface) {
        let bounds = self.bounds_for(owner);
        match self.style {
            ShadowStyle::Oval { opacity, .. } => {
                let alpha = (opacity * 255.0).round() as u8;
                surface.fill_ellipse(bounds, Color::rgba(0, 0, 0, alpha));
            }
            ShadowStyle::Sprite { sprite, .. } => {
                surface.draw_sprite(sprite, bounds.x, bounds.y);
            }
        }
    }
}

/// Text shown above the owner while a tracked target is in one of the
/// owner's dialogue zones
///
/// Reads the owner's [`InteractionComponent`]; without one the prompt never
/// shows.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionPrompt {
    text: String,
    color: Color,
}

/// Gap between the prompt baseline and the owner's top edge
const PROMPT_GAP: i32 = 4;

impl InteractionPrompt {
    /// Prompt in white
    pub fn new(text: impl Into<String>) -> Self {
        InteractionPrompt {
            text: text.into(),
            color: Color::WHITE,
        }
    }

    /// Use another text color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Prompt text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the prompt shows for this owner right now
    pub fn is_showing(&self, owner: &EntityRecord) -> bool {
        owner
            .component::<InteractionComponent>()
            .map_or(false, |zones| zones.has_occupant_in(&ZoneKind::Dialogue))
    }
}

impl Component for InteractionPrompt {
    fn draw(&self, owner: &EntityRecord, surface: &mut dyn Surface) {
        if self.is_showing(owner) {
            surface.draw_text(
                &self.text,
                owner.pixel_x(),
                owner.pixel_y() - PROMPT_GAP,
                self.color,
            );
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
