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
//! Drawing surfaces
//!
//! Producers never talk to a graphics API directly; they issue primitive
//! calls on a [`Surface`]. A windowed backend implements the trait over its
//! own canvas. [`CommandBuffer`] records the calls instead, which is what
//! headless runs and the tests use.

use crate::geometry::Rect;

/// Opaque handle to an image owned by the asset layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel, 255 is opaque
    pub a: u8,
}

impl Color {
    /// Create a color from its channels
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Opaque white
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Opaque black
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Outline color of the hit-mask debug overlay
    pub const DEBUG_MASK: Color = Color::rgba(255, 0, 0, 160);
}

/// Target of draw calls
pub trait Surface {
    /// Draw a sprite with its top-left corner at `(x, y)`
    fn draw_sprite(&mut self, sprite: SpriteId, x: i32, y: i32);

    /// Fill a rectangle
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Outline a rectangle
    fn stroke_rect(&mut self, rect: Rect, color: Color);

    /// Fill the ellipse inscribed in `bounds`
    fn fill_ellipse(&mut self, bounds: Rect, color: Color);

    /// Draw a line of text with its top-left corner at `(x, y)`
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// [`Surface::draw_sprite`]
    Sprite {
        /// Sprite handle
        sprite: SpriteId,
        /// Left edge
        x: i32,
        /// Top edge
        y: i32,
    },
    /// [`Surface::fill_rect`]
    FillRect {
        /// Filled area
        rect: Rect,
        /// Fill color
        color: Color,
    },
    /// [`Surface::stroke_rect`]
    StrokeRect {
        /// Outlined area
        rect: Rect,
        /// Line color
        color: Color,
    },
    /// [`Surface::fill_ellipse`]
    FillEllipse {
        /// Bounding box of the ellipse
        bounds: Rect,
        /// Fill color
        color: Color,
    },
    /// [`Surface::draw_text`]
    Text {
        /// Text content
        text: String,
        /// Left edge
        x: i32,
        /// Top edge
        y: i32,
        /// Text color
        color: Color,
    },
}

/// Surface that records every call in order
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands in issue order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Forget all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Take the recorded commands, leaving the buffer empty
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Sprites drawn, in draw order
    pub fn sprites(&self) -> Vec<SpriteId> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Sprite { sprite, .. } => Some(*sprite),
                _ => None,
            })
            .collect()
    }
}

impl Surface for CommandBuffer {
    fn draw_sprite(&mut self, sprite: SpriteId, x: i32, y: i32) {
        self.commands.push(DrawCommand::Sprite { sprite, x, y });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::StrokeRect { rect, color });
    }

    fn fill_ellipse(&mut self, bounds: Rect, color: Color) {
        self.commands.push(DrawCommand::FillEllipse { bounds, color });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}
