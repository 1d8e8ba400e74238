//! Layered rendering
//!
//! Producers register with a [`RenderScheduler`] under a [`LayerId`] and
//! draw onto a [`Surface`] once per frame.

mod layer;
mod scheduler;
mod surface;

pub use layer::{layers, LayerId, RenderLayer};
pub use scheduler::{DrawableKey, Drawable, OverlayId, RenderScheduler, SpriteOverlay};
pub use surface::{Color, CommandBuffer, DrawCommand, SpriteId, Surface};
