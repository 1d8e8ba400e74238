//! Interaction zones and the tracker component that turns raw containment
//! tests into enter/exit events

mod tracker;
mod zone;

pub use tracker::InteractionComponent;
pub use zone::{InteractionZone, ZoneId, ZoneKind, ZoneShape};
