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
//! Zone tracker component
//!
//! [`InteractionComponent`] owns a set of zones and remembers, for every
//! target it has observed, which of those zones the target is inside. Each
//! tick it re-tests its targets and publishes an event only when a
//! target's membership in a zone changes:
//!
//! | was inside | is inside | published |
//! |---|---|---|
//! | no | yes | `TargetEnteredZone` |
//! | yes | no | `TargetExitedZone` |
//! | no | no | nothing |
//! | yes | yes | nothing |
//!
//! A target seen for the first time counts as outside every zone, so a
//! target that spawns inside a zone gets its enter event from the first
//! tick that evaluates it, never earlier. Memberships of targets that are
//! destroyed or removed are dropped silently on the next check.

use crate::ecs::{Component, ComponentContext, Entity, World};
use crate::events::{EngineEvent, EventBus, ZoneEvent};
use crate::interaction::{InteractionZone, ZoneId, ZoneKind, ZoneShape};
use std::any::Any;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum TrackedTarget {
    Entity(Entity),
    /// Resolved lazily, since the named entity may not exist yet
    Named {
        name: String,
        resolved: Option<Entity>,
    },
}

/// Proximity tracker publishing zone enter/exit events
#[derive(Debug, Clone, Default)]
pub struct InteractionComponent {
    zones: Vec<InteractionZone>,
    targets: Vec<TrackedTarget>,
    membership: HashMap<Entity, Vec<ZoneId>>,
}

impl InteractionComponent {
    /// Create a tracker with no zones and no targets
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`InteractionComponent::add_zone`]
    pub fn with_zone(mut self, kind: ZoneKind, shape: ZoneShape) -> Self {
        self.add_zone(kind, shape);
        self
    }

    /// Builder-style [`InteractionComponent::track`]
    pub fn tracking(mut self, target: Entity) -> Self {
        self.track(target);
        self
    }

    /// Builder-style [`InteractionComponent::track_named`]
    pub fn tracking_named(mut self, name: impl Into<String>) -> Self {
        self.track_named(name);
        self
    }

    /// Add a zone
    pub fn add_zone(&mut self, kind: ZoneKind, shape: ZoneShape) -> ZoneId {
        let id = ZoneId(self.zones.len() as u32);
        self.zones.push(InteractionZone::new(id, kind, shape));
        id
    }

    /// Test a specific entity every tick
    pub fn track(&mut self, target: Entity) {
        let tracked = TrackedTarget::Entity(target);
        if !self.targets.contains(&tracked) {
            self.targets.push(tracked);
        }
    }

    /// Test the first live entity with this name every tick
    ///
    /// Until such an entity exists the target is skipped.
    pub fn track_named(&mut self, name: impl Into<String>) {
        let name = name.into();
        let already = self
            .targets
            .iter()
            .any(|t| matches!(t, TrackedTarget::Named { name: n, .. } if *n == name));
        if !already {
            self.targets.push(TrackedTarget::Named {
                name,
                resolved: None,
            });
        }
    }

    /// Stop testing an entity and forget its memberships, without events
    pub fn untrack(&mut self, target: Entity) {
        self.targets.retain(|t| match t {
            TrackedTarget::Entity(e) => *e != target,
            TrackedTarget::Named { resolved, .. } => *resolved != Some(target),
        });
        self.membership.remove(&target);
    }

    /// Zones in creation order
    pub fn zones(&self) -> &[InteractionZone] {
        &self.zones
    }

    /// Zone by handle
    pub fn zone(&self, id: ZoneId) -> Option<&InteractionZone> {
        self.zones.get(id.index())
    }

    /// First zone with the given tag
    pub fn zone_of_kind(&self, kind: &ZoneKind) -> Option<ZoneId> {
        self.zones.iter().find(|z| z.kind() == kind).map(|z| z.id())
    }

    /// Whether the target was inside the zone at the last check
    pub fn is_inside(&self, target: Entity, zone: ZoneId) -> bool {
        self.membership
            .get(&target)
            .map_or(false, |zones| zones.contains(&zone))
    }

    /// Zones the target was inside at the last check
    pub fn zones_containing(&self, target: Entity) -> &[ZoneId] {
        self.membership
            .get(&target)
            .map(|z| z.as_slice())
            .unwrap_or(&[])
    }

    /// Targets inside the zone at the last check, ordered by handle
    pub fn occupants(&self, zone: ZoneId) -> Vec<Entity> {
        let mut inside: Vec<Entity> = self
            .membership
            .iter()
            .filter(|(_, zones)| zones.contains(&zone))
            .map(|(e, _)| *e)
            .collect();
        inside.sort();
        inside
    }

    /// Whether any target is inside any zone with the given tag
    pub fn has_occupant_in(&self, kind: &ZoneKind) -> bool {
        self.zones
            .iter()
            .filter(|z| z.kind() == kind)
            .any(|z| self.membership.values().any(|zones| zones.contains(&z.id())))
    }

    /// Number of targets with a membership entry
    pub fn observed_count(&self) -> usize {
        self.membership.len()
    }

    /// Re-test candidates against every zone and publish transitions
    ///
    /// Zones are first moved to follow `owner`. The owner itself and
    /// candidates that are destroyed or absent are skipped. Each candidate
    /// is tested at the center of its visual bounds. Returns the number of
    /// events published.
    pub fn check_interactions(
        &mut self,
        owner: Entity,
        world: &World,
        candidates: &[Entity],
        events: &EventBus,
    ) -> usize {
        let Some(owner_record) = world.get(owner) else {
            return 0;
        };
        if owner_record.is_destroyed() {
            return 0;
        }

        self.membership.retain(|target, _| world.is_alive(*target));
        for zone in &mut self.zones {
            zone.reposition(owner_record);
        }

        let mut published = 0;
        for &target in candidates {
            if target == owner {
                continue;
            }
            let Some(record) = world.get(target) else {
                continue;
            };
            if record.is_destroyed() {
                continue;
            }

            let point = record.center();
            let inside = self.membership.entry(target).or_default();
            for zone in &self.zones {
                let was_inside = inside.contains(&zone.id());
                let is_inside = zone.contains(point);
                if was_inside == is_inside {
                    continue;
                }

                let payload = ZoneEvent {
                    owner,
                    target,
                    zone: zone.id(),
                    kind: zone.kind().clone(),
                };
                if is_inside {
                    inside.push(zone.id());
                    log::debug!("{} entered {} zone of {}", target, zone.kind(), owner);
                    events.publish(EngineEvent::TargetEnteredZone(payload));
                } else {
                    inside.retain(|z| *z != zone.id());
                    log::debug!("{} left {} zone of {}", target, zone.kind(), owner);
                    events.publish(EngineEvent::TargetExitedZone(payload));
                }
                published += 1;
            }
        }
        published
    }

    /// Resolve tracked targets to live handles
    fn resolve_targets(&mut self, world: &World) -> Vec<Entity> {
        let mut resolved_targets = Vec::with_capacity(self.targets.len());
        for target in &mut self.targets {
            match target {
                TrackedTarget::Entity(e) => resolved_targets.push(*e),
                TrackedTarget::Named { name, resolved } => {
                    let current = match *resolved {
                        Some(e) if world.is_alive(e) => Some(e),
                        _ => world.find_by_name(name),
                    };
                    *resolved = current;
                    match current {
                        Some(e) => resolved_targets.push(e),
                        None => log::trace!("tracked target '{}' does not exist yet", name),
                    }
                }
            }
        }
        resolved_targets
    }
}

impl Component for InteractionComponent {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        let candidates = self.resolve_targets(ctx.world());
        let owner = ctx.owner();
        self.check_interactions(owner, ctx.world(), &candidates, ctx.events());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
