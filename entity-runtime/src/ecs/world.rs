//! World management
//!
//! The World owns every entity record in an arena indexed by generational
//! handles, and remembers the order entities were spawned in. That order
//! drives the update pass, the collision pass and name lookups, so it is
//! the one iteration order the rest of the runtime relies on.
//!
//! Destroying an entity only flags it. The record stays reachable until
//! [`World::cleanup`] removes it, which is when its slot is retired and
//! every handle to it starts resolving to `None`.

use crate::collision;
use crate::ecs::{Component, Entity, EntityRecord};
use crate::geometry::Vec2;

struct Slot {
    generation: u32,
    record: Option<EntityRecord>,
}

/// Arena of entity records
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<Entity>,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        World {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Add a record and return its handle
    pub fn spawn(&mut self, record: EntityRecord) -> Entity {
        let entity = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                Entity::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                Entity::new(index, 0)
            }
        };
        self.order.push(entity);
        log::trace!("spawned {}", entity);
        entity
    }

    /// Record behind a handle, destroyed or not
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        let slot = self.slots.get(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.record.as_ref()
    }

    /// Mutable record behind a handle, destroyed or not
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        if slot.generation != entity.generation() {
            return None;
        }
        slot.record.as_mut()
    }

    /// Check whether the handle still resolves to a record
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Check whether the handle resolves to a record that is not destroyed
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).map_or(false, |r| !r.is_destroyed())
    }

    /// Number of records, including destroyed ones awaiting cleanup
    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// Number of records that are not destroyed
    pub fn alive_count(&self) -> usize {
        self.order.iter().filter(|e| self.is_alive(**e)).count()
    }

    /// Handle at a position in spawn order
    pub fn entity_at(&self, index: usize) -> Option<Entity> {
        self.order.get(index).copied()
    }

    /// All handles in spawn order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// All records in spawn order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityRecord)> + '_ {
        self.order
            .iter()
            .filter_map(move |e| self.get(*e).map(|r| (*e, r)))
    }

    /// Flag an entity as destroyed
    ///
    /// Returns `true` only when the flag changed. The record is kept until
    /// the next [`World::cleanup`].
    pub fn destroy(&mut self, entity: Entity) -> bool {
        match self.get_mut(entity) {
            Some(record) => record.mark_destroyed(),
            None => false,
        }
    }

    /// Remove destroyed records that are not protected
    ///
    /// Removal detaches the record from its parent and orphans its
    /// children. Returns the removed handles in spawn order.
    pub fn cleanup(&mut self) -> Vec<Entity> {
        let removed: Vec<Entity> = self
            .order
            .iter()
            .copied()
            .filter(|e| {
                self.get(*e)
                    .map_or(false, |r| r.is_destroyed() && !r.is_protected())
            })
            .collect();
        if removed.is_empty() {
            return removed;
        }

        for entity in &removed {
            let (parent, children) = match self.get_mut(*entity) {
                Some(record) => (record.parent.take(), std::mem::take(&mut record.children)),
                None => continue,
            };
            if let Some(parent) = parent {
                if let Some(parent_record) = self.get_mut(parent) {
                    parent_record.children.retain(|c| c != entity);
                }
            }
            for child in children {
                if let Some(child_record) = self.get_mut(child) {
                    child_record.parent = None;
                    child_record.local_offset = Vec2::ZERO;
                }
            }
        }

        for entity in &removed {
            let index = entity.index();
            let slot = &mut self.slots[index as usize];
            slot.record = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
        }
        self.order.retain(|e| !removed.contains(e));
        log::debug!("cleaned up {} destroyed entities", removed.len());
        removed
    }

    /// Remove every record
    ///
    /// Slots are retired rather than dropped, so handles issued before the
    /// clear keep resolving to `None`.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.record.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.order.clear();
    }

    /// First live entity with the given name, in spawn order
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.iter()
            .find(|(_, r)| !r.is_destroyed() && r.name() == name)
            .map(|(e, _)| e)
    }

    /// Every live entity with the given name, in spawn order
    pub fn find_all_by_name(&self, name: &str) -> Vec<Entity> {
        self.iter()
            .filter(|(_, r)| !r.is_destroyed() && r.name() == name)
            .map(|(e, _)| e)
            .collect()
    }

    /// Typed component access
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get(entity)?.component::<T>()
    }

    /// Typed mutable component access
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_mut(entity)?.component_mut::<T>()
    }

    /// Check whether an entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get(entity).map_or(false, |r| r.has_component::<T>())
    }

    /// Move an entity and everything attached below it
    ///
    /// Moving an attached child rewrites its local offset so that it stays
    /// exactly where it was put.
    pub fn set_position(&mut self, entity: Entity, x: f64, y: f64) -> bool {
        let parent_position = self
            .get(entity)
            .and_then(|r| r.parent)
            .and_then(|p| self.get(p))
            .map(|p| p.position);

        let Some(record) = self.get_mut(entity) else {
            return false;
        };
        record.position = Vec2::new(x, y);
        if let Some(parent_position) = parent_position {
            record.local_offset = record.position - parent_position;
        }
        self.sync_children(entity);
        true
    }

    /// Move an entity by a displacement
    pub fn translate(&mut self, entity: Entity, dx: f64, dy: f64) -> bool {
        match self.get(entity).map(|r| r.position) {
            Some(p) => self.set_position(entity, p.x + dx, p.y + dy),
            None => false,
        }
    }

    /// Attach `child` to `parent` at a local offset
    ///
    /// The child leaves any previous parent and is moved to its new place
    /// immediately. Attaching an entity below itself is refused.
    pub fn attach(&mut self, parent: Entity, child: Entity, offset_x: f64, offset_y: f64) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        let cyclic = parent == child || self.is_ancestor(child, parent);
        debug_assert!(!cyclic, "cyclic attachment of {} below {}", child, parent);
        if cyclic {
            log::warn!("refusing cyclic attachment of {} below {}", child, parent);
            return false;
        }

        self.detach(child);
        if let Some(child_record) = self.get_mut(child) {
            child_record.parent = Some(parent);
            child_record.local_offset = Vec2::new(offset_x, offset_y);
        }
        if let Some(parent_record) = self.get_mut(parent) {
            parent_record.children.push(child);
        }
        self.sync_children(parent);
        true
    }

    /// Detach an entity from its parent, keeping its world position
    pub fn detach(&mut self, child: Entity) -> bool {
        let Some(parent) = self.get(child).and_then(|r| r.parent) else {
            return false;
        };
        if let Some(parent_record) = self.get_mut(parent) {
            parent_record.children.retain(|c| *c != child);
        }
        if let Some(child_record) = self.get_mut(child) {
            child_record.parent = None;
            child_record.local_offset = Vec2::ZERO;
        }
        true
    }

    /// Change an attached child's offset and move it there immediately
    pub fn set_local_offset(&mut self, child: Entity, offset_x: f64, offset_y: f64) -> bool {
        let Some(parent) = self.get(child).and_then(|r| r.parent) else {
            return false;
        };
        if let Some(child_record) = self.get_mut(child) {
            child_record.local_offset = Vec2::new(offset_x, offset_y);
        }
        self.sync_children(parent);
        true
    }

    /// First direct child with the given name
    pub fn child_by_name(&self, parent: Entity, name: &str) -> Option<Entity> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.get(*c).map_or(false, |r| r.name() == name))
    }

    /// Check whether `ancestor` is above `entity` in the attachment tree
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.get(entity).and_then(|r| r.parent);
        let mut steps = 0;
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.order.len() {
                return false;
            }
            current = self.get(e).and_then(|r| r.parent);
        }
        false
    }

    /// Recompute the world position of everything attached below `entity`
    pub fn sync_children(&mut self, entity: Entity) {
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let (origin, children) = match self.get(current) {
                Some(record) if !record.children.is_empty() => {
                    (record.position, record.children.clone())
                }
                _ => continue,
            };
            for child in children {
                if let Some(child_record) = self.get_mut(child) {
                    child_record.position = origin + child_record.local_offset;
                    stack.push(child);
                }
            }
        }
    }

    /// Collision predicate over handles; absent entities never collide
    pub fn is_colliding(&self, a: Entity, b: Entity) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(ra), Some(rb)) => collision::is_colliding(ra, rb),
            _ => false,
        }
    }

    /// Live entities whose hit masks overlap `entity`'s, in spawn order
    pub fn overlapping(&self, entity: Entity) -> Vec<Entity> {
        let Some(record) = self.get(entity) else {
            return Vec::new();
        };
        self.iter()
            .filter(|(other, other_record)| {
                *other != entity && collision::is_colliding(record, other_record)
            })
            .map(|(other, _)| other)
            .collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionType;

    fn spawn(world: &mut World, name: &str, x: f64, y: f64) -> Entity {
        world.spawn(EntityRecord::new(name, x, y, 16, 16))
    }

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::new();

        let e1 = spawn(&mut world, "a", 0.0, 0.0);
        let e2 = spawn(&mut world, "b", 0.0, 0.0);

        assert_eq!(world.entity_count(), 2);
        assert!(world.is_alive(e1));
        assert!(world.is_alive(e2));

        assert!(world.destroy(e1));
        assert!(!world.destroy(e1));
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.alive_count(), 1);
        assert!(world.contains(e1));
        assert!(!world.is_alive(e1));

        assert_eq!(world.cleanup(), vec![e1]);
        assert_eq!(world.entity_count(), 1);
        assert!(!world.contains(e1));
    }

    #[test]
    fn test_entity_generation() {
        let mut world = World::new();

        let e1 = spawn(&mut world, "a", 0.0, 0.0);
        world.destroy(e1);
        world.cleanup();
        let e2 = spawn(&mut world, "b", 0.0, 0.0);

        assert_eq!(e2.index(), e1.index());
        assert_ne!(e2.generation(), e1.generation());
        assert!(world.get(e1).is_none());
        assert_eq!(world.get(e2).map(|r| r.name()), Some("b"));
    }

    #[test]
    fn test_protected_entities_survive_cleanup() {
        let mut world = World::new();
        let keep = world.spawn(EntityRecord::new("", 0.0, 0.0, 16, 16).with_protection(true));
        world.destroy(keep);
        assert!(world.cleanup().is_empty());
        assert!(world.contains(keep));
        assert!(!world.is_alive(keep));
    }

    #[test]
    fn test_spawn_order_is_kept() {
        let mut world = World::new();
        let a = spawn(&mut world, "a", 0.0, 0.0);
        let b = spawn(&mut world, "b", 0.0, 0.0);
        let c = spawn(&mut world, "c", 0.0, 0.0);
        world.destroy(b);
        world.cleanup();
        let d = spawn(&mut world, "d", 0.0, 0.0);

        let order: Vec<Entity> = world.entities().collect();
        assert_eq!(order, vec![a, c, d]);
        assert_eq!(world.entity_at(1), Some(c));
    }

    #[test]
    fn test_find_by_name_skips_destroyed() {
        let mut world = World::new();
        let first = spawn(&mut world, "guard", 0.0, 0.0);
        let second = spawn(&mut world, "guard", 0.0, 0.0);
        assert_eq!(world.find_by_name("guard"), Some(first));
        assert_eq!(world.find_all_by_name("guard"), vec![first, second]);

        world.destroy(first);
        assert_eq!(world.find_by_name("guard"), Some(second));
        assert_eq!(world.find_by_name("nobody"), None);
    }

    #[test]
    fn test_child_follows_parent() {
        let mut world = World::new();
        let parent = spawn(&mut world, "npc", 100.0, 100.0);
        let child = spawn(&mut world, "marker", 0.0, 0.0);

        assert!(world.attach(parent, child, 4.0, -12.0));
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(104.0, 88.0));

        world.translate(parent, 10.0, 5.0);
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(114.0, 93.0));
        assert_eq!(world.child_by_name(parent, "marker"), Some(child));
    }

    #[test]
    fn test_grandchildren_follow() {
        let mut world = World::new();
        let root = spawn(&mut world, "root", 0.0, 0.0);
        let mid = spawn(&mut world, "mid", 0.0, 0.0);
        let leaf = spawn(&mut world, "leaf", 0.0, 0.0);
        world.attach(root, mid, 10.0, 0.0);
        world.attach(mid, leaf, 0.0, 10.0);

        world.set_position(root, 50.0, 50.0);
        assert_eq!(world.get(leaf).unwrap().position(), Vec2::new(60.0, 60.0));
    }

    #[test]
    fn test_moving_child_updates_offset() {
        let mut world = World::new();
        let parent = spawn(&mut world, "p", 10.0, 10.0);
        let child = spawn(&mut world, "c", 0.0, 0.0);
        world.attach(parent, child, 1.0, 1.0);

        world.set_position(child, 30.0, 40.0);
        assert_eq!(world.get(child).unwrap().local_offset(), Vec2::new(20.0, 30.0));

        world.translate(parent, 1.0, 1.0);
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(31.0, 41.0));

        world.set_local_offset(child, 0.0, 0.0);
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(11.0, 11.0));
    }

    #[test]
    fn test_detach_keeps_world_position() {
        let mut world = World::new();
        let parent = spawn(&mut world, "p", 10.0, 10.0);
        let child = spawn(&mut world, "c", 0.0, 0.0);
        world.attach(parent, child, 5.0, 5.0);

        assert!(world.detach(child));
        assert!(!world.detach(child));
        world.translate(parent, 100.0, 0.0);
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(15.0, 15.0));
        assert!(world.get(parent).unwrap().children().is_empty());
    }

    #[test]
    fn test_reattach_moves_between_parents() {
        let mut world = World::new();
        let a = spawn(&mut world, "a", 0.0, 0.0);
        let b = spawn(&mut world, "b", 100.0, 0.0);
        let child = spawn(&mut world, "c", 0.0, 0.0);
        world.attach(a, child, 1.0, 0.0);
        world.attach(b, child, 1.0, 0.0);

        assert!(world.get(a).unwrap().children().is_empty());
        assert_eq!(world.get(b).unwrap().children(), &[child]);
        assert_eq!(world.get(child).unwrap().position(), Vec2::new(101.0, 0.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cyclic attachment")]
    fn test_cyclic_attachment_asserts() {
        let mut world = World::new();
        let a = spawn(&mut world, "a", 0.0, 0.0);
        let b = spawn(&mut world, "b", 0.0, 0.0);
        world.attach(a, b, 0.0, 0.0);
        world.attach(b, a, 0.0, 0.0);
    }

    #[test]
    fn test_cleanup_breaks_links() {
        let mut world = World::new();
        let parent = spawn(&mut world, "p", 0.0, 0.0);
        let child = spawn(&mut world, "c", 0.0, 0.0);
        let grandchild = spawn(&mut world, "g", 0.0, 0.0);
        world.attach(parent, child, 0.0, 0.0);
        world.attach(child, grandchild, 0.0, 0.0);

        world.destroy(child);
        world.cleanup();
        assert!(world.get(parent).unwrap().children().is_empty());
        assert_eq!(world.get(grandchild).unwrap().parent(), None);
    }

    #[test]
    fn test_overlapping() {
        let mut world = World::new();
        let a = spawn(&mut world, "a", 0.0, 0.0);
        let b = spawn(&mut world, "b", 8.0, 8.0);
        let c = spawn(&mut world, "c", 100.0, 0.0);
        let ghost = world.spawn(
            EntityRecord::new("ghost", 4.0, 4.0, 16, 16).with_collision(CollisionType::NoCollision),
        );

        assert_eq!(world.overlapping(a), vec![b]);
        assert!(world.overlapping(c).is_empty());
        assert!(!world.is_colliding(a, ghost));

        world.destroy(b);
        assert!(world.overlapping(a).is_empty());
    }

    #[test]
    fn test_stale_handles_are_neutral() {
        let mut world = World::new();
        let stale = Entity::new(9, 9);
        assert!(!world.destroy(stale));
        assert!(!world.set_position(stale, 1.0, 1.0));
        assert!(!world.attach(stale, stale, 0.0, 0.0));
        assert!(world.component::<crate::ecs::components::HealthComponent>(stale).is_none());
    }

    #[test]
    fn test_world_clear() {
        let mut world = World::new();
        spawn(&mut world, "a", 0.0, 0.0);
        spawn(&mut world, "b", 0.0, 0.0);

        assert_eq!(world.entity_count(), 2);
        world.clear();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_clear_invalidates_old_handles() {
        let mut world = World::new();
        let old = spawn(&mut world, "a", 0.0, 0.0);
        world.clear();
        let new = spawn(&mut world, "b", 0.0, 0.0);

        assert_ne!(old, new);
        assert_eq!(new.index(), old.index());
        assert!(world.get(old).is_none());
        assert!(!world.is_alive(old));
        assert_eq!(world.get(new).map(|r| r.name()), Some("b"));
    }
}
