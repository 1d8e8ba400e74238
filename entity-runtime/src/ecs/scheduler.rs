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
//! Staged system scheduler
//!
//! Systems are organized into stages that execute in order every frame.
//! Systems sharing a stage run in the order they were added, which keeps
//! a frame fully deterministic.

use crate::ecs::{System, SystemContext};

/// Stage identifier for grouping systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageId(pub usize);

impl StageId {
    /// Create a new stage ID
    pub fn new(id: usize) -> Self {
        StageId(id)
    }
}

/// Pre-defined stages of a frame
pub mod stages {
    use super::StageId;

    /// Input handling and anything that must see the previous frame
    pub const PRE_UPDATE: StageId = StageId(0);

    /// Component `update` hooks
    pub const ENTITY_UPDATE: StageId = StageId(1);

    /// Scripted movement that should observe updated components
    pub const MOVEMENT: StageId = StageId(2);

    /// Pairwise collision notification
    pub const COLLISION: StageId = StageId(3);

    /// Reactions to collisions
    pub const POST_UPDATE: StageId = StageId(4);

    /// Removal of destroyed entities
    pub const CLEANUP: StageId = StageId(5);
}

/// A system with metadata for scheduling
struct ScheduledSystem {
    system: Box<dyn System>,
    stage: StageId,
}

/// System scheduler with staged execution
///
/// # Examples
///
/// ```
/// use entity_runtime::ecs::scheduler::{Scheduler, stages};
/// use entity_runtime::ecs::{System, SystemContext};
///
/// struct MySystem;
/// impl System for MySystem {
///     fn run(&mut self, _ctx: &mut SystemContext<'_>) {}
/// }
///
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MySystem, stages::MOVEMENT);
/// assert_eq!(scheduler.system_count(), 1);
/// ```
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    sorted: bool,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Scheduler {
            systems: Vec::new(),
            sorted: true,
        }
    }

    /// Add a system to a specific stage
    pub fn add_system<S: System + 'static>(&mut self, system: S, stage: StageId) {
        log::debug!("scheduling {} in stage {}", system.name(), stage.0);
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            stage,
        });
        self.sorted = false;
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Get the number of stages in use
    pub fn stage_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| s.stage.0)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Names of the scheduled systems in execution order
    pub fn system_names(&mut self) -> Vec<String> {
        self.sort();
        self.systems
            .iter()
            .map(|s| s.system.name().to_string())
            .collect()
    }

    /// Execute all systems in stage order
    pub fn run(&mut self, ctx: &mut SystemContext<'_>) {
        self.sort();
        for scheduled in &mut self.systems {
            log::trace!("running {}", scheduled.system.name());
            scheduled.system.run(ctx);
        }
    }

    /// Clear all systems from the scheduler
    pub fn clear(&mut self) {
        self.systems.clear();
        self.sorted = true;
    }

    fn sort(&mut self) {
        if !self.sorted {
            // Stable, so systems within a stage keep insertion order
            self.systems.sort_by_key(|s| s.stage);
            self.sorted = true;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::ecs::World;
    use crate::events::EventBus;
    use crate::render::RenderScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TestSystem {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl TestSystem {
        fn new(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            TestSystem {
                name: name.to_string(),
                log: Rc::clone(log),
            }
        }
    }

    impl System for TestSystem {
        fn run(&mut self, _ctx: &mut SystemContext<'_>) {
            self.log.borrow_mut().push(self.name.clone());
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn run_once(scheduler: &mut Scheduler) {
        let mut world = World::new();
        let mut renderer = RenderScheduler::new();
        let events = EventBus::new();
        let config = RuntimeConfig::default();
        let mut ctx = SystemContext::new(&mut world, &mut renderer, &events, &config);
        scheduler.run(&mut ctx);
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.system_count(), 0);
        assert_eq!(scheduler.stage_count(), 0);
    }

    #[test]
    fn test_stage_ordering() {
        let log = Rc::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("cleanup", &log), stages::CLEANUP);
        scheduler.add_system(TestSystem::new("update", &log), stages::ENTITY_UPDATE);
        scheduler.add_system(TestSystem::new("collide", &log), stages::COLLISION);

        run_once(&mut scheduler);
        assert_eq!(*log.borrow(), vec!["update", "collide", "cleanup"]);
    }

    #[test]
    fn test_insertion_order_within_stage() {
        let log = Rc::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("b", &log), stages::POST_UPDATE);
        scheduler.add_system(TestSystem::new("a", &log), stages::PRE_UPDATE);
        scheduler.add_system(TestSystem::new("c", &log), stages::POST_UPDATE);

        assert_eq!(scheduler.system_names(), vec!["a", "b", "c"]);
        run_once(&mut scheduler);
        run_once(&mut scheduler);
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_empty_scheduler() {
        let mut scheduler = Scheduler::new();
        run_once(&mut scheduler);
    }

    #[test]
    fn test_clear_scheduler() {
        let log = Rc::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("test", &log), stages::MOVEMENT);
        assert_eq!(scheduler.system_count(), 1);

        scheduler.clear();
        assert_eq!(scheduler.system_count(), 0);
        run_once(&mut scheduler);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_stage_count() {
        let log = Rc::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(TestSystem::new("s1", &log), StageId::new(0));
        assert_eq!(scheduler.stage_count(), 1);

        scheduler.add_system(TestSystem::new("s2", &log), StageId::new(5));
        assert_eq!(scheduler.stage_count(), 6);

        scheduler.add_system(TestSystem::new("s3", &log), StageId::new(2));
        assert_eq!(scheduler.stage_count(), 6);
    }
}
