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
//! System execution framework
//!
//! Systems contain the per-frame logic of a scene: updating components,
//! resolving collisions and sweeping destroyed entities. They run with a
//! [`SystemContext`] that lends them the world, the render scheduler and
//! the event bus for the duration of the call.

use crate::ecs::SystemContext;

/// Trait for systems that operate on a scene
pub trait System {
    /// Execute the system for one frame
    fn run(&mut self, ctx: &mut SystemContext<'_>);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closures run as systems
impl<F> System for F
where
    F: FnMut(&mut SystemContext<'_>),
{
    fn run(&mut self, ctx: &mut SystemContext<'_>) {
        self(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::ecs::World;
    use crate::events::EventBus;
    use crate::properties::Properties;
    use crate::render::RenderScheduler;

    struct TestSystem {
        run_count: usize,
    }

    impl System for TestSystem {
        fn run(&mut self, _ctx: &mut SystemContext<'_>) {
            self.run_count += 1;
        }

        fn name(&self) -> &str {
            "TestSystem"
        }
    }

    #[test]
    fn test_system_runs_with_context() {
        let mut world = World::new();
        let mut renderer = RenderScheduler::new();
        let events = EventBus::new();
        let config = RuntimeConfig::default();
        let mut ctx = SystemContext::new(&mut world, &mut renderer, &events, &config);

        let mut system = TestSystem { run_count: 0 };
        system.run(&mut ctx);
        system.run(&mut ctx);
        assert_eq!(system.run_count, 2);
        assert_eq!(system.name(), "TestSystem");
    }

    #[test]
    fn test_closure_system() {
        let mut world = World::new();
        let mut renderer = RenderScheduler::new();
        let events = EventBus::new();
        let config = RuntimeConfig::default();
        let mut ctx = SystemContext::new(&mut world, &mut renderer, &events, &config);

        let mut spawner = |ctx: &mut SystemContext<'_>| {
            ctx.spawn(&Properties::new().with("name", "spark"));
        };
        spawner.run(&mut ctx);
        spawner.run(&mut ctx);
        assert_eq!(world.find_all_by_name("spark").len(), 2);
    }
}
