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
//! Error types for setup-time operations
//!
//! Ticking and rendering never fail: a stale handle or a missing component
//! resolves to a neutral result instead. The errors here cover the handful
//! of operations a game performs while assembling a scene, such as
//! registering archetypes or restoring saved state.

use thiserror::Error;

/// Errors raised by the archetype registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An archetype with the same name is already registered
    #[error("archetype '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The archetype was built against an incompatible API version
    #[error("archetype '{name}' API version {found} is incompatible with runtime API version {expected}")]
    IncompatibleVersion {
        /// Archetype name
        name: String,
        /// API version declared by the archetype
        found: String,
        /// API version of this runtime
        expected: String,
    },

    /// No archetype is registered under this name
    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),

    /// An archetype extends a parent that is not registered
    #[error("archetype '{name}' extends '{parent}' which is not registered")]
    MissingParent {
        /// Archetype name
        name: String,
        /// Name of the missing parent
        parent: String,
    },

    /// Following `extends` links leads back to an archetype already visited
    #[error("circular inheritance detected while resolving archetype '{0}'")]
    CircularInheritance(String),

    /// The archetype rejected its property bag
    #[error("archetype '{name}' failed to build: {reason}")]
    BuildFailed {
        /// Archetype name
        name: String,
        /// Message returned by the archetype
        reason: String,
    },
}

/// Errors raised while restoring saved component or scene state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The saved value has the wrong JSON shape
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A required field is absent
    #[error("field '{0}' is missing")]
    MissingField(&'static str),

    /// The saved value could not be decoded
    #[error("malformed state: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Malformed(err.to_string())
    }
}

/// Short JSON type name used in diagnostics
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
