//! Device context
//!
//! Everything one round of evaluation needs to know about the device it runs
//! on: its identity, its locally sensed properties, and its nondeterminism
//! source. The surrounding runtime constructs one context per device and
//! passes it into every round; the engine holds no globals.

use std::fmt;

use indexmap::IndexMap;

use fieldcast_foundation::{DeviceUid, Reference, Value};

use crate::entropy::NondeterminismSource;
use crate::error::Result;

/// Per-device evaluation identity.
pub struct DeviceContext {
    uid: DeviceUid,
    /// Device-local sensor values, pre-bound into the base scope each round.
    properties: IndexMap<Reference, Value>,
    entropy: Box<dyn NondeterminismSource>,
}

impl DeviceContext {
    pub fn new(uid: DeviceUid, entropy: Box<dyn NondeterminismSource>) -> Self {
        Self {
            uid,
            properties: IndexMap::new(),
            entropy,
        }
    }

    /// Attach a device-local property, visible to programs as a variable.
    pub fn with_property(mut self, name: impl Into<Reference>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Update a device-local property between rounds.
    pub fn set_property(&mut self, name: impl Into<Reference>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    pub fn uid(&self) -> DeviceUid {
        self.uid
    }

    pub fn properties(&self) -> &IndexMap<Reference, Value> {
        &self.properties
    }

    /// One draw from the injected nondeterminism source.
    pub fn next_random(&mut self) -> Result<f64> {
        self.entropy.next_f64()
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("uid", &self.uid)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
