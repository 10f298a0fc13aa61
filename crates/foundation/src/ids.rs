//! Identity newtypes
//!
//! `DeviceUid` names a device in the network; `Reference` names a variable.
//! Both are opaque to the engine: equality-comparable, hashable keys and
//! nothing more.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a device
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DeviceUid(pub u64);

impl fmt::Display for DeviceUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceUid {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

/// Opaque variable name token shared between the surface layer and the core
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference(pub String);

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Reference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Reference {
    fn from(s: String) -> Self {
        Self(s)
    }
}
