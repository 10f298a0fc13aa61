//! Fieldcast foundation types
//!
//! Leaf types shared by every layer of the engine: device and variable
//! identity, alignment paths, and runtime values. This crate depends on
//! nothing else in the workspace.

pub mod ids;
pub mod path;
pub mod value;

pub use ids::{DeviceUid, Reference};
pub use path::{AlignmentPath, Slot};
pub use value::{NeighborField, Value};
