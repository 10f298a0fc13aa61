//! Network boundary
//!
//! The engine never talks to other devices directly: it reads an
//! already-published snapshot of neighbor exports and hands its own completed
//! export back through this trait. Transport, topology, and delivery timing
//! belong to the implementation behind it; the engine does not interpret
//! either side beyond the map shape.

use crate::error::Result;
use crate::state::{Export, NeighborTable};

/// Boundary between one device's evaluation and the rest of the network.
pub trait NetworkManager {
    /// Snapshot of the latest known neighbor exports.
    ///
    /// The snapshot is copy-on-read: it never changes under the caller, and
    /// it never exposes another device's in-progress, not-yet-published
    /// export. Staleness is expected and tolerated.
    fn neighbor_state(&self) -> NeighborTable;

    /// Publish this device's completed export for the round.
    ///
    /// Publishing an empty export is a permitted no-op. Implementations fail
    /// fast with [`crate::Error::InvalidPublication`] when the publishing
    /// device violates their preconditions.
    fn share_state(&mut self, export: &Export) -> Result<()>;
}
