//! Round state
//!
//! The per-round maps, all keyed by alignment path: the export a device
//! builds this round, the device's own export from its previous successful
//! round, and the snapshot of neighbor exports handed over by the network
//! manager.

use indexmap::IndexMap;

use fieldcast_foundation::{AlignmentPath, DeviceUid, Value};

use crate::error::{Error, Result};

/// The map a device builds during one round and publishes at its end.
///
/// Exactly one entry per live alignment path: recording the same path twice
/// in one round is an alignment collision, not a last-writer-wins update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Export {
    entries: IndexMap<AlignmentPath, Value>,
}

impl Export {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `path`.
    pub fn record(&mut self, path: AlignmentPath, value: Value) -> Result<()> {
        if self.entries.contains_key(&path) {
            return Err(Error::AlignmentCollision(path));
        }
        self.entries.insert(path, value);
        Ok(())
    }

    pub fn get(&self, path: &AlignmentPath) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &AlignmentPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AlignmentPath, &Value)> {
        self.entries.iter()
    }

    /// Paths recorded this round, in evaluation order.
    pub fn paths(&self) -> impl Iterator<Item = &AlignmentPath> {
        self.entries.keys()
    }
}

/// Snapshot of neighbor exports, as handed over by the network manager.
///
/// Read-only during evaluation. A neighbor missing an entry at some path is
/// ordinary input — it took a different branch, or its state is stale — and
/// is skipped by [`NeighborTable::aligned`], never defaulted.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    exports: IndexMap<DeviceUid, Export>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: DeviceUid, export: Export) {
        self.exports.insert(device, export);
    }

    pub fn get(&self, device: &DeviceUid) -> Option<&Export> {
        self.exports.get(device)
    }

    pub fn devices(&self) -> impl Iterator<Item = DeviceUid> + '_ {
        self.exports.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Iterate the neighbors that published a value at `path`.
    pub fn aligned<'a>(
        &'a self,
        path: &'a AlignmentPath,
    ) -> impl Iterator<Item = (DeviceUid, &'a Value)> {
        self.exports
            .iter()
            .filter_map(move |(device, export)| export.get(path).map(|value| (*device, value)))
    }
}

impl FromIterator<(DeviceUid, Export)> for NeighborTable {
    fn from_iter<I: IntoIterator<Item = (DeviceUid, Export)>>(iter: I) -> Self {
        Self {
            exports: iter.into_iter().collect(),
        }
    }
}
