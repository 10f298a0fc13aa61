//! Round orchestration
//!
//! One round: fresh environment and export, empty alignment path, evaluate
//! the root, publish on success. A failed round publishes nothing; the last
//! successful export stays visible to neighbors until a later round succeeds.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use fieldcast_foundation::Value;

use crate::context::DeviceContext;
use crate::error::Result;
use crate::network::NetworkManager;
use crate::node::{EvalContext, Expression, evaluate};
use crate::stack::Environment;
use crate::state::{Export, NeighborTable};

/// What one successful round produces: the device's output value for the
/// round and the export to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub value: Value,
    pub export: Export,
}

/// Evaluate `program` once for `device`.
///
/// `last_exec` is the device's own export from its previous successful round;
/// `neighbors` is the snapshot the network manager handed over. The caller is
/// responsible for persisting the returned export as the next round's
/// `last_exec` and for publishing it — [`VirtualMachine`] does both.
pub fn run_round(
    program: &Expression,
    device: &mut DeviceContext,
    last_exec: &Export,
    neighbors: &NeighborTable,
) -> Result<RoundResult> {
    let mut env = Environment::new();
    // Device-local sensor values appear to the program as pre-bound variables
    for (var, value) in device.properties().clone() {
        env.put(var, value, true);
    }

    let mut export = Export::new();
    let value = {
        let mut ctx = EvalContext::new(device, neighbors, &mut env, last_exec, &mut export);
        evaluate(program, &mut ctx)?
    };
    trace!(entries = export.len(), "round evaluated");
    Ok(RoundResult { value, export })
}

/// Per-device driver owning the program and the last successful export.
///
/// The program tree is shared: every device in a simulation holds the same
/// `Arc` and the tree is never mutated.
pub struct VirtualMachine {
    program: Arc<Expression>,
    last_export: Export,
    rounds_completed: u64,
}

impl VirtualMachine {
    pub fn new(program: Arc<Expression>) -> Self {
        Self {
            program,
            last_export: Export::new(),
            rounds_completed: 0,
        }
    }

    /// The export retained from the last successful round; empty before the
    /// first success.
    pub fn last_export(&self) -> &Export {
        &self.last_export
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Execute one round against the network boundary.
    ///
    /// On success the retained export is replaced and published. On failure
    /// nothing is published and the retained export is untouched, so
    /// neighbors keep seeing the last successful state.
    #[instrument(
        skip(self, device, network),
        fields(device = %device.uid(), round = self.rounds_completed)
    )]
    pub fn execute_round(
        &mut self,
        device: &mut DeviceContext,
        network: &mut dyn NetworkManager,
    ) -> Result<Value> {
        let neighbors = network.neighbor_state();
        let result = run_round(&self.program, device, &self.last_export, &neighbors)?;
        self.last_export = result.export;
        self.rounds_completed += 1;
        network.share_state(&self.last_export)?;
        debug!(entries = self.last_export.len(), "round published");
        Ok(result.value)
    }
}
